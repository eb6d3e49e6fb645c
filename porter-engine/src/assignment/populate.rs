//! Potential-match population
//!
//! Periodically scores recently touched service requests against recently
//! touched service offers and records the viable pairings on the offering
//! runner's profile. The assigner consumes those entries two minutes later.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, info};

use crate::config::{EngineConfig, RECENCY_WINDOW_MINUTES};
use crate::error::EngineResult;
use crate::model::{ObjectId, PotentialErrand};
use crate::scoring::errand_score;
use crate::store::Store;

/// What one populate pass did.
#[derive(Debug, Clone, Copy, Default)]
pub struct PopulateSummary {
    pub requests: usize,
    pub offers: usize,
    pub entries_upserted: usize,
}

/// Scores (request, offer) pairs into runner profiles.
pub struct PotentialMatchPopulator {
    store: Arc<Store>,
    batch_size: usize,
    min_score: i64,
}

impl PotentialMatchPopulator {
    pub fn new(store: Arc<Store>, config: &EngineConfig) -> Self {
        Self {
            store,
            batch_size: config.match_batch_size,
            min_score: config.min_match_score,
        }
    }

    pub fn run(&self) -> EngineResult<PopulateSummary> {
        let window_start = Utc::now() - Duration::minutes(RECENCY_WINDOW_MINUTES);

        let requests = self
            .store
            .recent_service_requests(window_start, self.batch_size)?;
        let offers = self
            .store
            .recent_service_offers(window_start, self.batch_size)?;
        info!(
            requests = requests.len(),
            offers = offers.len(),
            "evaluating potential errand matches"
        );

        let offer_owners: HashSet<ObjectId> = offers.iter().map(|o| o.user_id).collect();
        let profiles = self.store.profiles_by_users(&offer_owners)?;
        debug!(profiles = profiles.len(), "fetched runner profiles for active offers");

        let mut entries_upserted = 0;
        for request in &requests {
            for offer in &offers {
                let Some(profile) = profiles.get(&offer.user_id) else {
                    continue;
                };
                let score = errand_score(request, offer, profile);
                if score < self.min_score {
                    continue;
                }
                self.store.upsert_potential_match(
                    profile.id,
                    PotentialErrand {
                        request_id: request.id,
                        offer_id: offer.id,
                        score,
                        matched_at: Utc::now(),
                    },
                )?;
                entries_upserted += 1;
                debug!(
                    score,
                    request = %request.id,
                    offer = %offer.id,
                    "recorded potential errand match"
                );
            }
        }

        info!(entries_upserted, "populate pass finished");
        Ok(PopulateSummary {
            requests: requests.len(),
            offers: offers.len(),
            entries_upserted,
        })
    }
}
