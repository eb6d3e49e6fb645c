//! Best-runner assignment
//!
//! Walks unassigned service requests oldest-first, picks the best eligible
//! runner from the populated profile entries, and promotes the request into
//! an errand inside one store transaction. The runner is notified after the
//! commit; a notification failure never rolls anything back.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::model::{Errand, ObjectId, Resource, RunnerProfile};
use crate::notify::{Notification, Notifier};
use crate::store::Store;

/// What one assignment pass did.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssignSummary {
    pub requests_seen: usize,
    pub errands_created: usize,
}

struct RankedRunner {
    profile: RunnerProfile,
    score: i64,
    matched_at: DateTime<Utc>,
}

/// Assigns runners to pending service requests.
pub struct ErrandAssigner {
    store: Arc<Store>,
    notifier: Arc<dyn Notifier>,
    batch_size: usize,
    min_score: i64,
}

impl ErrandAssigner {
    pub fn new(store: Arc<Store>, notifier: Arc<dyn Notifier>, config: &EngineConfig) -> Self {
        Self {
            store,
            notifier,
            batch_size: config.match_batch_size,
            min_score: config.min_match_score,
        }
    }

    pub async fn run(&self) -> EngineResult<AssignSummary> {
        let pending = self.store.pending_service_requests(self.batch_size)?;
        if pending.is_empty() {
            debug!("no pending service requests to assign");
            return Ok(AssignSummary::default());
        }
        info!(requests = pending.len(), "assigning runners to service requests");

        let mut errands_created = 0;
        for request in &pending {
            match self.assign_one(request).await {
                Ok(Some(errand_id)) => {
                    info!(request = %request.id, errand = %errand_id, "errand assigned");
                    errands_created += 1;
                }
                Ok(None) => {}
                Err(err) => {
                    // One failed request must not starve the rest of the
                    // batch; it stays eligible for the next pass.
                    warn!(request = %request.id, %err, "assignment failed");
                    if let Err(inc_err) = self.store.increment_match_attempts(request.id) {
                        warn!(request = %request.id, %inc_err, "failed to bump matchAttempts");
                    }
                }
            }
        }

        Ok(AssignSummary {
            requests_seen: pending.len(),
            errands_created,
        })
    }

    async fn assign_one(&self, request: &Resource) -> EngineResult<Option<ObjectId>> {
        let candidates = self.store.assignable_profiles_for_request(request.id)?;
        if candidates.is_empty() {
            debug!(request = %request.id, "no potential runners");
            self.store.increment_match_attempts(request.id)?;
            return Ok(None);
        }

        let mut ranked: Vec<RankedRunner> = candidates
            .into_iter()
            .filter_map(|profile| {
                let (score, matched_at) = {
                    let entry = profile.potential_for(request.id)?;
                    (entry.score, entry.matched_at)
                };
                Some(RankedRunner {
                    profile,
                    score,
                    matched_at,
                })
            })
            .filter(|runner| runner.score >= self.min_score)
            .collect();

        if ranked.is_empty() {
            debug!(request = %request.id, "no eligible runners above threshold");
            self.store.increment_match_attempts(request.id)?;
            return Ok(None);
        }

        // Highest score first, freshest entry next, profile id to pin ties.
        ranked.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| b.matched_at.cmp(&a.matched_at))
                .then_with(|| a.profile.id.cmp(&b.profile.id))
        });
        let best = &ranked[0];

        let errand = Errand::from_request(request, best.profile.user_id, Utc::now());
        self.store
            .assign_errand_txn(request.id, best.profile.id, &errand)?;

        // Best-effort side effect, strictly after the commit.
        self.notifier
            .deliver(&assignment_notification(request, &errand))
            .await;

        Ok(Some(errand.id))
    }
}

fn assignment_notification(request: &Resource, errand: &Errand) -> Notification {
    let address = |key: &str| {
        request
            .spec_field_str(key, "full_address")
            .unwrap_or("N/A")
            .to_string()
    };
    Notification::direct(
        errand.errand_runner,
        format!(
            "You have been assigned a new errand: '{}'. Please accept to confirm.",
            request.name
        ),
        json!({
            "errandId": errand.id.to_string(),
            "resourceId": request.id.to_string(),
            "type": "errand_assignment",
            "resourceName": request.name,
            "pickupLocation": address("from_address"),
            "dropoffLocation": address("to_address"),
            "deliveryTime": request.spec_str("delivery_time").unwrap_or("N/A"),
        }),
    )
}
