//! The batched goods-match pass
//!
//! One pass walks every category with resources open for matching,
//! enumerates price-compatible candidate pairs above the score threshold,
//! ranks them globally, and resolves conflicts tier by tier: a lone
//! top-tier candidate gets plain suggested prices, everything else goes
//! through maximum-weight bipartite selection with second-price clearing.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use porter_nlp::EmbeddingProvider;
use tracing::{debug, info};

use super::bipartite::{Edge, HungarianMatcher, MaxWeightMatcher};
use super::candidate::Candidate;
use super::vcg::TierPrices;
use crate::config::{EngineConfig, ERRAND_FEE};
use crate::error::EngineResult;
use crate::model::{Match, ObjectId, Resource, ResourceStatus};
use crate::scoring::{price_compatible, total_score};
use crate::store::Store;

/// What one pass did.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchPassSummary {
    pub categories: usize,
    pub candidates: usize,
    pub matches_created: usize,
    pub resources_matched: usize,
}

/// Batch goods-matching engine.
pub struct MatchEngine {
    store: Arc<Store>,
    provider: Arc<dyn EmbeddingProvider>,
    matcher: Box<dyn MaxWeightMatcher>,
    batch_size: usize,
    min_score: i64,
}

impl MatchEngine {
    pub fn new(
        store: Arc<Store>,
        provider: Arc<dyn EmbeddingProvider>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            store,
            provider,
            matcher: Box::new(HungarianMatcher),
            batch_size: config.match_batch_size,
            min_score: config.min_match_score,
        }
    }

    /// Run one full match pass over everything in `matching`.
    ///
    /// A persistence failure fails the pass; the queue re-runs it and the
    /// conditional status writes keep the retry safe.
    pub fn run_match_pass(&self) -> EngineResult<MatchPassSummary> {
        let categories = self.store.distinct_matching_categories()?;
        info!(categories = categories.len(), "starting match pass");

        let mut candidates: Vec<Candidate> = Vec::new();
        for category in &categories {
            let resources = self.gather_category(category)?;
            debug!(category = %category, resources = resources.len(), "gathered category");
            self.enumerate_candidates(&resources, &mut candidates);
        }
        info!(candidates = candidates.len(), "collected price-compatible candidates");

        // Global tier sort; the sort is stable, so enumeration order breaks
        // ties deterministically.
        candidates.sort_by(|a, b| b.score.cmp(&a.score));

        let referenced: HashSet<ObjectId> = candidates
            .iter()
            .flat_map(|c| [c.buyer.id, c.seller.id])
            .collect();
        let mut status_map = self.store.resource_status_map(&referenced)?;
        let mut matched_in_pass: HashSet<ObjectId> = HashSet::new();
        let mut created: Vec<Match> = Vec::new();
        let mut affected: HashSet<ObjectId> = HashSet::new();
        let now = Utc::now();

        let mut tier_start = 0;
        while tier_start < candidates.len() {
            let tier_score = candidates[tier_start].score;
            let mut tier_end = tier_start;
            while tier_end < candidates.len() && candidates[tier_end].score == tier_score {
                tier_end += 1;
            }
            let tier = &candidates[tier_start..tier_end];

            let is_available = |c: &Candidate,
                                statuses: &std::collections::HashMap<ObjectId, ResourceStatus>,
                                taken: &HashSet<ObjectId>| {
                statuses.get(&c.buyer.id) == Some(&ResourceStatus::Matching)
                    && !taken.contains(&c.buyer.id)
                    && statuses.get(&c.seller.id) == Some(&ResourceStatus::Matching)
                    && !taken.contains(&c.seller.id)
            };

            let available: Vec<&Candidate> = tier
                .iter()
                .filter(|c| is_available(c, &status_map, &matched_in_pass))
                .collect();
            debug!(
                score = tier_score,
                tier = tier.len(),
                available = available.len(),
                "processing score tier"
            );

            // A lone candidate at the very top of the ranking wins outright
            // with plain suggested prices.
            if tier_start == 0 && available.len() == 1 {
                let candidate = available[0];
                let suggested_requester = candidate.seller_price + ERRAND_FEE;
                let suggested_owner = candidate.buyer_price - ERRAND_FEE;
                let m = candidate.to_pending_match(
                    Some(suggested_requester),
                    Some(suggested_owner),
                    now,
                );
                info!(
                    score = tier_score,
                    buyer = %candidate.buyer.id,
                    seller = %candidate.seller.id,
                    "unique top-tier winner, creating pending match"
                );
                for id in [candidate.buyer.id, candidate.seller.id] {
                    status_map.insert(id, ResourceStatus::Matched);
                    matched_in_pass.insert(id);
                    affected.insert(id);
                }
                created.push(m);
            } else if !available.is_empty() {
                // Tie-break by maximum-weight bipartite selection, clearing
                // at second prices over the whole available pool.
                //
                // Edges go to the matcher in a canonical order so that
                // equal-weight matchings resolve the same way on every run:
                // bids descending, asks ascending, enumeration order last.
                let mut ordered: Vec<&Candidate> = available.clone();
                ordered.sort_by(|a, b| {
                    b.buyer_price
                        .partial_cmp(&a.buyer_price)
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then_with(|| {
                            a.seller_price
                                .partial_cmp(&b.seller_price)
                                .unwrap_or(std::cmp::Ordering::Equal)
                        })
                });
                let mut edges = Vec::new();
                let mut edge_source: Vec<usize> = Vec::new();
                for (index, candidate) in ordered.iter().enumerate() {
                    let weight = candidate.buyer_price - candidate.seller_price;
                    if weight > 0.0 {
                        edges.push(Edge {
                            left: candidate.buyer_node(),
                            right: candidate.seller_node(),
                            weight,
                        });
                        edge_source.push(index);
                    }
                }
                if edges.is_empty() {
                    debug!(score = tier_score, "no positive-surplus edges in tier");
                } else {
                    let selected = self.matcher.select(&edges);
                    let tier_prices = TierPrices::from_pool(&available);
                    debug!(
                        score = tier_score,
                        selected = selected.len(),
                        ?tier_prices,
                        "bipartite selection complete"
                    );
                    for edge_index in selected {
                        let candidate = ordered[edge_source[edge_index]];
                        if !is_available(candidate, &status_map, &matched_in_pass) {
                            debug!(
                                buyer = %candidate.buyer.id,
                                seller = %candidate.seller.id,
                                "selected pair no longer available, skipping"
                            );
                            continue;
                        }
                        let (buyer_pays, seller_receives) = tier_prices.clearing_prices(candidate);
                        let m = candidate.to_pending_match(
                            Some(buyer_pays),
                            Some(seller_receives),
                            now,
                        );
                        for id in [candidate.buyer.id, candidate.seller.id] {
                            status_map.insert(id, ResourceStatus::Matched);
                            matched_in_pass.insert(id);
                            affected.insert(id);
                        }
                        created.push(m);
                    }
                }
            }

            tier_start = tier_end;
        }

        let matches_created = created.len();
        if !created.is_empty() {
            self.store.insert_matches(&created)?;
        }
        let resources_matched = if affected.is_empty() {
            0
        } else {
            self.store.mark_resources_matched(&affected)?
        };
        info!(matches_created, resources_matched, "match pass finished");

        Ok(MatchPassSummary {
            categories: categories.len(),
            candidates: candidates.len(),
            matches_created,
            resources_matched,
        })
    }

    fn gather_category(&self, category: &str) -> EngineResult<Vec<Resource>> {
        let mut all = Vec::new();
        let mut skip = 0;
        loop {
            let page = self
                .store
                .matching_goods_page(category, skip, self.batch_size)?;
            if page.is_empty() {
                break;
            }
            skip += page.len();
            all.extend(page);
        }
        Ok(all)
    }

    /// One candidate per unordered pair, oriented buyer side to seller
    /// side.
    fn enumerate_candidates(&self, resources: &[Resource], out: &mut Vec<Candidate>) {
        for buyer in resources.iter().filter(|r| r.resource_type.is_buyer_side()) {
            let counterpart = buyer.resource_type.counterpart();
            for seller in resources.iter().filter(|r| r.resource_type == counterpart) {
                if seller.id == buyer.id || seller.category != buyer.category {
                    continue;
                }
                if !price_compatible(buyer, seller) {
                    continue;
                }
                let score = total_score(self.provider.as_ref(), buyer, seller);
                if score < self.min_score {
                    continue;
                }
                let (Some(buyer_price), Some(seller_price)) = (buyer.price, seller.price) else {
                    continue;
                };
                out.push(Candidate {
                    buyer: buyer.clone(),
                    seller: seller.clone(),
                    score,
                    buyer_price,
                    seller_price,
                });
            }
        }
    }
}
