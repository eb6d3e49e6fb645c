//! Second-price rules for tie-broken tiers
//!
//! Prices for bipartite-selected winners come from the *entire* pool of
//! available candidates in the tier, not just the winners: the buyer pays
//! at most the second-lowest ask in the pool, the seller receives their
//! own ask. Duplicate prices collapse before picking the runner-up.

use super::candidate::Candidate;

/// Runner-up pricing across one tier's available candidate pool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierPrices {
    /// Second-smallest distinct seller ask, if the pool has two.
    pub second_best_seller: Option<f64>,
}

fn sorted_distinct(mut prices: Vec<f64>) -> Vec<f64> {
    prices.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    prices.dedup();
    prices
}

impl TierPrices {
    /// Extract the runner-up ask from the tier pool.
    pub fn from_pool(pool: &[&Candidate]) -> Self {
        let seller_prices = sorted_distinct(pool.iter().map(|c| c.seller_price).collect());
        let second_best_seller = if seller_prices.len() > 1 {
            Some(seller_prices[1])
        } else {
            None
        };
        Self { second_best_seller }
    }

    /// Clearing prices for one selected candidate: what the requester pays
    /// and what the owner receives.
    pub fn clearing_prices(&self, candidate: &Candidate) -> (f64, f64) {
        let buyer_pays = match self.second_best_seller {
            Some(second_ask) => candidate.buyer_price.min(second_ask),
            None => candidate.buyer_price,
        };
        let seller_receives = candidate.seller_price;
        (buyer_pays, seller_receives)
    }
}
