//! Candidate pairs considered by the match pass

use chrono::{DateTime, Utc};

use crate::model::{Match, MatchStatus, ObjectId, Resource};

/// One price-compatible pair that cleared the score threshold. Oriented:
/// `buyer` is the paying side (buy/lease), `seller` the receiving side
/// (sell/rent). Resources are held by value; the pass works off this
/// snapshot plus a live status map.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub buyer: Resource,
    pub seller: Resource,
    pub score: i64,
    pub buyer_price: f64,
    pub seller_price: f64,
}

impl Candidate {
    /// Graph node key for a resource orientation.
    pub fn node_key(resource: &Resource) -> String {
        format!(
            "resource_{}_type_{}",
            resource.id,
            resource.resource_type.wire_name()
        )
    }

    pub fn buyer_node(&self) -> String {
        Self::node_key(&self.buyer)
    }

    pub fn seller_node(&self) -> String {
        Self::node_key(&self.seller)
    }

    /// Build the pending match document for this pair with the given
    /// suggested prices.
    pub fn to_pending_match(
        &self,
        suggested_price_requester: Option<f64>,
        suggested_price_owner: Option<f64>,
        now: DateTime<Utc>,
    ) -> Match {
        Match {
            id: ObjectId::new(),
            resource1: self.buyer.id,
            resource2: self.seller.id,
            requester: self.buyer.user_id,
            owner: self.seller.user_id,
            score: self.score,
            original_price_requester: self.buyer.price,
            original_price_owner: self.seller.price,
            suggested_price_requester,
            suggested_price_owner,
            resource1_payment: None,
            resource2_receipt: None,
            final_amount: None,
            status: MatchStatus::Pending,
            first_acceptance_time: None,
            requester_accepted_suggested_price: false,
            owner_accepted_suggested_price: false,
            requester_accepted_original_price: false,
            owner_accepted_original_price: false,
            rejected_by: None,
            timeout_penalty_applied_to: None,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
        }
    }
}
