//! Negotiated pairings between two resources

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::ObjectId;
use crate::error::{EngineError, EngineResult};

/// Cancellation reason recorded when the acceptance window lapses.
pub const ACCEPTANCE_WINDOW_EXPIRED: &str = "Acceptance window expired";

/// Cancellation reason recorded when nobody acts on a fresh match.
pub const INITIAL_PENDING_EXPIRED: &str = "Initial pending window expired";

/// Match lifecycle status. Once a match leaves `pending` it never returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Pending,
    Erranding,
    Completed,
    Cancelled,
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MatchStatus::Pending => "pending",
            MatchStatus::Erranding => "erranding",
            MatchStatus::Completed => "completed",
            MatchStatus::Cancelled => "cancelled",
        };
        write!(f, "{name}")
    }
}

/// A negotiated pairing. `resource1` is the requester (buyer) side,
/// `resource2` the owner (seller) side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: ObjectId,
    pub resource1: ObjectId,
    pub resource2: ObjectId,
    pub requester: ObjectId,
    pub owner: ObjectId,
    pub score: i64,
    #[serde(default)]
    pub original_price_requester: Option<f64>,
    #[serde(default)]
    pub original_price_owner: Option<f64>,
    #[serde(default)]
    pub suggested_price_requester: Option<f64>,
    #[serde(default)]
    pub suggested_price_owner: Option<f64>,
    #[serde(default)]
    pub resource1_payment: Option<f64>,
    #[serde(default)]
    pub resource2_receipt: Option<f64>,
    #[serde(default)]
    pub final_amount: Option<f64>,
    pub status: MatchStatus,
    #[serde(default)]
    pub first_acceptance_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub requester_accepted_suggested_price: bool,
    #[serde(default)]
    pub owner_accepted_suggested_price: bool,
    #[serde(default)]
    pub requester_accepted_original_price: bool,
    #[serde(default)]
    pub owner_accepted_original_price: bool,
    #[serde(default)]
    pub rejected_by: Option<ObjectId>,
    #[serde(default)]
    pub timeout_penalty_applied_to: Option<ObjectId>,
    #[serde(default)]
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Match {
    fn ensure_pending(&self, to: MatchStatus) -> EngineResult<()> {
        if self.status != MatchStatus::Pending {
            return Err(EngineError::InvalidStateTransition {
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }
        Ok(())
    }

    /// Record that `user` accepted the suggested price.
    ///
    /// The first acceptance starts the acceptance window; the second one
    /// moves the match into `erranding` and fixes the final amounts from
    /// the suggested prices.
    pub fn record_acceptance(&mut self, user: ObjectId, now: DateTime<Utc>) -> EngineResult<()> {
        self.ensure_pending(MatchStatus::Erranding)?;
        if user == self.requester {
            self.requester_accepted_suggested_price = true;
        } else if user == self.owner {
            self.owner_accepted_suggested_price = true;
        } else {
            return Err(EngineError::Validation(format!(
                "user {user} is not a party to match {}",
                self.id
            )));
        }
        if self.first_acceptance_time.is_none() {
            self.first_acceptance_time = Some(now);
        }
        if self.requester_accepted_suggested_price && self.owner_accepted_suggested_price {
            self.status = MatchStatus::Erranding;
            self.resource1_payment = self.suggested_price_requester;
            self.resource2_receipt = self.suggested_price_owner;
            self.final_amount = self.suggested_price_requester;
        }
        self.updated_at = now;
        Ok(())
    }

    /// Record that `user` rejected the suggested price.
    pub fn record_rejection(&mut self, user: ObjectId, now: DateTime<Utc>) -> EngineResult<()> {
        self.ensure_pending(MatchStatus::Cancelled)?;
        if user != self.requester && user != self.owner {
            return Err(EngineError::Validation(format!(
                "user {user} is not a party to match {}",
                self.id
            )));
        }
        self.status = MatchStatus::Cancelled;
        self.rejected_by = Some(user);
        self.updated_at = now;
        Ok(())
    }

    /// Cancel a still-pending match with a reason.
    pub fn cancel(&mut self, reason: &str, now: DateTime<Utc>) -> EngineResult<()> {
        self.ensure_pending(MatchStatus::Cancelled)?;
        self.status = MatchStatus::Cancelled;
        self.cancellation_reason = Some(reason.to_string());
        self.updated_at = now;
        Ok(())
    }

    /// The party that never accepted, if exactly one side is outstanding.
    pub fn timed_out_side(&self) -> Option<ObjectId> {
        if !self.requester_accepted_suggested_price {
            Some(self.requester)
        } else if !self.owner_accepted_suggested_price {
            Some(self.owner)
        } else {
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn pending_match() -> Match {
        let now = Utc::now();
        Match {
            id: ObjectId::new(),
            resource1: ObjectId::new(),
            resource2: ObjectId::new(),
            requester: ObjectId::new(),
            owner: ObjectId::new(),
            score: 8,
            original_price_requester: Some(50.0),
            original_price_owner: Some(40.0),
            suggested_price_requester: Some(42.0),
            suggested_price_owner: Some(48.0),
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

    #[test]
    fn first_acceptance_starts_the_window() {
        let mut m = pending_match();
        let now = Utc::now();
        m.record_acceptance(m.requester, now).unwrap();
        assert_eq!(m.status, MatchStatus::Pending);
        assert_eq!(m.first_acceptance_time, Some(now));
        assert!(m.requester_accepted_suggested_price);
    }

    #[test]
    fn second_acceptance_moves_to_erranding() {
        let mut m = pending_match();
        let first = Utc::now();
        m.record_acceptance(m.requester, first).unwrap();
        m.record_acceptance(m.owner, Utc::now()).unwrap();
        assert_eq!(m.status, MatchStatus::Erranding);
        // The window anchor keeps the first acceptance time.
        assert_eq!(m.first_acceptance_time, Some(first));
        assert_eq!(m.resource1_payment, Some(42.0));
        assert_eq!(m.resource2_receipt, Some(48.0));
        assert_eq!(m.final_amount, Some(42.0));
    }

    #[test]
    fn rejection_cancels() {
        let mut m = pending_match();
        let owner = m.owner;
        m.record_rejection(owner, Utc::now()).unwrap();
        assert_eq!(m.status, MatchStatus::Cancelled);
        assert_eq!(m.rejected_by, Some(owner));
    }

    #[test]
    fn cancelled_match_refuses_further_transitions() {
        let mut m = pending_match();
        m.cancel(ACCEPTANCE_WINDOW_EXPIRED, Utc::now()).unwrap();
        let err = m.record_acceptance(m.requester, Utc::now()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidStateTransition { .. }));
    }

    #[test]
    fn outsiders_cannot_accept() {
        let mut m = pending_match();
        assert!(m.record_acceptance(ObjectId::new(), Utc::now()).is_err());
    }

    #[test]
    fn timed_out_side_is_the_non_accepting_party() {
        let mut m = pending_match();
        m.record_acceptance(m.requester, Utc::now()).unwrap();
        assert_eq!(m.timed_out_side(), Some(m.owner));
    }
}
