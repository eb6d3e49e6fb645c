//! Timed-out pending match cleanup
//!
//! Two windows, both measured from stored timestamps: the acceptance
//! window (one side accepted, the other went silent) and the initial
//! pending window (nobody acted at all). Cancellation goes through the
//! store's pending-only conditional write, so concurrent cleanups stay
//! idempotent.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::json;
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::model::{Match, ACCEPTANCE_WINDOW_EXPIRED, INITIAL_PENDING_EXPIRED};
use crate::notify::{Notification, Notifier};
use crate::store::Store;

/// Points deducted from the party that let the acceptance window lapse.
const TIMEOUT_PENALTY_POINTS: i64 = -5;

/// What one cleanup pass did.
#[derive(Debug, Clone, Copy, Default)]
pub struct CleanupSummary {
    pub acceptance_window_cancelled: usize,
    pub initial_pending_cancelled: usize,
}

/// Cancels stale pending matches and applies penalties.
pub struct TimeoutCleaner {
    store: Arc<Store>,
    notifier: Arc<dyn Notifier>,
    window_hours: i64,
}

impl TimeoutCleaner {
    pub fn new(store: Arc<Store>, notifier: Arc<dyn Notifier>, config: &EngineConfig) -> Self {
        Self {
            store,
            notifier,
            window_hours: config.auto_complete_window_hours,
        }
    }

    pub async fn run(&self) -> EngineResult<CleanupSummary> {
        let threshold = Utc::now() - Duration::hours(self.window_hours);
        let mut summary = CleanupSummary::default();

        let acceptance_timeouts = self.store.acceptance_window_timeouts(threshold)?;
        info!(
            count = acceptance_timeouts.len(),
            "acceptance-window timeouts found"
        );
        for m in acceptance_timeouts {
            match self.cancel_acceptance_timeout(&m).await {
                Ok(true) => summary.acceptance_window_cancelled += 1,
                Ok(false) => {}
                Err(err) => warn!(id = %m.id, %err, "failed to process timed-out match"),
            }
        }

        let initial_timeouts = self.store.initial_pending_timeouts(threshold)?;
        info!(count = initial_timeouts.len(), "initial-pending timeouts found");
        for m in initial_timeouts {
            match self.cancel_initial_timeout(&m).await {
                Ok(true) => summary.initial_pending_cancelled += 1,
                Ok(false) => {}
                Err(err) => warn!(id = %m.id, %err, "failed to process timed-out match"),
            }
        }

        Ok(summary)
    }

    /// Returns `true` when this pass performed the cancellation.
    async fn cancel_acceptance_timeout(&self, m: &Match) -> EngineResult<bool> {
        let now = Utc::now();
        let Some(cancelled) = self
            .store
            .cancel_if_pending(m.id, ACCEPTANCE_WINDOW_EXPIRED, now)?
        else {
            // Another handler already moved it out of pending.
            return Ok(false);
        };

        if let Some(timed_out_user) = cancelled.timed_out_side() {
            info!(
                id = %m.id,
                user = %timed_out_user,
                "applying acceptance-window timeout penalty"
            );
            self.store.set_timeout_penalty(m.id, timed_out_user, now)?;
            if !self.store.adjust_points(timed_out_user, TIMEOUT_PENALTY_POINTS)? {
                warn!(user = %timed_out_user, "penalized user not found");
            }
            self.notifier
                .deliver(&Notification::broadcast(
                    &[cancelled.requester, cancelled.owner],
                    "match_timed_out_penalty",
                    json!({
                        "matchId": m.id.to_string(),
                        "timedOutUserId": timed_out_user.to_string(),
                    }),
                ))
                .await;
        } else {
            // Both flags set yet still pending: nothing to penalize.
            warn!(id = %m.id, "pending match with both acceptances, cancelled without penalty");
        }
        Ok(true)
    }

    async fn cancel_initial_timeout(&self, m: &Match) -> EngineResult<bool> {
        let Some(cancelled) = self
            .store
            .cancel_if_pending(m.id, INITIAL_PENDING_EXPIRED, Utc::now())?
        else {
            return Ok(false);
        };
        self.notifier
            .deliver(&Notification::broadcast(
                &[cancelled.requester, cancelled.owner],
                "match_cancelled_no_action",
                json!({ "matchId": m.id.to_string() }),
            ))
            .await;
        Ok(true)
    }
}
