//! Match auto-completion
//!
//! Daily pass over erranding matches: once the linked errand has been
//! completed for longer than the window, the owner gets paid and the match
//! closes. All mutations for one match share a transaction; completed
//! matches are skipped, so re-runs are no-ops.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::model::{Errand, Match};
use crate::store::{CompletionOutcome, Store};

/// What one auto-complete pass did.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoCompleteSummary {
    pub erranding_seen: usize,
    pub completed: usize,
}

/// Credits wallets and closes stale erranding matches.
pub struct AutoCompleter {
    store: Arc<Store>,
    window_hours: i64,
}

impl AutoCompleter {
    pub fn new(store: Arc<Store>, config: &EngineConfig) -> Self {
        Self {
            store,
            window_hours: config.auto_complete_window_hours,
        }
    }

    pub fn run(&self) -> EngineResult<AutoCompleteSummary> {
        let threshold = Utc::now() - Duration::hours(self.window_hours);
        let erranding = self.store.erranding_matches()?;
        info!(count = erranding.len(), "scanning erranding matches for auto-completion");

        let mut completed = 0;
        for m in &erranding {
            let errand = match self.linked_errand(m) {
                Ok(Some(errand)) => errand,
                Ok(None) => continue,
                Err(err) => {
                    warn!(id = %m.id, %err, "failed to resolve linked errand");
                    continue;
                }
            };
            let Some(completed_at) = errand.completed_at else {
                continue;
            };
            if completed_at > threshold {
                continue;
            }

            match self.store.complete_match_txn(m.id, Utc::now()) {
                Ok(CompletionOutcome::Applied) => {
                    info!(id = %m.id, "auto-completed match");
                    completed += 1;
                }
                Ok(CompletionOutcome::Skipped) => {
                    debug!(id = %m.id, "match already completed, skipping");
                }
                Err(err) => {
                    // The failed match stays erranding and is re-picked on
                    // the next scheduled run.
                    warn!(id = %m.id, %err, "auto-completion aborted");
                }
            }
        }

        Ok(AutoCompleteSummary {
            erranding_seen: erranding.len(),
            completed,
        })
    }

    /// Join the match to its service request's errand.
    fn linked_errand(&self, m: &Match) -> EngineResult<Option<Errand>> {
        let Some(request) = self.store.get_resource(m.resource1)? else {
            return Ok(None);
        };
        let Some(errand_id) = request.assigned_errand_id else {
            return Ok(None);
        };
        self.store.get_errand(errand_id)
    }
}
