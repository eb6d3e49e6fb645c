//! Match lifecycle: negotiation transitions, timeout cleanup, and
//! auto-completion.
//!
//! The negotiation endpoints (the REST surface) live outside this engine;
//! the transitions they trigger live here so every status change flows
//! through the same conditional writes.

mod autocomplete;
mod timeouts;

pub use autocomplete::{AutoCompleteSummary, AutoCompleter};
pub use timeouts::{CleanupSummary, TimeoutCleaner};

use chrono::Utc;

use crate::error::EngineResult;
use crate::model::{Match, ObjectId};
use crate::store::Store;

/// Record that `user` accepted the suggested price on a pending match.
/// The second acceptance promotes the match to `erranding`.
pub fn accept_suggested_price(
    store: &Store,
    match_id: ObjectId,
    user: ObjectId,
) -> EngineResult<Match> {
    store.record_acceptance(match_id, user, Utc::now())
}

/// Record that `user` rejected the suggested price, cancelling the match.
pub fn reject_suggested_price(
    store: &Store,
    match_id: ObjectId,
    user: ObjectId,
) -> EngineResult<Match> {
    store.record_rejection(match_id, user, Utc::now())
}
