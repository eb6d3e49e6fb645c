//! Persisted document types
//!
//! Every document serializes with its original wire field names; references
//! between documents are by [`ObjectId`] only.

mod errand;
mod id;
mod matches;
mod resource;
mod runner;
mod user;

pub use errand::{Errand, ErrandStatus};
pub use id::ObjectId;
pub use matches::{
    Match, MatchStatus, ACCEPTANCE_WINDOW_EXPIRED, INITIAL_PENDING_EXPIRED,
};
pub use resource::{Resource, ResourceStatus, ResourceType};
pub use runner::{PotentialErrand, RunnerProfile};
pub use user::{TransactionKind, User, Wallet, WalletTransaction, MAX_CREDITS};
