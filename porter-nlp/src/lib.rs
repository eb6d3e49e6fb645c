//! Text classification for the Porter matching engine
//!
//! This crate provides:
//! - Resource classification into categories and granular errand buckets
//! - Category-specific fuzzy specification extraction
//! - The embedding-provider seam used by the classifier and the engine's
//!   similarity scoring
//! - Model cache state tracking with a cross-process initialization lock

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod classifier;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod models;

pub use classifier::{classify_errand_bucket, Classification, Classifier, CLASSIFICATION_ERROR, MISC};
pub use embedding::{cosine, EmbeddingProvider, FixedEmbedder, HashingEmbedder};
pub use error::{NlpError, NlpResult};
pub use models::{ModelCache, ModelLock, ModelState};
