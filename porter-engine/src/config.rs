//! Environment-driven engine configuration
//!
//! Every tunable comes from the process environment with a production
//! default. Invalid values are startup errors; the process exits non-zero
//! and the supervisor restarts it.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{EngineError, EngineResult};

/// Fixed offset between the suggested buyer and seller prices.
pub const ERRAND_FEE: f64 = 2.0;

/// Weight scaling semantic name similarity (0..1) into points.
pub const SEMANTIC_SIMILARITY_WEIGHT: f64 = 5.0;

/// Recency window for the potential-match populator, in minutes.
pub const RECENCY_WINDOW_MINUTES: i64 = 10;

/// Engine configuration, loaded once at startup and passed into components.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// External broker host (wire contract; the in-process broker ignores it)
    pub broker_host: String,
    /// External broker port
    pub broker_port: u16,
    /// Document store URI
    pub store_uri: String,
    /// Logical database name
    pub database_name: String,
    /// Directory backing the embedded store
    pub data_dir: PathBuf,
    /// Both match-lifecycle timeout windows, in hours
    pub auto_complete_window_hours: i64,
    /// Page size for batched resource fetches
    pub match_batch_size: usize,
    /// Minimum score gating match creation and runner eligibility
    pub min_match_score: i64,
    /// Credit floor required of runners
    pub min_required_credits: i64,
    /// Notification endpoint URL
    pub notification_url: String,
    /// Tokenizer pipeline model name
    pub spacy_model_name: String,
    /// Transformer model name backing the pipeline
    pub transformer_model_name: String,
    /// Sentence-embedding model name
    pub sentence_transformer_model_name: String,
    /// Model artifact cache directory
    pub nlp_cache_dir: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            broker_host: "localhost".to_string(),
            broker_port: 6379,
            store_uri: "mongodb://localhost:27017/".to_string(),
            database_name: "porter".to_string(),
            data_dir: PathBuf::from("./data/porter"),
            auto_complete_window_hours: 24,
            match_batch_size: 1000,
            min_match_score: 5,
            min_required_credits: 60,
            notification_url: "http://localhost:5000/api/notifications/send".to_string(),
            spacy_model_name: "xx".to_string(),
            transformer_model_name: "xlm-roberta-base".to_string(),
            sentence_transformer_model_name: "paraphrase-multilingual-MiniLM-L12-v2".to_string(),
            nlp_cache_dir: PathBuf::from("./data/nlp-cache"),
        }
    }
}

fn parsed<T>(key: &str, fallback: T) -> EngineResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|err| EngineError::Config(format!("invalid {key}={raw}: {err}"))),
        Err(_) => Ok(fallback),
    }
}

fn text(key: &str, fallback: &str) -> String {
    env::var(key).unwrap_or_else(|_| fallback.to_string())
}

impl EngineConfig {
    /// Load configuration from the environment.
    pub fn from_env() -> EngineResult<Self> {
        let defaults = Self::default();
        let database_name = text("MONGO_DB_NAME", &defaults.database_name);
        let data_root = text("PORTER_DATA_DIR", "./data");
        Ok(Self {
            broker_host: text("REDIS_HOST", &defaults.broker_host),
            broker_port: parsed("REDIS_PORT", defaults.broker_port)?,
            store_uri: text("MONGO_URI", &defaults.store_uri),
            data_dir: PathBuf::from(&data_root).join(&database_name),
            database_name,
            auto_complete_window_hours: parsed(
                "AUTO_COMPLETE_TIME_WINDOW_HOURS",
                defaults.auto_complete_window_hours,
            )?,
            match_batch_size: parsed("MATCH_BATCH_SIZE", defaults.match_batch_size)?,
            min_match_score: parsed("MIN_MATCH_SCORE", defaults.min_match_score)?,
            min_required_credits: parsed("MIN_REQUIRED_CREDITS", defaults.min_required_credits)?,
            notification_url: text("NOTIFICATION_URL", &defaults.notification_url),
            spacy_model_name: text("SPACY_MODEL_NAME", &defaults.spacy_model_name),
            transformer_model_name: text(
                "TRANSFORMER_MODEL_NAME",
                &defaults.transformer_model_name,
            ),
            sentence_transformer_model_name: text(
                "SENTENCE_TRANSFORMER_MODEL_NAME",
                &defaults.sentence_transformer_model_name,
            ),
            nlp_cache_dir: PathBuf::from(&data_root).join("nlp-cache"),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_production_values() {
        let config = EngineConfig::default();
        assert_eq!(config.auto_complete_window_hours, 24);
        assert_eq!(config.match_batch_size, 1000);
        assert_eq!(config.min_match_score, 5);
        assert_eq!(config.min_required_credits, 60);
        assert_eq!(config.broker_port, 6379);
    }
}
