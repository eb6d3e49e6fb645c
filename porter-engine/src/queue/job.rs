//! Queue wire contract
//!
//! Jobs travel as `{name, data}` JSON envelopes. [`JobKind`] is the single
//! place that parses them; handlers only ever see the typed variant. Retry
//! counts and result TTLs for every job live here too.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{EngineError, EngineResult};
use crate::model::ObjectId;

/// Resource queue name (classification, matching, assignment, cleanup).
pub const RESOURCE_QUEUE: &str = "matchQueue";

/// Auto-complete queue name.
pub const AUTO_COMPLETE_QUEUE: &str = "auto_complete_match_queue";

/// Wire envelope shared with external producers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobEnvelope {
    pub name: String,
    #[serde(default)]
    pub data: Value,
}

/// Typed job dispatched to a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobKind {
    ClassifyResource { resource_id: ObjectId },
    PopulatePotentialMatches,
    MatchResources,
    AssignErrand,
    CleanupTimedOutMatches,
    AutoCompleteMatch,
}

impl JobKind {
    /// Parse a wire envelope. Unknown names and malformed payloads are
    /// queue errors that fail the single job without poisoning the queue.
    pub fn parse(envelope: &JobEnvelope) -> EngineResult<Self> {
        match envelope.name.as_str() {
            "classifyResource" => {
                let raw = envelope
                    .data
                    .get("resourceId")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        EngineError::Queue("classifyResource job missing resourceId".to_string())
                    })?;
                Ok(JobKind::ClassifyResource {
                    resource_id: ObjectId::parse_str(raw)?,
                })
            }
            "populatePotentialMatches" => Ok(JobKind::PopulatePotentialMatches),
            "matchResources" => Ok(JobKind::MatchResources),
            "assignErrand" => Ok(JobKind::AssignErrand),
            "cleanupTimedOutMatches" => Ok(JobKind::CleanupTimedOutMatches),
            "auto_complete_match_job" => Ok(JobKind::AutoCompleteMatch),
            other => Err(EngineError::Queue(format!("unknown job name '{other}'"))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            JobKind::ClassifyResource { .. } => "classifyResource",
            JobKind::PopulatePotentialMatches => "populatePotentialMatches",
            JobKind::MatchResources => "matchResources",
            JobKind::AssignErrand => "assignErrand",
            JobKind::CleanupTimedOutMatches => "cleanupTimedOutMatches",
            JobKind::AutoCompleteMatch => "auto_complete_match_job",
        }
    }

    pub fn envelope(&self) -> JobEnvelope {
        let data = match self {
            JobKind::ClassifyResource { resource_id } => {
                json!({ "resourceId": resource_id.to_string() })
            }
            _ => json!({}),
        };
        JobEnvelope {
            name: self.name().to_string(),
            data,
        }
    }

    /// Which queue carries this job.
    pub fn queue(&self) -> &'static str {
        match self {
            JobKind::AutoCompleteMatch => AUTO_COMPLETE_QUEUE,
            _ => RESOURCE_QUEUE,
        }
    }

    /// Bounded attempts per job, enumerated in one place.
    pub fn max_attempts(&self) -> u32 {
        match self {
            JobKind::ClassifyResource { .. } => 1,
            JobKind::PopulatePotentialMatches => 1,
            JobKind::MatchResources => 1,
            JobKind::AssignErrand => 3,
            JobKind::CleanupTimedOutMatches => 3,
            JobKind::AutoCompleteMatch => 3,
        }
    }

    /// How long the job's result record is retained.
    pub fn result_ttl(&self) -> Duration {
        match self {
            JobKind::CleanupTimedOutMatches | JobKind::AutoCompleteMatch => {
                Duration::from_secs(3600)
            }
            _ => Duration::from_secs(300),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn envelope_round_trip() {
        let id = ObjectId::new();
        let kind = JobKind::ClassifyResource { resource_id: id };
        let envelope = kind.envelope();
        assert_eq!(envelope.name, "classifyResource");
        assert_eq!(JobKind::parse(&envelope).unwrap(), kind);

        for kind in [
            JobKind::PopulatePotentialMatches,
            JobKind::MatchResources,
            JobKind::AssignErrand,
            JobKind::CleanupTimedOutMatches,
            JobKind::AutoCompleteMatch,
        ] {
            assert_eq!(JobKind::parse(&kind.envelope()).unwrap(), kind);
        }
    }

    #[test]
    fn unknown_names_are_rejected() {
        let envelope = JobEnvelope {
            name: "dropTables".to_string(),
            data: json!({}),
        };
        assert!(matches!(
            JobKind::parse(&envelope),
            Err(EngineError::Queue(_))
        ));
    }

    #[test]
    fn classify_requires_a_resource_id() {
        let envelope = JobEnvelope {
            name: "classifyResource".to_string(),
            data: json!({}),
        };
        assert!(JobKind::parse(&envelope).is_err());
    }

    #[test]
    fn retry_policy_table() {
        let id = ObjectId::new();
        assert_eq!(JobKind::ClassifyResource { resource_id: id }.max_attempts(), 1);
        assert_eq!(JobKind::PopulatePotentialMatches.max_attempts(), 1);
        assert_eq!(JobKind::AssignErrand.max_attempts(), 3);
        assert_eq!(JobKind::CleanupTimedOutMatches.max_attempts(), 3);
        assert_eq!(JobKind::AutoCompleteMatch.max_attempts(), 3);
    }

    #[test]
    fn queue_routing() {
        assert_eq!(JobKind::AutoCompleteMatch.queue(), AUTO_COMPLETE_QUEUE);
        assert_eq!(JobKind::MatchResources.queue(), RESOURCE_QUEUE);
    }
}
