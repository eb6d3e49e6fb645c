//! Concrete runner-executed errands

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::id::ObjectId;
use super::resource::Resource;

/// Errand execution status, driven by the runner-facing API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrandStatus {
    Pending,
    Accepted,
    PickingUp,
    Delivering,
    Completed,
    Cancelled,
}

/// A delivery/service instance linked to a service-request resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Errand {
    pub id: ObjectId,
    pub resource_request_id: ObjectId,
    pub errand_runner: ObjectId,
    pub current_status: ErrandStatus,
    pub pickup_location: Value,
    pub dropoff_location: Value,
    pub is_delivery_to_door: bool,
    pub delivery_fee: f64,
    pub door_delivery_units: i64,
    #[serde(default)]
    pub expected_start_time: Option<String>,
    #[serde(default)]
    pub expected_end_time: Option<String>,
    #[serde(default)]
    pub expected_timeframe_string: Option<String>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    pub runner_assigned_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn spec_string(request: &Resource, key: &str) -> Option<String> {
    request.spec_str(key).map(str::to_string)
}

impl Errand {
    /// Derive a fresh errand from a service-request's specifications.
    pub fn from_request(request: &Resource, runner: ObjectId, now: DateTime<Utc>) -> Self {
        let specs = &request.specifications;
        let empty = Value::Object(serde_json::Map::new());
        Self {
            id: ObjectId::new(),
            resource_request_id: request.id,
            errand_runner: runner,
            current_status: ErrandStatus::Pending,
            pickup_location: specs.get("from_address").cloned().unwrap_or_else(|| empty.clone()),
            dropoff_location: specs.get("to_address").cloned().unwrap_or(empty),
            is_delivery_to_door: specs
                .get("door_delivery")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            delivery_fee: request.price.unwrap_or(0.0),
            door_delivery_units: specs
                .get("door_delivery_units")
                .and_then(Value::as_i64)
                .unwrap_or(0),
            expected_start_time: spec_string(request, "expectedStartTime"),
            expected_end_time: spec_string(request, "expectedEndTime"),
            expected_timeframe_string: spec_string(request, "expectedTimeframeString"),
            completed_at: None,
            runner_assigned_at: now,
            created_at: now,
            updated_at: now,
        }
    }
}
