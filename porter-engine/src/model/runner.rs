//! Runner capability profiles

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::ObjectId;

/// One scored (request, offer) pairing held on a runner profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PotentialErrand {
    pub request_id: ObjectId,
    pub offer_id: ObjectId,
    pub score: i64,
    pub matched_at: DateTime<Utc>,
}

/// Capabilities and availability of a runner user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunnerProfile {
    pub id: ObjectId,
    pub user_id: ObjectId,
    #[serde(default)]
    pub operating_campus_zones: Vec<String>,
    #[serde(default)]
    pub vehicle_type: String,
    #[serde(default)]
    pub special_equipment: Vec<String>,
    #[serde(default)]
    pub cargo_capacity_description: String,
    #[serde(default)]
    pub potential_errand_requests: Vec<PotentialErrand>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_active_errand: Option<ObjectId>,
}

impl RunnerProfile {
    pub fn new(user_id: ObjectId) -> Self {
        Self {
            id: ObjectId::new(),
            user_id,
            operating_campus_zones: Vec::new(),
            vehicle_type: String::new(),
            special_equipment: Vec::new(),
            cargo_capacity_description: String::new(),
            potential_errand_requests: Vec::new(),
            current_active_errand: None,
        }
    }

    /// Replace the entry with the same `requestId`, or append.
    /// Keeps at most one entry per request.
    pub fn upsert_potential(&mut self, entry: PotentialErrand) {
        if let Some(existing) = self
            .potential_errand_requests
            .iter_mut()
            .find(|e| e.request_id == entry.request_id)
        {
            *existing = entry;
        } else {
            self.potential_errand_requests.push(entry);
        }
    }

    pub fn potential_for(&self, request_id: ObjectId) -> Option<&PotentialErrand> {
        self.potential_errand_requests
            .iter()
            .find(|e| e.request_id == request_id)
    }

    /// A runner with no active errand can take on a new one.
    pub fn is_assignable(&self) -> bool {
        self.current_active_errand.is_none()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn upsert_replaces_instead_of_duplicating() {
        let mut profile = RunnerProfile::new(ObjectId::new());
        let request_id = ObjectId::new();
        let offer_id = ObjectId::new();
        profile.upsert_potential(PotentialErrand {
            request_id,
            offer_id,
            score: 30,
            matched_at: Utc::now(),
        });
        profile.upsert_potential(PotentialErrand {
            request_id,
            offer_id,
            score: 45,
            matched_at: Utc::now(),
        });
        assert_eq!(profile.potential_errand_requests.len(), 1);
        assert_eq!(profile.potential_for(request_id).unwrap().score, 45);
    }

    #[test]
    fn assignable_only_without_active_errand() {
        let mut profile = RunnerProfile::new(ObjectId::new());
        assert!(profile.is_assignable());
        profile.current_active_errand = Some(ObjectId::new());
        assert!(!profile.is_assignable());
    }
}
