//! Match scoring
//!
//! Pairwise goods scoring (name similarity plus specification overlap, with
//! the price-compatibility gate) and the runner-aware errand score used by
//! the potential-match populator.

use chrono::{DateTime, FixedOffset};
use porter_nlp::{cosine, EmbeddingProvider};
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::{ERRAND_FEE, SEMANTIC_SIMILARITY_WEIGHT};
use crate::model::{Resource, ResourceType, RunnerProfile};
use crate::similarity::{levenshtein, levenshtein_bonus};

/// Whether two posting types can pair at all.
pub fn types_compatible(a: ResourceType, b: ResourceType) -> bool {
    a.counterpart() == b
}

/// Name score: semantic cosine scaled into points, plus the edit-distance
/// bonus on lowercased names. An unavailable embedding model contributes a
/// zero semantic score.
pub fn name_score(provider: &dyn EmbeddingProvider, a: &str, b: &str) -> f64 {
    let semantic = if a.is_empty() || b.is_empty() {
        0.0
    } else {
        match (provider.embed(a), provider.embed(b)) {
            (Ok(va), Ok(vb)) => cosine(&va, &vb),
            (Err(err), _) | (_, Err(err)) => {
                debug!(%err, "semantic similarity unavailable, scoring names by edit distance only");
                0.0
            }
        }
    };
    let distance = levenshtein(&a.to_lowercase(), &b.to_lowercase());
    semantic * SEMANTIC_SIMILARITY_WEIGHT + levenshtein_bonus(distance) as f64
}

/// Canonical JSON rendering with recursively sorted object keys.
pub fn canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let inner: Vec<String> = keys
                .into_iter()
                .map(|k| {
                    let rendered = map.get(k).map(|v| canonical_json(v)).unwrap_or_default();
                    format!("{}:{}", Value::String(k.clone()), rendered)
                })
                .collect();
            format!("{{{}}}", inner.join(","))
        }
        Value::Array(items) => {
            let inner: Vec<String> = items.iter().map(canonical_json).collect();
            format!("[{}]", inner.join(","))
        }
        other => other.to_string(),
    }
}

/// Two points per specification key whose canonical values agree.
pub fn spec_score(a: &Map<String, Value>, b: &Map<String, Value>) -> i64 {
    let mut matched = 0;
    for (key, value_a) in a {
        if let Some(value_b) = b.get(key) {
            if canonical_json(value_a) == canonical_json(value_b) {
                matched += 1;
            }
        }
    }
    matched * 2
}

/// Total goods score for a pair, rounded to an integer so score tiers are
/// exact.
pub fn total_score(provider: &dyn EmbeddingProvider, a: &Resource, b: &Resource) -> i64 {
    let names = name_score(provider, &a.name, &b.name);
    let specs = spec_score(&a.specifications, &b.specifications);
    (names + specs as f64).round() as i64
}

/// Price gate: the buyer side must cover the seller side plus the errand
/// fee. Missing prices are never compatible.
pub fn price_compatible(a: &Resource, b: &Resource) -> bool {
    let (Some(price_a), Some(price_b)) = (a.price, b.price) else {
        return false;
    };
    if a.resource_type.is_buyer_side() && b.resource_type.is_seller_side() {
        price_a >= price_b + ERRAND_FEE
    } else if a.resource_type.is_seller_side() && b.resource_type.is_buyer_side() {
        price_b >= price_a + ERRAND_FEE
    } else {
        false
    }
}

fn field_lower(specs: &Map<String, Value>, key: &str, field: &str) -> String {
    specs
        .get(key)
        .and_then(Value::as_object)
        .and_then(|obj| obj.get(field))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_lowercase()
}

fn parse_instant(value: Option<&Value>) -> Option<DateTime<FixedOffset>> {
    value
        .and_then(Value::as_str)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
}

/// Runner-aware score between a service request and a service offer.
///
/// Location dominates; time overlap, door-delivery capability, cargo fit,
/// and required equipment adjust it. Clamped at zero.
pub fn errand_score(request: &Resource, offer: &Resource, profile: &RunnerProfile) -> i64 {
    let mut score: i64 = 0;
    let request_specs = &request.specifications;
    let offer_specs = &offer.specifications;

    // Location.
    let pickup_building = field_lower(request_specs, "from_address", "buildingName");
    let dropoff_building = field_lower(request_specs, "to_address", "buildingName");
    let pickup_zone = field_lower(request_specs, "from_address", "campusZone");
    let dropoff_zone = field_lower(request_specs, "to_address", "campusZone");
    let offer_zone = offer_specs
        .get("availabilityCampusZone")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_lowercase();
    let runner_zones: Vec<String> = profile
        .operating_campus_zones
        .iter()
        .map(|z| z.to_lowercase())
        .collect();

    // The building comparison against the offer's availability zone is
    // historical behavior; callers must not rely on it.
    if (!pickup_building.is_empty() && offer_zone == pickup_building)
        || (!dropoff_building.is_empty() && offer_zone == dropoff_building)
    {
        score += 50;
    } else {
        let pickup_in_zone = !pickup_zone.is_empty() && runner_zones.contains(&pickup_zone);
        let dropoff_in_zone = !dropoff_zone.is_empty() && runner_zones.contains(&dropoff_zone);
        if pickup_in_zone || dropoff_in_zone {
            if !offer_zone.is_empty() && (offer_zone == pickup_zone || offer_zone == dropoff_zone) {
                score += 30;
            } else {
                score += 20;
            }
        }
    }

    // Time overlap with the offer's first availability window.
    let request_start = parse_instant(request_specs.get("expectedStartTime"));
    let request_end = parse_instant(request_specs.get("expectedEndTime"));
    let first_slot = offer_specs
        .get("availableTimeSlots")
        .and_then(Value::as_array)
        .and_then(|slots| slots.first())
        .and_then(Value::as_object);
    let offer_start = first_slot.and_then(|slot| parse_instant(slot.get("start")));
    let offer_end = first_slot.and_then(|slot| parse_instant(slot.get("end")));
    if let (Some(rs), Some(re), Some(os), Some(oe)) =
        (request_start, request_end, offer_start, offer_end)
    {
        let overlap_start = rs.max(os);
        let overlap_end = re.min(oe);
        if overlap_end > overlap_start {
            score += 20;
        }
    }

    // Door delivery.
    if request_specs.get("door_delivery").and_then(Value::as_bool) == Some(true) {
        let capable = profile.special_equipment.iter().any(|e| e == "door-delivery")
            || matches!(profile.vehicle_type.as_str(), "foot" | "bicycle");
        score += if capable { 15 } else { -10 };
    }

    // Cargo fit: the request's size/weight description appearing in the
    // runner's capacity description.
    let item_details = request_specs.get("item_details").and_then(Value::as_object);
    let cargo_description = item_details
        .and_then(|d| d.get("size").or_else(|| d.get("weightDescription")))
        .and_then(Value::as_str)
        .unwrap_or_default();
    if !cargo_description.is_empty() && !profile.cargo_capacity_description.is_empty() {
        let capacity = profile.cargo_capacity_description.to_lowercase();
        if capacity.contains(&cargo_description.to_lowercase()) {
            score += 5;
        }
    }

    // Required equipment.
    if let Some(required) = request_specs.get("requiredEquipment").and_then(Value::as_array) {
        if !required.is_empty() {
            let holds_all = required.iter().all(|item| {
                item.as_str()
                    .map(|name| profile.special_equipment.iter().any(|e| e == name))
                    .unwrap_or(false)
            });
            score += if holds_all { 10 } else { -5 };
        }
    }

    score.max(0)
}
