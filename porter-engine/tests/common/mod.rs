#![allow(dead_code)]

//! Shared fixtures for the engine integration suites.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use porter_engine::model::{
    Match, MatchStatus, ObjectId, Resource, ResourceStatus, ResourceType, RunnerProfile, User,
    Wallet,
};
use porter_engine::store::Store;

/// A goods resource already classified and open for matching.
pub fn matching_resource(
    resource_type: ResourceType,
    category: &str,
    name: &str,
    price: f64,
) -> Resource {
    let mut resource = Resource::new(ObjectId::new(), name, "", resource_type, Some(price));
    resource.category = Some(category.to_string());
    resource.status = ResourceStatus::Matching;
    resource
}

/// A service request in `matching`, carrying addresses for scoring and
/// errand derivation.
pub fn service_request(name: &str, price: f64) -> Resource {
    let mut request = Resource::new(
        ObjectId::new(),
        name,
        "",
        ResourceType::ServiceRequest,
        Some(price),
    );
    request.status = ResourceStatus::Matching;
    request.category = Some("takeout".to_string());
    request.specifications.insert(
        "from_address".to_string(),
        json!({
            "buildingName": "Cafeteria A",
            "campusZone": "north",
            "full_address": "Cafeteria A, North Campus"
        }),
    );
    request.specifications.insert(
        "to_address".to_string(),
        json!({
            "buildingName": "Dorm 12",
            "campusZone": "north",
            "full_address": "Dorm 12, North Campus"
        }),
    );
    request
}

/// An available service offer from the given runner user.
pub fn service_offer(user_id: ObjectId) -> Resource {
    let mut offer = Resource::new(
        user_id,
        "跑腿",
        "campus errands",
        ResourceType::ServiceOffer,
        Some(5.0),
    );
    offer.user_id = user_id;
    offer.status = ResourceStatus::Available;
    offer.category = Some("misc".to_string());
    offer
        .specifications
        .insert("availabilityCampusZone".to_string(), json!("north"));
    offer
}

/// A runner profile operating on the north campus.
pub fn north_campus_profile(user_id: ObjectId) -> RunnerProfile {
    let mut profile = RunnerProfile::new(user_id);
    profile.operating_campus_zones = vec!["north".to_string()];
    profile.vehicle_type = "bicycle".to_string();
    profile
}

/// A pending match between two users with plain suggested prices.
pub fn pending_match(
    requester: ObjectId,
    owner: ObjectId,
    created_at: DateTime<Utc>,
) -> Match {
    Match {
        id: ObjectId::new(),
        resource1: ObjectId::new(),
        resource2: ObjectId::new(),
        requester,
        owner,
        score: 8,
        original_price_requester: Some(50.0),
        original_price_owner: Some(40.0),
        suggested_price_requester: Some(42.0),
        suggested_price_owner: Some(48.0),
        resource1_payment: None,
        resource2_receipt: None,
        final_amount: None,
        status: MatchStatus::Pending,
        first_acceptance_time: None,
        requester_accepted_suggested_price: false,
        owner_accepted_suggested_price: false,
        requester_accepted_original_price: false,
        owner_accepted_original_price: false,
        rejected_by: None,
        timeout_penalty_applied_to: None,
        cancellation_reason: None,
        created_at,
        updated_at: created_at,
    }
}

/// Seed a user with points and credits.
pub fn seed_user(store: &Store, id: ObjectId, points: i64, credits: i64) -> User {
    let mut user = User::new(id);
    user.points = points;
    user.credits = credits;
    store.put_user(&user).unwrap();
    user
}

/// Seed a wallet with a starting balance.
pub fn seed_wallet(store: &Store, user_id: ObjectId, balance: f64) -> Wallet {
    let mut wallet = Wallet::new(user_id);
    wallet.balance = balance;
    store.put_wallet(&wallet).unwrap();
    wallet
}

/// Payload field helper for notification assertions.
pub fn data_str(data: &Value, key: &str) -> String {
    data[key].as_str().unwrap_or_default().to_string()
}
