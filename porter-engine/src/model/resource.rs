//! Resource postings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::id::ObjectId;

/// Posting type. Buy/sell/rent/lease cover goods; the service pair covers
/// errands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceType {
    Buy,
    Sell,
    Rent,
    Lease,
    ServiceRequest,
    ServiceOffer,
}

impl ResourceType {
    /// The one type this type can be matched against.
    pub fn counterpart(self) -> ResourceType {
        match self {
            ResourceType::Buy => ResourceType::Sell,
            ResourceType::Sell => ResourceType::Buy,
            ResourceType::Rent => ResourceType::Lease,
            ResourceType::Lease => ResourceType::Rent,
            ResourceType::ServiceRequest => ResourceType::ServiceOffer,
            ResourceType::ServiceOffer => ResourceType::ServiceRequest,
        }
    }

    /// Buyer side of a pairing: pays the price.
    pub fn is_buyer_side(self) -> bool {
        matches!(
            self,
            ResourceType::Buy | ResourceType::Lease | ResourceType::ServiceRequest
        )
    }

    /// Seller side of a pairing: receives the price.
    pub fn is_seller_side(self) -> bool {
        !self.is_buyer_side()
    }

    /// The serialized wire name.
    pub fn wire_name(self) -> &'static str {
        match self {
            ResourceType::Buy => "buy",
            ResourceType::Sell => "sell",
            ResourceType::Rent => "rent",
            ResourceType::Lease => "lease",
            ResourceType::ServiceRequest => "service-request",
            ResourceType::ServiceOffer => "service-offer",
        }
    }

    /// Goods types handled by the batch match pass.
    pub fn is_goods(self) -> bool {
        matches!(
            self,
            ResourceType::Buy | ResourceType::Sell | ResourceType::Rent | ResourceType::Lease
        )
    }
}

/// Resource lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    Submitted,
    Matching,
    Matched,
    ClassificationFailed,
    Active,
    Available,
}

/// A single user posting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: ObjectId,
    pub user_id: ObjectId,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub specifications: Map<String, Value>,
    #[serde(default)]
    pub price: Option<f64>,
    pub status: ResourceStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_errand_id: Option<ObjectId>,
    #[serde(default)]
    pub match_attempts: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl Resource {
    /// A freshly submitted posting.
    pub fn new(
        user_id: ObjectId,
        name: impl Into<String>,
        description: impl Into<String>,
        resource_type: ResourceType,
        price: Option<f64>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ObjectId::new(),
            user_id,
            name: name.into(),
            description: description.into(),
            resource_type,
            category: None,
            specifications: Map::new(),
            price,
            status: ResourceStatus::Submitted,
            created_at: now,
            updated_at: now,
            assigned_errand_id: None,
            match_attempts: 0,
            error_message: None,
        }
    }

    /// String value at a top-level specification key.
    pub fn spec_str(&self, key: &str) -> Option<&str> {
        self.specifications.get(key).and_then(Value::as_str)
    }

    /// String value at `specifications[key][field]`.
    pub fn spec_field_str(&self, key: &str, field: &str) -> Option<&str> {
        self.specifications
            .get(key)
            .and_then(Value::as_object)
            .and_then(|obj| obj.get(field))
            .and_then(Value::as_str)
    }
}
