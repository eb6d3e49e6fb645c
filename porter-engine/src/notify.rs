//! Notification client
//!
//! Fire-and-forget JSON POSTs to the user-facing notification endpoint.
//! Delivery is best-effort: bounded retries with exponential backoff, then
//! a warning. A notification failure never affects persisted state.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{EngineError, EngineResult};
use crate::model::ObjectId;

/// Request timeout for the notification endpoint.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// The two payload shapes the endpoint accepts.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Notification {
    /// Single-recipient message (errand assignment).
    Direct {
        #[serde(rename = "userId")]
        user_id: String,
        message: String,
        data: Value,
    },
    /// Keyed broadcast to several recipients (lifecycle events).
    Broadcast {
        #[serde(rename = "recipientUserIds")]
        recipient_user_ids: Vec<String>,
        #[serde(rename = "messageKey")]
        message_key: String,
        data: Value,
    },
}

impl Notification {
    pub fn direct(user: ObjectId, message: impl Into<String>, data: Value) -> Self {
        Notification::Direct {
            user_id: user.to_string(),
            message: message.into(),
            data,
        }
    }

    pub fn broadcast(recipients: &[ObjectId], message_key: impl Into<String>, data: Value) -> Self {
        Notification::Broadcast {
            recipient_user_ids: recipients.iter().map(ObjectId::to_string).collect(),
            message_key: message_key.into(),
            data,
        }
    }
}

/// Delivery seam. The engine only ever fires and forgets.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a notification, swallowing failures after logging them.
    async fn deliver(&self, notification: &Notification);
}

/// Backoff schedule for delivery retries.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
            multiplier: 2.0,
        }
    }
}

/// HTTP implementation over the configured endpoint URL.
pub struct HttpNotifier {
    client: reqwest::Client,
    url: String,
    retry: RetryConfig,
}

impl HttpNotifier {
    pub fn new(url: impl Into<String>) -> EngineResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| EngineError::Notification(err.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
            retry: RetryConfig::default(),
        })
    }

    async fn attempt(&self, notification: &Notification) -> Result<(), String> {
        let response = self
            .client
            .post(&self.url)
            .json(notification)
            .send()
            .await
            .map_err(|err| err.to_string())?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(format!("endpoint returned {}", response.status()))
        }
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn deliver(&self, notification: &Notification) {
        let mut delay = self.retry.initial_delay;
        for attempt in 0..=self.retry.max_retries {
            match self.attempt(notification).await {
                Ok(()) => {
                    debug!(url = %self.url, "notification delivered");
                    return;
                }
                Err(reason) if attempt < self.retry.max_retries => {
                    debug!(%reason, attempt, "notification attempt failed, retrying");
                    tokio::time::sleep(delay).await;
                    delay = delay.mul_f64(self.retry.multiplier).min(self.retry.max_delay);
                }
                Err(reason) => {
                    warn!(url = %self.url, %reason, "giving up on notification delivery");
                }
            }
        }
    }
}

/// In-memory notifier for tests and dry runs.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain everything delivered so far.
    pub fn take(&self) -> Vec<Notification> {
        match self.sent.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(_) => Vec::new(),
        }
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn deliver(&self, notification: &Notification) {
        if let Ok(mut guard) = self.sent.lock() {
            guard.push(notification.clone());
        }
    }
}
