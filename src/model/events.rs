use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Notification emitted after an order workflow is triggered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderEvent {
    pub id: String,
    pub item_id: String,
}

/// Envelope wrapping every payload sent to the event bus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_id: Uuid,
    pub topic: String,
    pub published_at: DateTime<Utc>,
    pub payload: serde_json::Value,
}

impl EventEnvelope {
    pub fn new(topic: &str, payload: serde_json::Value) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            topic: topic.to_string(),
            published_at: Utc::now(),
            payload,
        }
    }
}

/// Message published on the product-update topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ProductMessage {
    UpdateProduct(serde_json::Map<String, serde_json::Value>),
}

/// Per-item outcome of a product-update batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PublishResult {
    Success {
        id: Option<serde_json::Value>,
    },
    Error {
        id: Option<serde_json::Value>,
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductUpdateReport {
    pub message: String,
    pub results: Vec<PublishResult>,
}
