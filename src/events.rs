use anyhow::{Context, Result};
use log::{error, info, warn};
use std::time::Duration;

use crate::model::{EventEnvelope, ProductMessage, ProductUpdateReport, PublishResult};

pub const DEFAULT_PRODUCT_TOPIC: &str = "product-updates";

/// Fire-and-forget notification channel
#[async_trait::async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, topic: &str, payload: serde_json::Value) -> Result<()>;
}

/// Publishes envelopes by POSTing them to an HTTP event-bus endpoint
#[derive(Debug, Clone)]
pub struct HttpPublisher {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpPublisher {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build event bus client")?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl EventPublisher for HttpPublisher {
    async fn publish(&self, topic: &str, payload: serde_json::Value) -> Result<()> {
        let envelope = EventEnvelope::new(topic, payload);
        self.client
            .post(&self.endpoint)
            .json(&envelope)
            .send()
            .await
            .with_context(|| format!("Failed to reach event bus at {}", self.endpoint))?
            .error_for_status()
            .context("Event bus rejected message")?;
        info!("published event {} on {}", envelope.event_id, topic);
        Ok(())
    }
}

/// Writes events to the log; used when no event bus is configured
#[derive(Debug, Clone, Default)]
pub struct LogPublisher;

#[async_trait::async_trait]
impl EventPublisher for LogPublisher {
    async fn publish(&self, topic: &str, payload: serde_json::Value) -> Result<()> {
        let envelope = EventEnvelope::new(topic, payload);
        info!("event on {}: {}", topic, serde_json::to_string(&envelope)?);
        Ok(())
    }
}

/// Publish without letting a failure escape. Returns whether delivery succeeded.
pub async fn publish_best_effort(
    publisher: &dyn EventPublisher,
    topic: &str,
    payload: serde_json::Value,
) -> bool {
    match publisher.publish(topic, payload).await {
        Ok(()) => true,
        Err(e) => {
            warn!("failed to publish event on {}: {:#}", topic, e);
            false
        }
    }
}

/// Publish one `update_product` message per product, in order.
///
/// A failed item is recorded in the report and the rest of the batch
/// still goes out.
pub async fn publish_product_updates(
    publisher: &dyn EventPublisher,
    topic: &str,
    products: Vec<serde_json::Map<String, serde_json::Value>>,
) -> ProductUpdateReport {
    let mut results = Vec::with_capacity(products.len());

    for product in products {
        let id = product.get("id").cloned();
        let label = id.as_ref().map(|v| v.to_string()).unwrap_or_default();
        info!("sending product update {} on {}", label, topic);

        let outcome = match serde_json::to_value(ProductMessage::UpdateProduct(product)) {
            Ok(message) => publisher.publish(topic, message).await,
            Err(e) => Err(e.into()),
        };
        results.push(match outcome {
            Ok(()) => PublishResult::Success { id },
            Err(e) => {
                error!("failed to send product update {}: {:#}", label, e);
                PublishResult::Error {
                    id,
                    error: format!("{:#}", e),
                }
            }
        });
    }

    ProductUpdateReport {
        message: format!("{} products processed.", results.len()),
        results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;

    struct FailingPublisher;

    #[async_trait::async_trait]
    impl EventPublisher for FailingPublisher {
        async fn publish(&self, _topic: &str, _payload: serde_json::Value) -> Result<()> {
            anyhow::bail!("bus down")
        }
    }

    #[tokio::test]
    async fn test_best_effort_swallows_failure() {
        let delivered =
            publish_best_effort(&FailingPublisher, "order.created", serde_json::json!({})).await;
        assert!(!delivered);
    }

    #[tokio::test]
    async fn test_log_publisher_succeeds() {
        let payload = serde_json::json!({ "id": "o1", "item_id": "p1" });
        assert!(publish_best_effort(&LogPublisher, "order.created", payload).await);
    }

    /// Rejects products whose id is listed, records the rest
    struct SelectivePublisher {
        reject: Vec<&'static str>,
        sent: Mutex<Vec<(String, serde_json::Value)>>,
    }

    #[async_trait::async_trait]
    impl EventPublisher for SelectivePublisher {
        async fn publish(&self, topic: &str, payload: serde_json::Value) -> Result<()> {
            let id = payload["payload"]["id"].as_str().unwrap_or_default();
            if self.reject.iter().any(|r| *r == id) {
                anyhow::bail!("broker refused {}", id);
            }
            self.sent.lock().push((topic.to_string(), payload));
            Ok(())
        }
    }

    fn products(value: serde_json::Value) -> Vec<serde_json::Map<String, serde_json::Value>> {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_product_batch_reports_each_item() {
        let publisher = SelectivePublisher {
            reject: vec!["p2"],
            sent: Mutex::new(Vec::new()),
        };
        let batch = products(json!([
            { "id": "p1", "name": "Widget" },
            { "id": "p2", "name": "Gadget" },
            { "id": "p3", "price": 3.5 },
        ]));

        let report = publish_product_updates(&publisher, DEFAULT_PRODUCT_TOPIC, batch).await;

        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!({
                "message": "3 products processed.",
                "results": [
                    { "status": "success", "id": "p1" },
                    { "status": "error", "id": "p2", "error": "broker refused p2" },
                    { "status": "success", "id": "p3" },
                ]
            })
        );

        // The failure in the middle did not stop the third item
        let sent = publisher.sent.lock();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].0, "product-updates");
        assert_eq!(
            sent[1].1,
            json!({ "type": "update_product", "payload": { "id": "p3", "price": 3.5 } })
        );
    }

    #[tokio::test]
    async fn test_product_batch_without_ids_or_items() {
        let report = publish_product_updates(
            &FailingPublisher,
            DEFAULT_PRODUCT_TOPIC,
            products(json!([{ "name": "nameless" }])),
        )
        .await;
        assert_eq!(report.message, "1 products processed.");
        assert_eq!(
            report.results,
            vec![PublishResult::Error {
                id: None,
                error: "bus down".to_string()
            }]
        );

        let report = publish_product_updates(&LogPublisher, DEFAULT_PRODUCT_TOPIC, Vec::new()).await;
        assert_eq!(report.message, "0 products processed.");
        assert!(report.results.is_empty());
    }

    #[tokio::test]
    async fn test_http_publisher_unreachable_endpoint() {
        let publisher =
            HttpPublisher::new("http://127.0.0.1:9/events", Duration::from_millis(500)).unwrap();
        let result = publisher
            .publish("order.created", serde_json::json!({ "id": "o1" }))
            .await;
        assert!(result.is_err());
    }
}
