use async_trait::async_trait;
use relay_core::{DeliveryChannel, DeliveryError, Target};
use reqwest::Client;
use serde_json::json;
use tracing::debug;

/// Delivery channel that forwards every message as a JSON POST to a single
/// webhook endpoint. Group and contact names all resolve to the same
/// endpoint; the original target name travels in the payload so the
/// receiving side can route.
pub struct WebhookChannel {
    client: Client,
    endpoint: String,
}

impl WebhookChannel {
    pub fn new(client: Client, endpoint: String) -> Self {
        Self { client, endpoint }
    }
}

#[async_trait]
impl DeliveryChannel for WebhookChannel {
    async fn resolve_group(&self, name: &str) -> Option<Target> {
        Some(Target(format!("group:{}", name)))
    }

    async fn resolve_contact(&self, name: &str) -> Option<Target> {
        Some(Target(format!("contact:{}", name)))
    }

    async fn send(&self, text: &str, target: &Target) -> Result<(), DeliveryError> {
        debug!(target = %target.0, "posting to webhook");
        self.client
            .post(&self.endpoint)
            .json(&json!({ "target": target.0, "content": text }))
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|err| DeliveryError(err.to_string()))?;
        Ok(())
    }
}
