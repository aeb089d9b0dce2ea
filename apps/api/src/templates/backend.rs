use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::templates::model::SavePayload;
use crate::templates::session::TemplateBackend;
use crate::webhook_client::{WebhookClient, WebhookError};

#[async_trait]
impl TemplateBackend for WebhookClient {
    async fn fetch_templates(&self) -> Result<Value, WebhookError> {
        let url = self.endpoints().get_templates.clone();
        self.post_json(&url, &json!({})).await?.json()
    }

    /// Any 2xx counts as saved; the engine does not always answer with JSON.
    async fn save_templates(&self, batch: &[SavePayload]) -> Result<(), WebhookError> {
        let url = self.endpoints().save_templates.clone();
        let response = self.post_json(&url, batch).await?;
        match response.json_lenient() {
            Some(body) => debug!("Save webhook acknowledged: {body}"),
            None => debug!("Save webhook returned {} without a JSON body", response.status),
        }
        Ok(())
    }

    async fn trigger_generation(&self) -> Result<(), WebhookError> {
        let url = self.endpoints().generate_templates.clone();
        let response = self
            .post_json(&url, &json!({ "action": "generate" }))
            .await?;
        debug!("Generate webhook responded: {:?}", response.json_lenient());
        Ok(())
    }
}
