use async_trait::async_trait;
use aws_sdk_bedrockruntime::error::DisplayErrorContext;
use aws_sdk_bedrockruntime::primitives::Blob;
use serde_json::{json, Value};
use tracing::debug;

use super::anthropic::{extract_text, messages_body};
use crate::provider::{LlmError, LlmProvider, Message};

/// Bedrock's version tag for the Anthropic Messages request format.
const ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";

/// Invokes an Anthropic model hosted on Amazon Bedrock.
pub struct BedrockProvider {
    client: aws_sdk_bedrockruntime::Client,
    model_id: String,
}

impl BedrockProvider {
    pub fn new(sdk_config: &aws_types::SdkConfig, model_id: String) -> Self {
        Self {
            client: aws_sdk_bedrockruntime::Client::new(sdk_config),
            model_id,
        }
    }

    fn request_body(messages: &[Message], temperature: f32, max_tokens: u32) -> Value {
        let mut body = messages_body(messages, temperature, max_tokens);
        body["anthropic_version"] = json!(ANTHROPIC_VERSION);
        body
    }
}

#[async_trait]
impl LlmProvider for BedrockProvider {
    async fn complete(
        &self,
        messages: Vec<Message>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        let body = Self::request_body(&messages, temperature, max_tokens);
        let payload = serde_json::to_vec(&body)?;

        debug!(model_id = %self.model_id, bytes = payload.len(), "Bedrock invoke_model");

        let output = self
            .client
            .invoke_model()
            .model_id(&self.model_id)
            .content_type("application/json")
            .accept("application/json")
            .body(Blob::new(payload))
            .send()
            .await
            .map_err(|e| LlmError::AwsSdk(DisplayErrorContext(e).to_string()))?;

        let resp: Value = serde_json::from_slice(output.body().as_ref())
            .map_err(|e| LlmError::ParseError(e.to_string()))?;
        extract_text(&resp)
    }

    fn name(&self) -> &str {
        "bedrock"
    }
}
