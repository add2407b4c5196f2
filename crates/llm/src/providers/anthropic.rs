use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::provider::{LlmError, LlmProvider, Message, Role};

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";

/// Calls the Anthropic Messages API directly over HTTPS.
pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    url: String,
}

impl AnthropicProvider {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            url: MESSAGES_URL.to_string(),
        }
    }
}

/// Build the Messages API body shared by the direct API and Bedrock.
///
/// The API takes the system prompt as a separate field, so system
/// messages are lifted out of the message list.
pub(crate) fn messages_body(messages: &[Message], temperature: f32, max_tokens: u32) -> Value {
    let system_msg = messages
        .iter()
        .find(|m| matches!(m.role, Role::System))
        .map(|m| m.content.clone());

    let api_messages: Vec<Value> = messages
        .iter()
        .filter_map(|m| {
            let role = match m.role {
                Role::User => "user",
                Role::Assistant => "assistant",
                Role::System => return None,
            };
            Some(json!({ "role": role, "content": m.content }))
        })
        .collect();

    let mut body = json!({
        "messages": api_messages,
        "temperature": temperature,
        "max_tokens": max_tokens,
    });

    if let Some(system) = system_msg {
        body["system"] = json!(system);
    }
    body
}

/// Pull `content[0].text` out of a Messages API response.
pub(crate) fn extract_text(resp: &Value) -> Result<String, LlmError> {
    let text = resp["content"][0]["text"]
        .as_str()
        .ok_or_else(|| LlmError::ParseError("missing content[0].text".into()))?;

    if text.trim().is_empty() {
        return Err(LlmError::EmptyResponse);
    }
    Ok(text.to_string())
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    async fn complete(
        &self,
        messages: Vec<Message>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        let mut body = messages_body(&messages, temperature, max_tokens);
        body["model"] = json!(self.model);

        debug!("Anthropic request to {}", self.url);

        let response = self
            .client
            .post(&self.url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError { status, body });
        }

        let resp: Value = response.json().await?;
        extract_text(&resp)
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}
