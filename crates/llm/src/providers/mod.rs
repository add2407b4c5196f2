pub mod anthropic;
pub mod bedrock;

use std::sync::Arc;

use vpcwatch_core::config::LlmConfig;

use crate::provider::{LlmError, LlmProvider};

/// Create the configured LLM provider.
///
/// Returns `Ok(None)` when no model id is configured, which disables
/// enrichment.
pub fn create_provider(
    llm_config: &LlmConfig,
    sdk_config: &aws_types::SdkConfig,
) -> Result<Option<Arc<dyn LlmProvider>>, LlmError> {
    let Some(model) = llm_config.model_id.clone() else {
        return Ok(None);
    };

    match llm_config.provider.as_str() {
        "bedrock" => Ok(Some(Arc::new(bedrock::BedrockProvider::new(sdk_config, model)))),
        "anthropic" | "claude" => {
            let api_key = llm_config
                .anthropic_api_key
                .as_ref()
                .ok_or_else(|| LlmError::NotConfigured("ANTHROPIC_API_KEY not set".into()))?;
            Ok(Some(Arc::new(anthropic::AnthropicProvider::new(
                api_key.clone(),
                model,
            ))))
        }
        other => Err(LlmError::NotConfigured(format!(
            "unknown LLM provider: '{}'",
            other
        ))),
    }
}
