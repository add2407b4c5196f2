//! Prompt construction and model calls for anomaly narratives.

use std::sync::Arc;

use tracing::{debug, info};
use vpcwatch_core::config::LlmConfig;
use vpcwatch_core::Anomaly;

use crate::provider::{LlmError, LlmProvider, Message};

const SYSTEM_PROMPT: &str = "You are a cybersecurity expert analysing anomalous network \
traffic found in AWS VPC Flow Logs. Be technical but clear, and structure the answer \
for a SOC / DevSecOps audience.";

const CANARY_PROMPT: &str = "Reply with the single word: ready";
const CANARY_MAX_TOKENS: u32 = 16;

/// Asks a model to explain an anomaly.
pub struct NarrativeGenerator {
    provider: Arc<dyn LlmProvider>,
    temperature: f32,
    max_tokens: u32,
    language: String,
}

impl NarrativeGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>, temperature: f32, max_tokens: u32) -> Self {
        Self {
            provider,
            temperature,
            max_tokens,
            language: "English".to_string(),
        }
    }

    pub fn from_config(provider: Arc<dyn LlmProvider>, config: &LlmConfig) -> Self {
        Self {
            language: config.language.clone(),
            ..Self::new(provider, config.temperature, config.max_tokens)
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Build the user prompt for `anomaly`.
    pub fn build_prompt(&self, anomaly: &Anomaly) -> Result<String, LlmError> {
        let data = anomaly.rows_json()?;
        Ok(format!(
            "Analyse the following detected anomaly and provide a structured analysis.

DETECTED ANOMALY:
- Type: {kind}
- Initial severity: {severity}
- Instances detected: {count}

TECHNICAL DATA:
{data}

REQUIRED ANALYSIS:
1. Technical explanation: what does this activity indicate?
2. Severity level: 1-10 with justification
3. Attack vectors: likely methods being used
4. Potential impact: risks to the infrastructure
5. Immediate actions: top 3 urgent measures
6. Prevention: long-term measures

Respond in {language}.",
            kind = anomaly.kind(),
            severity = anomaly.severity(),
            count = anomaly.instance_count(),
            language = self.language,
        ))
    }

    /// Generate a narrative. A blank reply is an error.
    pub async fn explain(&self, anomaly: &Anomaly) -> Result<String, LlmError> {
        let prompt = self.build_prompt(anomaly)?;
        debug!(kind = %anomaly.kind(), prompt_len = prompt.len(), "Requesting narrative");

        let text = self
            .provider
            .complete(
                vec![Message::system(SYSTEM_PROMPT), Message::user(prompt)],
                self.temperature,
                self.max_tokens,
            )
            .await?;

        if text.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }

        info!(
            kind = %anomaly.kind(),
            provider = self.provider.name(),
            chars = text.len(),
            "Narrative generated"
        );
        Ok(text)
    }

    /// Minimal round trip to confirm the model is reachable and answering.
    /// Returns the reply; a blank one is an error.
    pub async fn canary(&self) -> Result<String, LlmError> {
        let text = self
            .provider
            .complete(vec![Message::user(CANARY_PROMPT)], 0.0, CANARY_MAX_TOKENS)
            .await?;
        if text.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(text.trim().to_string())
    }
}
