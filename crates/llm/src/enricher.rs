use tracing::warn;
use vpcwatch_core::Anomaly;

use crate::fallback::fallback_narrative;
use crate::narrative::NarrativeGenerator;
use crate::provider::LlmError;

/// Attaches a human-readable narrative to each anomaly.
///
/// With no generator configured every anomaly gets the canned narrative.
/// Model failures never propagate: the canned narrative is used and a note
/// naming the failure is appended.
pub struct Enricher {
    generator: Option<NarrativeGenerator>,
}

impl Enricher {
    pub fn new(generator: NarrativeGenerator) -> Self {
        Self { generator: Some(generator) }
    }

    pub fn disabled() -> Self {
        Self { generator: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.generator.is_some()
    }

    pub fn provider_name(&self) -> Option<&str> {
        self.generator.as_ref().map(NarrativeGenerator::provider_name)
    }

    /// Check that the configured model answers. `None` when enrichment is off.
    pub async fn canary(&self) -> Option<Result<String, LlmError>> {
        match &self.generator {
            Some(generator) => Some(generator.canary().await),
            None => None,
        }
    }

    pub async fn narrate(&self, anomaly: &Anomaly) -> String {
        let Some(generator) = &self.generator else {
            return fallback_narrative(anomaly);
        };

        match generator.explain(anomaly).await {
            Ok(text) => text,
            Err(e) => {
                warn!(
                    kind = %anomaly.kind(),
                    provider = generator.provider_name(),
                    error = %e,
                    "Narrative generation failed, using fallback"
                );
                format!(
                    "{}\n\nNote: AI analysis unavailable ({e})",
                    fallback_narrative(anomaly)
                )
            }
        }
    }

    /// Narrate and attach in place.
    pub async fn enrich(&self, anomaly: &mut Anomaly) {
        let text = self.narrate(anomaly).await;
        anomaly.attach_narrative(text);
    }
}
