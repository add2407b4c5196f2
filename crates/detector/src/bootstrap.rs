//! Process-start wiring: AWS config, clients, pipeline.

use std::sync::Arc;

use aws_config::BehaviorVersion;
use aws_types::region::Region;
use tracing::{info, warn};
use vpcwatch_athena::AthenaEngine;
use vpcwatch_core::config::AwsConfig;
use vpcwatch_core::{Config, TokioClock};
use vpcwatch_llm::{create_provider, Enricher, NarrativeGenerator};
use vpcwatch_notify::{HeartbeatGate, SnsNotifier};

use crate::pipeline::Pipeline;

/// Load the shared AWS SDK config for the configured region and endpoint.
pub async fn load_sdk_config(aws: &AwsConfig) -> aws_types::SdkConfig {
    let mut loader =
        aws_config::defaults(BehaviorVersion::latest()).region(Region::new(aws.region.clone()));
    if let Some(endpoint) = &aws.endpoint_url {
        loader = loader.endpoint_url(endpoint);
    }
    loader.load().await
}

/// Build the enricher. A provider that cannot be created disables
/// narratives rather than failing the process.
pub fn build_enricher(config: &Config, sdk_config: &aws_types::SdkConfig) -> Enricher {
    match create_provider(&config.llm, sdk_config) {
        Ok(Some(provider)) => {
            info!(provider = provider.name(), "Narrative generation enabled");
            Enricher::new(NarrativeGenerator::from_config(provider, &config.llm))
        }
        Ok(None) => {
            info!("No model configured, using template narratives");
            Enricher::disabled()
        }
        Err(e) => {
            warn!(error = %e, "LLM provider unavailable, using template narratives");
            Enricher::disabled()
        }
    }
}

/// Build every client once and assemble the production pipeline.
pub async fn build_pipeline(config: Config) -> Pipeline {
    let sdk_config = load_sdk_config(&config.aws).await;

    let engine = Arc::new(AthenaEngine::new(&sdk_config, config.athena.clone()));
    let notifier = Arc::new(SnsNotifier::new(&sdk_config, config.notify.topic_arn.clone()));
    let enricher = build_enricher(&config, &sdk_config);
    let heartbeat = HeartbeatGate::new(config.pipeline.all_clear_odds);

    Pipeline::new(
        config,
        engine,
        enricher,
        notifier,
        Arc::new(TokioClock::new()),
        heartbeat,
    )
}
