//! vpcwatch-lambda: scheduled Lambda entry point.
//!
//! Clients are built once per cold start; each invocation runs the full
//! detection pipeline and returns the structured response.

use std::sync::Arc;

use lambda_runtime::{service_fn, LambdaEvent};
use serde_json::Value;
use tracing::info;

use vpcwatch_core::config::load_dotenv;
use vpcwatch_core::Config;
use vpcwatch_detector::{build_pipeline, handle_invocation, InvocationResponse};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_current_span(false)
        .init();

    let config = Config::from_env();
    config.log_summary();

    let pipeline = Arc::new(build_pipeline(config).await);
    info!("Lambda runtime starting");

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let pipeline = pipeline.clone();
        async move {
            let request_id = event.context.request_id.clone();
            Ok::<InvocationResponse, lambda_runtime::Error>(
                handle_invocation(&pipeline, &request_id).await,
            )
        }
    }))
    .await
    .map_err(|e| anyhow::anyhow!("lambda runtime error: {e}"))
}
