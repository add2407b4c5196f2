//! Invocation entry: turns a pipeline run into the function response.

use chrono::Utc;
use serde::Serialize;
use tracing::{error, info};

use crate::pipeline::Pipeline;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResponse {
    pub status_code: u16,
    pub body: ResponseBody,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomalies_found: Option<usize>,
    /// RFC 3339, UTC.
    pub timestamp: String,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrichment_enabled: Option<bool>,
}

impl InvocationResponse {
    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}

/// Run the pipeline once for `request_id`.
///
/// Never fails: any pipeline error is logged, reported through the notifier
/// and turned into a 500 response.
pub async fn handle_invocation(pipeline: &Pipeline, request_id: &str) -> InvocationResponse {
    info!(request_id, profile = pipeline.config().profile_label(), "Detection run started");

    match pipeline.run().await {
        Ok(report) => {
            info!(
                request_id,
                anomalies = report.anomalies_found(),
                alerts_published = report.alerts_published,
                all_clear_sent = report.all_clear_sent,
                "Detection run completed"
            );
            InvocationResponse {
                status_code: 200,
                body: ResponseBody {
                    message: Some("Analysis completed successfully".into()),
                    error: None,
                    anomalies_found: Some(report.anomalies_found()),
                    timestamp: Utc::now().to_rfc3339(),
                    request_id: request_id.to_string(),
                    enrichment_enabled: Some(pipeline.enricher().is_enabled()),
                },
            }
        }
        Err(e) => {
            error!(request_id, error = %e, "Detection run failed");
            pipeline.report_failure(request_id, &e).await;
            InvocationResponse {
                status_code: 500,
                body: ResponseBody {
                    message: None,
                    error: Some(e.to_string()),
                    anomalies_found: None,
                    timestamp: Utc::now().to_rfc3339(),
                    request_id: request_id.to_string(),
                    enrichment_enabled: None,
                },
            }
        }
    }
}
