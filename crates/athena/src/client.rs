//! AWS Athena implementation of [`QueryEngine`].
//!
//! Wraps the AWS SDK Athena client. Submission targets the configured
//! database, workgroup and S3 output location; result fetching follows
//! `NextToken` so large result sets arrive complete.

use async_trait::async_trait;
use aws_sdk_athena::error::DisplayErrorContext;
use aws_sdk_athena::types::{QueryExecutionContext, QueryExecutionState, ResultConfiguration};
use tracing::{debug, info};
use vpcwatch_core::config::AthenaConfig;

use crate::engine::{AthenaError, ExecutionId, QueryEngine, QueryState, QueryStatus};
use crate::result::{QueryMetadata, RawResultSet};

/// Client for executing queries against AWS Athena.
pub struct AthenaEngine {
    config: AthenaConfig,
    athena_client: aws_sdk_athena::Client,
}

impl AthenaEngine {
    /// Build the engine from an already-loaded AWS SDK config.
    pub fn new(sdk_config: &aws_types::SdkConfig, config: AthenaConfig) -> Self {
        let athena_client = aws_sdk_athena::Client::new(sdk_config);

        info!(
            database = config.database.as_deref().unwrap_or("(unset)"),
            workgroup = %config.workgroup,
            "AthenaEngine initialised"
        );

        Self {
            config,
            athena_client,
        }
    }

    /// Extract [`QueryMetadata`] from an SDK [`QueryExecution`].
    ///
    /// [`QueryExecution`]: aws_sdk_athena::types::QueryExecution
    fn extract_metadata(
        query_id: &str,
        qe: &aws_sdk_athena::types::QueryExecution,
    ) -> QueryMetadata {
        let stats = qe.statistics();

        QueryMetadata {
            query_id: query_id.to_string(),
            bytes_scanned: stats
                .and_then(|s| s.data_scanned_in_bytes())
                .unwrap_or(0) as u64,
            execution_time_ms: stats
                .and_then(|s| s.engine_execution_time_in_millis())
                .unwrap_or(0) as u64,
            output_location: qe
                .result_configuration()
                .and_then(|rc| rc.output_location())
                .map(|s| s.to_string()),
        }
    }
}

fn sdk_error<E: std::error::Error>(err: E) -> AthenaError {
    AthenaError::AwsSdk(DisplayErrorContext(err).to_string())
}

impl From<&QueryExecutionState> for QueryState {
    fn from(state: &QueryExecutionState) -> Self {
        match state {
            QueryExecutionState::Queued => QueryState::Queued,
            QueryExecutionState::Succeeded => QueryState::Succeeded,
            QueryExecutionState::Failed => QueryState::Failed,
            QueryExecutionState::Cancelled => QueryState::Cancelled,
            // Running | unknown future variant
            _ => QueryState::Running,
        }
    }
}

#[async_trait]
impl QueryEngine for AthenaEngine {
    async fn submit(&self, sql: &str) -> Result<ExecutionId, AthenaError> {
        debug!(sql = %sql, "Starting Athena query");

        let start_resp = self
            .athena_client
            .start_query_execution()
            .query_string(sql)
            .query_execution_context(
                QueryExecutionContext::builder()
                    .database(self.config.database()?)
                    .build(),
            )
            .result_configuration(
                ResultConfiguration::builder()
                    .output_location(self.config.output_location()?)
                    .build(),
            )
            .work_group(&self.config.workgroup)
            .send()
            .await
            .map_err(sdk_error)?;

        let query_id = start_resp
            .query_execution_id()
            .ok_or_else(|| AthenaError::AwsSdk("No query execution ID returned".into()))?;

        Ok(ExecutionId::new(query_id))
    }

    async fn status(&self, id: &ExecutionId) -> Result<QueryStatus, AthenaError> {
        let resp = self
            .athena_client
            .get_query_execution()
            .query_execution_id(id.as_str())
            .send()
            .await
            .map_err(sdk_error)?;

        let qe = resp
            .query_execution()
            .ok_or_else(|| AthenaError::AwsSdk("No query execution in response".into()))?;

        let status = qe.status();
        let state = status
            .and_then(|s| s.state())
            .map(QueryState::from)
            .unwrap_or(QueryState::Queued);

        Ok(QueryStatus {
            state,
            reason: status
                .and_then(|s| s.state_change_reason())
                .map(str::to_string),
            metadata: Self::extract_metadata(id.as_str(), qe),
        })
    }

    async fn results(&self, id: &ExecutionId) -> Result<RawResultSet, AthenaError> {
        let mut rows: Vec<Vec<Option<String>>> = Vec::new();
        let mut next_token: Option<String> = None;
        let mut pages = 0u32;

        loop {
            let output = self
                .athena_client
                .get_query_results()
                .query_execution_id(id.as_str())
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(sdk_error)?;
            pages += 1;

            let result_set = output
                .result_set()
                .ok_or_else(|| AthenaError::ParseError("No ResultSet in response".into()))?;

            rows.extend(result_set.rows().iter().map(|row| {
                row.data()
                    .iter()
                    .map(|datum| datum.var_char_value().map(str::to_string))
                    .collect::<Vec<_>>()
            }));

            match output.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        debug!(query_id = %id, rows = rows.len(), pages, "Fetched Athena results");
        Ok(RawResultSet::new(rows))
    }

    async fn cancel(&self, id: &ExecutionId) -> Result<(), AthenaError> {
        info!(query_id = %id, "Cancelling query");

        self.athena_client
            .stop_query_execution()
            .query_execution_id(id.as_str())
            .send()
            .await
            .map_err(sdk_error)?;

        Ok(())
    }

    async fn ping(&self) -> Result<(), AthenaError> {
        self.athena_client
            .list_work_groups()
            .max_results(1)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }
}
