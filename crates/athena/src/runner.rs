//! Runs one detector query end to end: submit, wait, materialize.

use std::sync::Arc;

use tracing::{info, warn};
use vpcwatch_core::{
    poll_until, Clock, DetectionQuery, PollError, PollPolicy, PollState, ResultRow,
};

use crate::engine::{AthenaError, ExecutionId, QueryEngine, QueryState, QueryStatus};
use crate::result::materialize;

pub struct QueryRunner {
    engine: Arc<dyn QueryEngine>,
    clock: Arc<dyn Clock>,
    policy: PollPolicy,
    cancel_on_timeout: bool,
}

impl QueryRunner {
    pub fn new(engine: Arc<dyn QueryEngine>, clock: Arc<dyn Clock>, policy: PollPolicy) -> Self {
        Self {
            engine,
            clock,
            policy,
            cancel_on_timeout: true,
        }
    }

    /// Whether a timed-out query gets a best-effort StopQueryExecution.
    pub fn cancel_on_timeout(mut self, enabled: bool) -> Self {
        self.cancel_on_timeout = enabled;
        self
    }

    pub fn engine(&self) -> &Arc<dyn QueryEngine> {
        &self.engine
    }

    /// Execute `query` and return its rows.
    ///
    /// `Ok(None)` means the query succeeded with nothing to report.
    pub async fn run(&self, query: &DetectionQuery) -> Result<Option<Vec<ResultRow>>, AthenaError> {
        info!(detector = %query.name, "Submitting detection query");

        let id = self.engine.submit(&query.sql).await?;
        info!(detector = %query.name, query_id = %id, "Query execution started");

        let status = self.wait_for_completion(&id).await?;
        let meta = &status.metadata;
        info!(
            detector = %query.name,
            query_id = %id,
            bytes_scanned = meta.bytes_scanned,
            execution_time_ms = meta.execution_time_ms,
            cost_usd = meta.cost_estimate_usd(),
            "Query completed"
        );

        let raw = self.engine.results(&id).await?;
        info!(detector = %query.name, data_rows = raw.data_row_count(), "Results fetched");
        let rows = materialize(raw);
        info!(
            detector = %query.name,
            rows = rows.as_ref().map_or(0, Vec::len),
            "Results materialized"
        );
        Ok(rows)
    }

    /// Poll until the execution reaches a terminal state or the policy's
    /// max wait is used up.
    pub async fn wait_for_completion(&self, id: &ExecutionId) -> Result<QueryStatus, AthenaError> {
        let engine = &self.engine;

        let outcome = poll_until(self.clock.as_ref(), self.policy, || async move {
            let status = engine.status(id).await?;
            if !status.state.is_terminal() {
                return Ok(PollState::Pending);
            }
            if status.state == QueryState::Succeeded {
                return Ok(PollState::Ready(status));
            }
            let query_id = id.to_string();
            let reason = status.reason.unwrap_or_else(|| "unknown".into());
            match status.state {
                QueryState::Cancelled => Err(AthenaError::QueryCancelled { query_id, reason }),
                _ => Err(AthenaError::QueryFailed { query_id, reason }),
            }
        })
        .await;

        match outcome {
            Ok(status) => Ok(status),
            Err(PollError::Probe(e)) => Err(e),
            Err(PollError::TimedOut { elapsed, attempts }) => {
                warn!(
                    query_id = %id,
                    elapsed_secs = elapsed.as_secs(),
                    attempts,
                    "Query timed out"
                );
                if self.cancel_on_timeout {
                    // Best-effort cancel; the timeout is reported either way.
                    if let Err(e) = self.engine.cancel(id).await {
                        warn!(query_id = %id, error = %e, "Failed to cancel timed-out query");
                    }
                }
                Err(AthenaError::QueryTimeout {
                    query_id: id.to_string(),
                    seconds: self.policy.max_wait.as_secs(),
                })
            }
        }
    }
}
