//! The query-engine boundary: submit, status, results, cancel.
//!
//! [`crate::AthenaEngine`] is the production implementation. Tests drive the
//! runner through scripted implementations of [`QueryEngine`].

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use vpcwatch_core::ConfigError;

use crate::result::{QueryMetadata, RawResultSet};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors that can occur during Athena operations.
#[derive(Debug, thiserror::Error)]
pub enum AthenaError {
    /// A required setting (database, output location) is missing.
    #[error("Athena configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The query execution failed on the Athena side.
    #[error("Query {query_id} failed: {reason}")]
    QueryFailed { query_id: String, reason: String },

    /// The query was cancelled (either by the user or by Athena).
    #[error("Query {query_id} was cancelled: {reason}")]
    QueryCancelled { query_id: String, reason: String },

    /// The query exceeded the configured timeout.
    #[error("Query {query_id} timed out after {seconds}s")]
    QueryTimeout { query_id: String, seconds: u64 },

    /// An AWS SDK error (stringified).
    #[error("AWS SDK error: {0}")]
    AwsSdk(String),

    /// Failed to parse Athena result data.
    #[error("Parse error: {0}")]
    ParseError(String),
}

// ---------------------------------------------------------------------------
// Execution handle and status
// ---------------------------------------------------------------------------

/// Opaque Athena query execution ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExecutionId(String);

impl ExecutionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QueryState {
    Queued,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl QueryState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            QueryState::Succeeded | QueryState::Failed | QueryState::Cancelled
        )
    }
}

/// One status read of a query execution.
#[derive(Debug, Clone)]
pub struct QueryStatus {
    pub state: QueryState,
    /// Engine-provided reason for FAILED / CANCELLED.
    pub reason: Option<String>,
    pub metadata: QueryMetadata,
}

// ---------------------------------------------------------------------------
// Engine trait
// ---------------------------------------------------------------------------

#[async_trait]
pub trait QueryEngine: Send + Sync {
    /// Start a query against the configured database and output location.
    async fn submit(&self, sql: &str) -> Result<ExecutionId, AthenaError>;

    async fn status(&self, id: &ExecutionId) -> Result<QueryStatus, AthenaError>;

    /// Fetch the full result set. Row 0 is the header row.
    async fn results(&self, id: &ExecutionId) -> Result<RawResultSet, AthenaError>;

    async fn cancel(&self, id: &ExecutionId) -> Result<(), AthenaError>;

    /// Cheap connectivity / permission check.
    async fn ping(&self) -> Result<(), AthenaError>;
}
