//! Scripted [`QueryEngine`] for runner tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use vpcwatch_athena::{
    AthenaError, ExecutionId, QueryEngine, QueryMetadata, QueryState, QueryStatus, RawResultSet,
};

pub struct ScriptedEngine {
    pub submit_error: Option<String>,
    /// States returned by successive `status` calls; the last one repeats.
    pub states: Mutex<VecDeque<(QueryState, Option<String>)>>,
    pub result: RawResultSet,
    pub status_calls: Mutex<u32>,
    pub cancelled: Mutex<Vec<ExecutionId>>,
}

impl ScriptedEngine {
    pub fn new(states: Vec<QueryState>, result: RawResultSet) -> Self {
        Self {
            submit_error: None,
            states: Mutex::new(states.into_iter().map(|s| (s, None)).collect()),
            result,
            status_calls: Mutex::new(0),
            cancelled: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(state: QueryState, reason: &str) -> Self {
        let engine = Self::new(Vec::new(), RawResultSet::default());
        engine
            .states
            .lock()
            .unwrap()
            .push_back((state, Some(reason.to_string())));
        engine
    }

    pub fn status_calls(&self) -> u32 {
        *self.status_calls.lock().unwrap()
    }
}

#[async_trait]
impl QueryEngine for ScriptedEngine {
    async fn submit(&self, _sql: &str) -> Result<ExecutionId, AthenaError> {
        match &self.submit_error {
            Some(e) => Err(AthenaError::AwsSdk(e.clone())),
            None => Ok(ExecutionId::new("exec-1")),
        }
    }

    async fn status(&self, id: &ExecutionId) -> Result<QueryStatus, AthenaError> {
        *self.status_calls.lock().unwrap() += 1;
        let mut states = self.states.lock().unwrap();
        let (state, reason) = if states.len() > 1 {
            states.pop_front().unwrap()
        } else {
            states.front().cloned().unwrap_or((QueryState::Running, None))
        };
        Ok(QueryStatus {
            state,
            reason,
            metadata: QueryMetadata {
                query_id: id.to_string(),
                bytes_scanned: 1024,
                ..Default::default()
            },
        })
    }

    async fn results(&self, _id: &ExecutionId) -> Result<RawResultSet, AthenaError> {
        Ok(self.result.clone())
    }

    async fn cancel(&self, id: &ExecutionId) -> Result<(), AthenaError> {
        self.cancelled.lock().unwrap().push(id.clone());
        Ok(())
    }

    async fn ping(&self) -> Result<(), AthenaError> {
        Ok(())
    }
}

pub fn cells(values: &[Option<&str>]) -> Vec<Option<String>> {
    values.iter().map(|v| v.map(str::to_string)).collect()
}
