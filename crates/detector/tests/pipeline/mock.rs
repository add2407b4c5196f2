//! Hand-written test doubles for the pipeline's collaborators.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use vpcwatch_athena::{
    AthenaError, ExecutionId, QueryEngine, QueryMetadata, QueryState, QueryStatus, RawResultSet,
};
use vpcwatch_core::config::{
    AthenaConfig, AwsConfig, LlmConfig, NotifyConfig, PipelineConfig,
};
use vpcwatch_core::{Config, VirtualClock};
use vpcwatch_detector::Pipeline;
use vpcwatch_llm::{Enricher, LlmError, LlmProvider, Message, NarrativeGenerator};
use vpcwatch_notify::{HeartbeatGate, Notification, Notifier, NotifyError};

/// What one detector submission does.
#[derive(Clone)]
pub enum Outcome {
    Rows(RawResultSet),
    SubmitError(String),
    Fails(String),
}

/// Answers detector submissions in order from a script. Unscripted
/// submissions come back header-only.
#[derive(Default)]
pub struct DetectorEngine {
    script: Mutex<VecDeque<Outcome>>,
    executions: Mutex<HashMap<String, Outcome>>,
    pub submitted: Mutex<Vec<String>>,
}

impl DetectorEngine {
    pub fn scripted(outcomes: Vec<Outcome>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(outcomes.into()),
            ..Self::default()
        })
    }

    pub fn submissions(&self) -> usize {
        self.submitted.lock().unwrap().len()
    }
}

#[async_trait]
impl QueryEngine for DetectorEngine {
    async fn submit(&self, sql: &str) -> Result<ExecutionId, AthenaError> {
        let mut submitted = self.submitted.lock().unwrap();
        submitted.push(sql.to_string());
        let outcome = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Outcome::Rows(header_only()));

        if let Outcome::SubmitError(reason) = &outcome {
            return Err(AthenaError::AwsSdk(reason.clone()));
        }
        let id = format!("exec-{}", submitted.len());
        self.executions.lock().unwrap().insert(id.clone(), outcome);
        Ok(ExecutionId::new(id))
    }

    async fn status(&self, id: &ExecutionId) -> Result<QueryStatus, AthenaError> {
        let (state, reason) = match self.executions.lock().unwrap().get(id.as_str()) {
            Some(Outcome::Fails(reason)) => (QueryState::Failed, Some(reason.clone())),
            _ => (QueryState::Succeeded, None),
        };
        Ok(QueryStatus {
            state,
            reason,
            metadata: QueryMetadata {
                query_id: id.to_string(),
                ..Default::default()
            },
        })
    }

    async fn results(&self, id: &ExecutionId) -> Result<RawResultSet, AthenaError> {
        match self.executions.lock().unwrap().get(id.as_str()) {
            Some(Outcome::Rows(raw)) => Ok(raw.clone()),
            _ => Err(AthenaError::ParseError(format!("no results for {id}"))),
        }
    }

    async fn cancel(&self, _id: &ExecutionId) -> Result<(), AthenaError> {
        Ok(())
    }

    async fn ping(&self) -> Result<(), AthenaError> {
        Ok(())
    }
}

/// Records every publish; optionally fails them all.
#[derive(Default)]
pub struct RecordingNotifier {
    pub published: Mutex<Vec<Notification>>,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    pub fn subjects(&self) -> Vec<String> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .map(|n| n.subject.clone())
            .collect()
    }

    pub fn bodies(&self) -> Vec<String> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .map(|n| n.body.clone())
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn publish(&self, notification: &Notification) -> Result<String, NotifyError> {
        self.published.lock().unwrap().push(notification.clone());
        if self.fail {
            return Err(NotifyError::Sns("AuthorizationError".into()));
        }
        Ok(format!("msg-{}", self.published.lock().unwrap().len()))
    }

    async fn check(&self) -> Result<(), NotifyError> {
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "recording"
    }
}

/// Model that always reports throttling.
pub struct ThrottledProvider;

#[async_trait]
impl LlmProvider for ThrottledProvider {
    async fn complete(&self, _: Vec<Message>, _: f32, _: u32) -> Result<String, LlmError> {
        Err(LlmError::ApiError {
            status: 429,
            body: "ThrottlingException".into(),
        })
    }

    fn name(&self) -> &str {
        "throttled"
    }
}

pub fn header_only() -> RawResultSet {
    RawResultSet::new(vec![vec![Some("srcaddr".to_string())]])
}

/// A header plus `n` data rows.
pub fn rows(header: &[&str], n: usize) -> RawResultSet {
    let mut all = vec![header.iter().map(|h| Some(h.to_string())).collect::<Vec<_>>()];
    for i in 0..n {
        all.push(
            header
                .iter()
                .enumerate()
                .map(|(col, _)| Some(format!("v{i}-{col}")))
                .collect(),
        );
    }
    RawResultSet::new(all)
}

pub fn test_config() -> Config {
    Config {
        profile: String::new(),
        aws: AwsConfig {
            region: "us-east-1".into(),
            endpoint_url: None,
        },
        athena: AthenaConfig {
            database: Some("vpc_flow_logs_db".into()),
            table: Some("vpc_flow_logs".into()),
            output_location: Some("s3://athena-results/".into()),
            workgroup: "primary".into(),
            timeout_seconds: 300,
            poll_interval_seconds: 5,
            cancel_on_timeout: true,
        },
        llm: LlmConfig {
            provider: "bedrock".into(),
            model_id: None,
            anthropic_api_key: None,
            temperature: 0.1,
            max_tokens: 1500,
            language: "English".into(),
        },
        notify: NotifyConfig {
            topic_arn: Some("arn:aws:sns:us-east-1:123456789012:alerts".into()),
        },
        pipeline: PipelineConfig::default(),
    }
}

pub struct Harness {
    pub pipeline: Pipeline,
    pub engine: Arc<DetectorEngine>,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: Arc<VirtualClock>,
}

pub fn harness(config: Config, outcomes: Vec<Outcome>) -> Harness {
    harness_with(config, outcomes, Enricher::disabled(), Arc::new(RecordingNotifier::default()), 0)
}

pub fn harness_with(
    config: Config,
    outcomes: Vec<Outcome>,
    enricher: Enricher,
    notifier: Arc<RecordingNotifier>,
    all_clear_odds: u32,
) -> Harness {
    let engine = DetectorEngine::scripted(outcomes);
    let clock = Arc::new(VirtualClock::new());
    let pipeline = Pipeline::new(
        config,
        engine.clone(),
        enricher,
        notifier.clone(),
        clock.clone(),
        HeartbeatGate::seeded(all_clear_odds, 42),
    );
    Harness {
        pipeline,
        engine,
        notifier,
        clock,
    }
}

pub fn throttled_enricher() -> Enricher {
    Enricher::new(NarrativeGenerator::new(Arc::new(ThrottledProvider), 0.1, 1500))
}
