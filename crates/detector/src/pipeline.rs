//! One detection run: detectors, enrichment, alerts.
//!
//! Detectors run sequentially in a fixed order. A detector that fails is
//! logged and counts as "no finding"; it never stops the others. Each
//! anomaly is then narrated and published, with a pacing delay between
//! consecutive alerts. A quiet run may send a throttled all-clear notice.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use vpcwatch_athena::{QueryEngine, QueryRunner};
use vpcwatch_core::{Anomaly, Clock, Config, ConfigError, DetectionQuery};
use vpcwatch_llm::Enricher;
use vpcwatch_notify::{Composer, HeartbeatGate, Notification, Notifier};

use crate::detectors::build_queries;

/// Failures that abort a whole run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// What a successful run found and sent.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Anomalies in detection order, narratives attached.
    pub anomalies: Vec<Anomaly>,
    /// Alerts the notifier accepted.
    pub alerts_published: usize,
    pub all_clear_sent: bool,
}

impl RunReport {
    pub fn anomalies_found(&self) -> usize {
        self.anomalies.len()
    }
}

pub struct Pipeline {
    config: Config,
    queries: Result<Vec<DetectionQuery>, ConfigError>,
    runner: QueryRunner,
    enricher: Enricher,
    notifier: Arc<dyn Notifier>,
    composer: Composer,
    clock: Arc<dyn Clock>,
    heartbeat: HeartbeatGate,
}

impl Pipeline {
    /// Assemble a pipeline from already-built clients.
    ///
    /// The detector set is built here, once. Invalid configuration does not
    /// fail construction; every run reports it instead.
    pub fn new(
        config: Config,
        engine: Arc<dyn QueryEngine>,
        enricher: Enricher,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        heartbeat: HeartbeatGate,
    ) -> Self {
        let queries = build_queries(&config);
        if let Err(e) = &queries {
            warn!(error = %e, "Configuration incomplete, runs will fail until it is fixed");
        }

        let runner = QueryRunner::new(engine, clock.clone(), config.athena.poll_policy())
            .cancel_on_timeout(config.athena.cancel_on_timeout);
        let composer = Composer::new(config.aws.region.clone());

        Self {
            config,
            queries,
            runner,
            enricher,
            notifier,
            composer,
            clock,
            heartbeat,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn enricher(&self) -> &Enricher {
        &self.enricher
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    pub fn engine(&self) -> &Arc<dyn QueryEngine> {
        self.runner.engine()
    }

    /// The detector set, or the configuration problem preventing it.
    pub fn queries(&self) -> Result<&[DetectionQuery], ConfigError> {
        self.queries.as_deref().map_err(Clone::clone)
    }

    pub async fn run(&self) -> Result<RunReport, PipelineError> {
        let queries = self.queries()?;
        let mut report = RunReport {
            anomalies: self.detect(queries).await,
            ..RunReport::default()
        };

        if report.anomalies.is_empty() {
            info!("No anomalies detected");
            if self.heartbeat.should_send() {
                match self.composer.all_clear(self.enricher.provider_name(), Utc::now()) {
                    Ok(notice) => report.all_clear_sent = self.publish(&notice).await,
                    Err(e) => warn!(error = %e, "Could not render all-clear notice"),
                }
            } else {
                info!("All-clear notice skipped this run");
            }
            return Ok(report);
        }

        info!(count = report.anomalies.len(), "Anomalies detected");
        let total = report.anomalies.len();
        for (i, anomaly) in report.anomalies.iter_mut().enumerate() {
            info!(
                index = i + 1,
                total,
                kind = %anomaly.kind(),
                "Processing anomaly"
            );
            self.enricher.enrich(anomaly).await;

            match self.composer.alert(anomaly, Utc::now()) {
                Ok(alert) => {
                    if self.publish(&alert).await {
                        report.alerts_published += 1;
                    }
                }
                Err(e) => warn!(kind = %anomaly.kind(), error = %e, "Could not render alert, skipping"),
            }

            if i + 1 < total {
                self.clock.sleep(self.config.pipeline.pacing()).await;
            }
        }

        Ok(report)
    }

    async fn detect(&self, queries: &[DetectionQuery]) -> Vec<Anomaly> {
        let mut anomalies = Vec::new();
        for query in queries {
            match self.runner.run(query).await {
                Ok(Some(rows)) => {
                    if let Some(anomaly) = Anomaly::from_rows(query.kind, rows) {
                        warn!(
                            detector = %query.name,
                            instances = anomaly.instance_count(),
                            severity = %anomaly.severity(),
                            "Anomaly detected"
                        );
                        anomalies.push(anomaly);
                    }
                }
                Ok(None) => info!(detector = %query.name, "No findings"),
                Err(e) => warn!(detector = %query.name, error = %e, "Detector failed, treating as no findings"),
            }
        }
        anomalies
    }

    /// Publish, logging and swallowing delivery failures.
    async fn publish(&self, notification: &Notification) -> bool {
        match self.notifier.publish(notification).await {
            Ok(message_id) => {
                info!(
                    channel = self.notifier.channel_name(),
                    message_id = %message_id,
                    subject = %notification.subject,
                    "Notification published"
                );
                true
            }
            Err(e) => {
                warn!(
                    channel = self.notifier.channel_name(),
                    error = %e,
                    subject = %notification.subject,
                    "Notification delivery failed"
                );
                false
            }
        }
    }

    /// Best-effort error notice for a run that failed.
    pub async fn report_failure(&self, request_id: &str, error: &PipelineError) {
        let athena = &self.config.athena;
        let notice = match self.composer.failure(
            request_id,
            &error.to_string(),
            athena.database.as_deref(),
            athena.table.as_deref(),
            Utc::now(),
        ) {
            Ok(notice) => notice,
            Err(e) => {
                warn!(error = %e, "Could not render error notification");
                return;
            }
        };
        self.publish(&notice).await;
    }
}
