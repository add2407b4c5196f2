//! Builds the subject and body of each outgoing message.

use chrono::{DateTime, Utc};
use vpcwatch_core::{Anomaly, AnomalyType};

use crate::templating::{AlertContext, ErrorContext, StatusContext, TemplateRenderer};
use crate::traits::{Notification, NotifyError};

/// SNS rejects subjects longer than this.
pub const MAX_SUBJECT_CHARS: usize = 100;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Collapse `raw` to a single line of at most [`MAX_SUBJECT_CHARS`] characters.
pub fn sanitize_subject(raw: &str) -> String {
    let one_line: String = raw
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    let collapsed = one_line.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(MAX_SUBJECT_CHARS).collect::<String>().trim_end().to_string()
}

fn emoji(kind: AnomalyType) -> &'static str {
    match kind {
        AnomalyType::PortScanning => "🔍",
        AnomalyType::DDoS => "💥",
        AnomalyType::DataExfiltration => "📤",
        AnomalyType::UnusualProtocol => "🚨",
    }
}

/// Renders alert, status and error notifications.
#[derive(Debug)]
pub struct Composer {
    renderer: TemplateRenderer,
    region: String,
}

impl Composer {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            renderer: TemplateRenderer::new(),
            region: region.into(),
        }
    }

    pub fn alert(&self, anomaly: &Anomaly, now: DateTime<Utc>) -> Result<Notification, NotifyError> {
        let kind = anomaly.kind();
        let subject = sanitize_subject(&format!(
            "{} SECURITY ALERT: {} - Severity {}",
            emoji(kind),
            kind,
            anomaly.severity()
        ));

        let body = self.renderer.render_alert(&AlertContext {
            emoji: emoji(kind).to_string(),
            timestamp: now.format(TIMESTAMP_FORMAT).to_string(),
            kind: kind.to_string(),
            severity: anomaly.severity().to_string(),
            count: anomaly.instance_count(),
            narrative: anomaly.narrative().unwrap_or("Not available").to_string(),
            data: anomaly.rows_json()?,
            region: self.region.clone(),
        })?;

        Ok(Notification { subject, body })
    }

    /// The throttled "system healthy" notice.
    pub fn all_clear(
        &self,
        enrichment: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Notification, NotifyError> {
        let body = self.renderer.render_status(&StatusContext {
            timestamp: now.format(TIMESTAMP_FORMAT).to_string(),
            enrichment: enrichment.map(str::to_string),
        })?;

        Ok(Notification {
            subject: sanitize_subject("✅ Status OK: anomaly detection operational"),
            body,
        })
    }

    pub fn failure(
        &self,
        request_id: &str,
        error: &str,
        database: Option<&str>,
        table: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Notification, NotifyError> {
        let body = self.renderer.render_error(&ErrorContext {
            timestamp: now.format(TIMESTAMP_FORMAT).to_string(),
            request_id: request_id.to_string(),
            error: error.to_string(),
            database: database.map(str::to_string),
            table: table.map(str::to_string),
        })?;

        Ok(Notification {
            subject: sanitize_subject("❌ ERROR: anomaly detection system"),
            body,
        })
    }

    /// Operator-requested delivery test. Plain text, no template.
    pub fn test_notice(&self, now: DateTime<Utc>) -> Notification {
        Notification {
            subject: sanitize_subject("🧪 TEST: anomaly detection notification channel"),
            body: format!(
                "Test notification sent by `vpcwatch check --send-test`.\n\n\
                 Timestamp: {}\nRegion: {}\n\nNo action is required.",
                now.format(TIMESTAMP_FORMAT),
                self.region
            ),
        }
    }
}
