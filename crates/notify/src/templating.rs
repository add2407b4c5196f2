//! Minijinja template rendering for notification bodies.
//!
//! The three message kinds (alert, status, error) are registered as named
//! templates on a fresh [`minijinja::Environment`] per render call.

use crate::traits::NotifyError;

const ALERT_TEMPLATE: &str = "\
{{ emoji }} SECURITY ALERT - VPC FLOW LOGS {{ emoji }}
================================================

Timestamp: {{ timestamp }}
Anomaly type: {{ kind }}
Severity: {{ severity }}
Instances detected: {{ count }}

ANALYSIS:
{{ narrative }}

DETECTED DATA:
{{ data }}

---
System: VPC Flow Logs anomaly detection
Region: {{ region }}
";

const STATUS_TEMPLATE: &str = "\
STATUS: monitoring system operational

Timestamp: {{ timestamp }}
Analysis completed with no anomalies detected.
VPC Flow Logs monitored correctly.
{% if enrichment %}Narrative generation: {{ enrichment }}
{% endif %}Alerting active.

The system is running normally and monitoring network traffic.
";

const ERROR_TEMPLATE: &str = "\
ERROR IN THE DETECTION SYSTEM
===================================

Timestamp: {{ timestamp }}
Request ID: {{ request_id }}
Error: {{ error }}

For debugging:
- Request ID: {{ request_id }}
- Database: {% if database %}{{ database }}{% else %}(unset){% endif %}
- Table: {% if table %}{{ table }}{% else %}(unset){% endif %}

The system requires immediate attention.

Components to verify:
1. IAM permissions of the function
2. Athena connectivity
3. Text-generation model access
4. SNS configuration
";

/// Context for a single anomaly alert.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AlertContext {
    pub emoji: String,
    pub timestamp: String,
    pub kind: String,
    pub severity: String,
    pub count: usize,
    pub narrative: String,
    /// Rows as pretty-printed JSON.
    pub data: String,
    pub region: String,
}

/// Context for the periodic "all clear" notice.
#[derive(Debug, Clone, serde::Serialize)]
pub struct StatusContext {
    pub timestamp: String,
    /// Provider name when narratives are enabled.
    pub enrichment: Option<String>,
}

/// Context for a pipeline failure notice.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ErrorContext {
    pub timestamp: String,
    pub request_id: String,
    pub error: String,
    pub database: Option<String>,
    pub table: Option<String>,
}

/// Renders the built-in notification templates.
#[derive(Debug, Default)]
pub struct TemplateRenderer {
    _private: (),
}

impl TemplateRenderer {
    pub fn new() -> Self {
        Self { _private: () }
    }

    fn build_env() -> Result<minijinja::Environment<'static>, NotifyError> {
        // Template names carry no extension, so nothing is auto-escaped.
        let mut env = minijinja::Environment::new();
        env.set_keep_trailing_newline(true);

        for (name, source) in [
            ("alert", ALERT_TEMPLATE),
            ("status", STATUS_TEMPLATE),
            ("error", ERROR_TEMPLATE),
        ] {
            env.add_template(name, source)
                .map_err(|e| NotifyError::Template(e.to_string()))?;
        }
        Ok(env)
    }

    fn render<S: serde::Serialize>(&self, name: &str, ctx: &S) -> Result<String, NotifyError> {
        let env = Self::build_env()?;
        env.get_template(name)
            .and_then(|t| t.render(ctx))
            .map_err(|e| NotifyError::Template(e.to_string()))
    }

    pub fn render_alert(&self, ctx: &AlertContext) -> Result<String, NotifyError> {
        self.render("alert", ctx)
    }

    pub fn render_status(&self, ctx: &StatusContext) -> Result<String, NotifyError> {
        self.render("status", ctx)
    }

    pub fn render_error(&self, ctx: &ErrorContext) -> Result<String, NotifyError> {
        self.render("error", ctx)
    }
}
