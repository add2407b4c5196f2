use std::env;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::poll::PollPolicy;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

/// Load a specific env file, e.g. one passed on the command line.
pub fn load_dotenv_from(path: &Path) -> Result<(), ConfigError> {
    dotenvy::from_path(path).map_err(|e| ConfigError::Invalid {
        key: "env file",
        reason: format!("{}: {e}", path.display()),
    })
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u32(profile: &str, key: &str, default: u32) -> u32 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    match profiled_env_opt(profile, key) {
        Some(v) => matches!(v.to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "on"),
        None => default,
    }
}

fn require<'a>(value: &'a Option<String>, key: &'static str) -> Result<&'a str, ConfigError> {
    value.as_deref().ok_or(ConfigError::Missing(key))
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub aws: AwsConfig,
    pub athena: AthenaConfig,
    pub llm: LlmConfig,
    pub notify: NotifyConfig,
    pub pipeline: PipelineConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `VPCWATCH_PROFILE`. When set (e.g. `PROD`), every
    /// key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    ///
    /// Never fails: required settings that are absent surface later through
    /// [`Config::validate`], so each invocation can report them.
    pub fn from_env() -> Self {
        let profile = env_opt("VPCWATCH_PROFILE")
            .map(|s| s.to_uppercase())
            .unwrap_or_default();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            aws: AwsConfig::from_env_profiled(p),
            athena: AthenaConfig::from_env_profiled(p),
            llm: LlmConfig::from_env_profiled(p),
            notify: NotifyConfig::from_env_profiled(p),
            pipeline: PipelineConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Check that every required setting is present and well-formed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.athena.database()?;
        validate_identifier("ATHENA_TABLE", self.athena.table()?)?;
        let output = self.athena.output_location()?;
        if !output.starts_with("s3://") {
            return Err(ConfigError::Invalid {
                key: "ATHENA_OUTPUT_LOCATION",
                reason: format!("expected an s3:// URI, got '{output}'"),
            });
        }
        self.notify.topic_arn()?;
        let anthropic = matches!(self.llm.provider.as_str(), "anthropic" | "claude");
        if anthropic && self.llm.is_enabled() && self.llm.anthropic_api_key.is_none() {
            return Err(ConfigError::Missing("ANTHROPIC_API_KEY"));
        }
        Ok(())
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  aws:       region={}", self.aws.region);
        tracing::info!(
            "  athena:    database={}, table={}, output={}, workgroup={}",
            self.athena.database.as_deref().unwrap_or("(unset)"),
            self.athena.table.as_deref().unwrap_or("(unset)"),
            self.athena.output_location.as_deref().unwrap_or("(unset)"),
            self.athena.workgroup,
        );
        tracing::info!(
            "  llm:       provider={}, model={}",
            self.llm.provider,
            self.llm.model_id.as_deref().unwrap_or("(disabled)"),
        );
        tracing::info!(
            "  notify:    topic={}",
            self.notify.topic_arn.as_deref().unwrap_or("(unset)"),
        );
    }

    /// Return a redacted view safe for printing (no secrets).
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "aws": { "region": self.aws.region },
            "athena": {
                "database": self.athena.database,
                "table": self.athena.table,
                "output_location": self.athena.output_location,
                "workgroup": self.athena.workgroup,
                "timeout_seconds": self.athena.timeout_seconds,
                "poll_interval_seconds": self.athena.poll_interval_seconds,
            },
            "llm": {
                "provider": self.llm.provider,
                "model_id": self.llm.model_id,
                "enabled": self.llm.is_enabled(),
                "anthropic_api_key": self.llm.anthropic_api_key.as_ref().map(|_| "***"),
            },
            "notify": { "topic_arn": self.notify.topic_arn },
            "pipeline": self.pipeline,
        })
    }
}

/// Table names are spliced into SQL, so only plain identifiers are accepted.
fn validate_identifier(key: &'static str, value: &str) -> Result<(), ConfigError> {
    let ok = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if ok {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            key,
            reason: format!("'{value}' is not a plain SQL identifier"),
        })
    }
}

// ── AWS ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwsConfig {
    pub region: String,
    /// Override endpoint (localstack and similar).
    pub endpoint_url: Option<String>,
}

impl AwsConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            region: profiled_env_or(p, "AWS_REGION", "us-east-1"),
            endpoint_url: profiled_env_opt(p, "AWS_ENDPOINT_URL"),
        }
    }
}

// ── Athena ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AthenaConfig {
    pub database: Option<String>,
    pub table: Option<String>,
    /// S3 URI for query results.
    pub output_location: Option<String>,
    pub workgroup: String,
    pub timeout_seconds: u32,
    pub poll_interval_seconds: u32,
    /// Issue a StopQueryExecution when a query outlives `timeout_seconds`.
    pub cancel_on_timeout: bool,
}

impl AthenaConfig {
    fn from_env_profiled(p: &str) -> Self {
        // ATHENA_RESULTS_BUCKET is accepted as a bare bucket name.
        let output_location = profiled_env_opt(p, "ATHENA_OUTPUT_LOCATION").or_else(|| {
            profiled_env_opt(p, "ATHENA_RESULTS_BUCKET").map(|bucket| format!("s3://{bucket}/"))
        });

        Self {
            database: profiled_env_opt(p, "ATHENA_DATABASE"),
            table: profiled_env_opt(p, "ATHENA_TABLE"),
            output_location,
            workgroup: profiled_env_or(p, "ATHENA_WORKGROUP", "primary"),
            timeout_seconds: profiled_env_u32(p, "ATHENA_TIMEOUT_SECONDS", 300),
            poll_interval_seconds: profiled_env_u32(p, "ATHENA_POLL_INTERVAL_SECONDS", 5).max(1),
            cancel_on_timeout: profiled_env_bool(p, "ATHENA_CANCEL_ON_TIMEOUT", true),
        }
    }

    pub fn database(&self) -> Result<&str, ConfigError> {
        require(&self.database, "ATHENA_DATABASE")
    }

    pub fn table(&self) -> Result<&str, ConfigError> {
        require(&self.table, "ATHENA_TABLE")
    }

    pub fn output_location(&self) -> Result<&str, ConfigError> {
        require(&self.output_location, "ATHENA_OUTPUT_LOCATION")
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy::new(
            Duration::from_secs(self.poll_interval_seconds as u64),
            Duration::from_secs(self.timeout_seconds as u64),
        )
    }
}

// ── LLM (Bedrock / Anthropic) ────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "bedrock" or "anthropic"
    pub provider: String,
    /// Model to invoke. Absent disables enrichment entirely.
    pub model_id: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Language the narrative should be written in.
    pub language: String,
}

impl LlmConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            provider: profiled_env_or(p, "LLM_PROVIDER", "bedrock").to_lowercase(),
            model_id: profiled_env_opt(p, "BEDROCK_MODEL_ID")
                .or_else(|| profiled_env_opt(p, "LLM_MODEL_ID")),
            anthropic_api_key: profiled_env_opt(p, "ANTHROPIC_API_KEY"),
            temperature: profiled_env_or(p, "LLM_TEMPERATURE", "0.1")
                .parse()
                .unwrap_or(0.1),
            max_tokens: profiled_env_u32(p, "LLM_MAX_TOKENS", 1500),
            language: profiled_env_or(p, "NARRATIVE_LANGUAGE", "English"),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.model_id.is_some()
    }
}

// ── Notifications ─────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    pub topic_arn: Option<String>,
}

impl NotifyConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            topic_arn: profiled_env_opt(p, "SNS_TOPIC_ARN"),
        }
    }

    pub fn topic_arn(&self) -> Result<&str, ConfigError> {
        require(&self.topic_arn, "SNS_TOPIC_ARN")
    }
}

// ── Pipeline tunables ─────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Delay between consecutive alerts in one invocation.
    pub pacing_seconds: u64,
    /// The all-clear notice goes out with probability 1/odds (0 = never).
    pub all_clear_odds: u32,
    pub detect_unusual_protocol: bool,
    pub thresholds: DetectorThresholds,
}

impl PipelineConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            pacing_seconds: profiled_env_u64(p, "ALERT_PACING_SECONDS", 3),
            all_clear_odds: profiled_env_u32(p, "ALL_CLEAR_ODDS", 12),
            detect_unusual_protocol: profiled_env_bool(p, "DETECT_UNUSUAL_PROTOCOL", true),
            thresholds: DetectorThresholds::from_env_profiled(p),
        }
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_secs(self.pacing_seconds)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            pacing_seconds: 3,
            all_clear_odds: 12,
            detect_unusual_protocol: true,
            thresholds: DetectorThresholds::default(),
        }
    }
}

/// HAVING-clause thresholds for the detector queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectorThresholds {
    pub port_scan_min_ports: u64,
    pub ddos_min_packets: u64,
    pub ddos_min_sources: u64,
    pub exfil_min_bytes: u64,
}

impl Default for DetectorThresholds {
    fn default() -> Self {
        Self {
            port_scan_min_ports: 50,
            ddos_min_packets: 100_000,
            ddos_min_sources: 100,
            exfil_min_bytes: 25_000_000,
        }
    }
}

impl DetectorThresholds {
    fn from_env_profiled(p: &str) -> Self {
        let d = Self::default();
        Self {
            port_scan_min_ports: profiled_env_u64(p, "PORT_SCAN_MIN_PORTS", d.port_scan_min_ports),
            ddos_min_packets: profiled_env_u64(p, "DDOS_MIN_PACKETS", d.ddos_min_packets),
            ddos_min_sources: profiled_env_u64(p, "DDOS_MIN_SOURCES", d.ddos_min_sources),
            exfil_min_bytes: profiled_env_u64(p, "EXFIL_MIN_BYTES", d.exfil_min_bytes),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────
