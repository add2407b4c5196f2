use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One materialized result row: column name → cell value.
///
/// Keys keep the header's column order. SQL NULL is stored as `""`.
pub type ResultRow = IndexMap<String, String>;

/// The traffic patterns the detectors look for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnomalyType {
    PortScanning,
    DDoS,
    DataExfiltration,
    UnusualProtocol,
}

impl AnomalyType {
    /// Every type, in the order the detectors run.
    pub const ALL: [AnomalyType; 4] = [
        AnomalyType::PortScanning,
        AnomalyType::DDoS,
        AnomalyType::DataExfiltration,
        AnomalyType::UnusualProtocol,
    ];

    /// Human-readable name used in subjects, prompts and logs.
    pub fn display_name(self) -> &'static str {
        match self {
            AnomalyType::PortScanning => "Port Scanning",
            AnomalyType::DDoS => "DDoS Attack",
            AnomalyType::DataExfiltration => "Data Exfiltration",
            AnomalyType::UnusualProtocol => "Unusual Protocol",
        }
    }

    /// Severity assigned before any narrative is generated.
    pub fn default_severity(self) -> Severity {
        match self {
            AnomalyType::PortScanning => Severity::High,
            AnomalyType::DDoS => Severity::Critical,
            AnomalyType::DataExfiltration => Severity::High,
            AnomalyType::UnusualProtocol => Severity::Medium,
        }
    }
}

impl fmt::Display for AnomalyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A detector hit: the rows one query returned plus an optional narrative.
///
/// Only constructible from a non-empty row set, see [`Anomaly::from_rows`].
#[derive(Debug, Clone, Serialize)]
pub struct Anomaly {
    kind: AnomalyType,
    severity: Severity,
    rows: Vec<ResultRow>,
    narrative: Option<String>,
}

impl Anomaly {
    /// Build an anomaly with the type's default severity.
    ///
    /// Returns `None` when `rows` is empty.
    pub fn from_rows(kind: AnomalyType, rows: Vec<ResultRow>) -> Option<Self> {
        if rows.is_empty() {
            return None;
        }
        Some(Self {
            kind,
            severity: kind.default_severity(),
            rows,
            narrative: None,
        })
    }

    pub fn kind(&self) -> AnomalyType {
        self.kind
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    /// Number of offending rows (always ≥ 1).
    pub fn instance_count(&self) -> usize {
        self.rows.len()
    }

    pub fn narrative(&self) -> Option<&str> {
        self.narrative.as_deref()
    }

    pub fn attach_narrative(&mut self, narrative: String) {
        self.narrative = Some(narrative);
    }

    /// Rows as indented JSON, keys in header order.
    pub fn rows_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.rows)
    }
}

/// A named detector query. The SQL is fixed once the process has started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionQuery {
    pub kind: AnomalyType,
    pub name: String,
    pub sql: String,
}

impl DetectionQuery {
    pub fn new(kind: AnomalyType, sql: String) -> Self {
        Self {
            kind,
            name: format!("{} Detection", kind.display_name()),
            sql,
        }
    }
}
