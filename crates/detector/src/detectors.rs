//! Detector SQL.
//!
//! Each detector scans today's partitions of the flow-log table and uses a
//! HAVING clause to keep only offending groups. The table name and thresholds
//! are the only interpolated values; the table is validated as a plain
//! identifier before any query is built.

use vpcwatch_core::config::{DetectorThresholds, PipelineConfig};
use vpcwatch_core::{AnomalyType, Config, ConfigError, DetectionQuery};

/// Partition filter for the current UTC day.
const TODAY: &str = "year = CAST(year(current_date) AS varchar)
        AND month = LPAD(CAST(month(current_date) AS varchar), 2, '0')
        AND day = LPAD(CAST(day(current_date) AS varchar), 2, '0')";

/// IANA protocol numbers for TCP, UDP and ICMP.
const COMMON_PROTOCOLS: &str = "6, 17, 1";

/// Egress ports watched for bulk transfers.
const EXFIL_PORTS: &str = "80, 443, 21, 22";

pub fn port_scanning_sql(table: &str, t: &DetectorThresholds) -> String {
    format!(
        r#"SELECT
        srcaddr,
        COUNT(DISTINCT dstport) AS unique_ports,
        COUNT(*) AS total_attempts,
        MIN(to_iso8601(from_unixtime(start))) AS first_attempt,
        MAX(to_iso8601(from_unixtime("end"))) AS last_attempt
    FROM {table}
    WHERE
        log_status = 'OK'
        AND action = 'REJECT'
        AND {TODAY}
    GROUP BY srcaddr
    HAVING COUNT(DISTINCT dstport) > {min_ports}
    ORDER BY unique_ports DESC
    LIMIT 20"#,
        min_ports = t.port_scan_min_ports,
    )
}

pub fn ddos_sql(table: &str, t: &DetectorThresholds) -> String {
    format!(
        r#"SELECT
        dstaddr,
        SUM(packets) AS total_packets,
        SUM(bytes) AS total_bytes,
        COUNT(DISTINCT srcaddr) AS unique_sources,
        MIN(to_iso8601(from_unixtime(start))) AS attack_start,
        MAX(to_iso8601(from_unixtime("end"))) AS attack_end
    FROM {table}
    WHERE
        log_status = 'OK'
        AND action IN ('ACCEPT', 'REJECT')
        AND {TODAY}
    GROUP BY dstaddr
    HAVING
        SUM(packets) > {min_packets}
        OR COUNT(DISTINCT srcaddr) > {min_sources}
    ORDER BY total_packets DESC
    LIMIT 10"#,
        min_packets = t.ddos_min_packets,
        min_sources = t.ddos_min_sources,
    )
}

pub fn data_exfiltration_sql(table: &str, t: &DetectorThresholds) -> String {
    format!(
        r#"SELECT
        srcaddr,
        dstaddr,
        SUM(bytes) AS total_bytes,
        COUNT(*) AS connection_count,
        AVG(bytes) AS avg_bytes_per_connection,
        MIN(to_iso8601(from_unixtime(start))) AS first_connection,
        MAX(to_iso8601(from_unixtime("end"))) AS last_connection
    FROM {table}
    WHERE
        log_status = 'OK'
        AND action = 'ACCEPT'
        AND dstport IN ({EXFIL_PORTS})
        AND {TODAY}
    GROUP BY srcaddr, dstaddr
    HAVING SUM(bytes) > {min_bytes}
    ORDER BY total_bytes DESC
    LIMIT 10"#,
        min_bytes = t.exfil_min_bytes,
    )
}

pub fn unusual_protocol_sql(table: &str) -> String {
    format!(
        r#"SELECT
        protocol,
        COUNT(*) AS connection_count,
        COUNT(DISTINCT srcaddr) AS unique_sources,
        COUNT(DISTINCT dstaddr) AS unique_destinations,
        SUM(bytes) AS total_bytes
    FROM {table}
    WHERE
        log_status = 'OK'
        AND action = 'ACCEPT'
        AND protocol NOT IN ({COMMON_PROTOCOLS})
        AND {TODAY}
    GROUP BY protocol
    ORDER BY connection_count DESC
    LIMIT 10"#
    )
}

/// The detector set, in execution order.
pub fn detection_queries(table: &str, pipeline: &PipelineConfig) -> Vec<DetectionQuery> {
    let t = &pipeline.thresholds;
    let mut queries = vec![
        DetectionQuery::new(AnomalyType::PortScanning, port_scanning_sql(table, t)),
        DetectionQuery::new(AnomalyType::DDoS, ddos_sql(table, t)),
        DetectionQuery::new(AnomalyType::DataExfiltration, data_exfiltration_sql(table, t)),
    ];
    if pipeline.detect_unusual_protocol {
        queries.push(DetectionQuery::new(
            AnomalyType::UnusualProtocol,
            unusual_protocol_sql(table),
        ));
    }
    queries
}

/// Validate `config` and build its detector set.
pub fn build_queries(config: &Config) -> Result<Vec<DetectionQuery>, ConfigError> {
    config.validate()?;
    Ok(detection_queries(config.athena.table()?, &config.pipeline))
}
