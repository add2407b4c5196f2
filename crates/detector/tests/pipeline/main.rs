mod mock;

use std::sync::Arc;
use std::time::Duration;

use vpcwatch_core::AnomalyType;
use vpcwatch_core::Severity;
use vpcwatch_detector::{check_components, handle_invocation};
use vpcwatch_llm::Enricher;

use mock::{harness, harness_with, header_only, rows, test_config, throttled_enricher, Outcome, RecordingNotifier};

const PORT_SCAN_HEADER: &[&str] = &["srcaddr", "unique_ports", "total_attempts", "first_attempt", "last_attempt"];
const DDOS_HEADER: &[&str] = &["dstaddr", "total_packets", "total_bytes", "unique_sources"];

#[tokio::test]
async fn port_scan_rows_become_one_high_alert() {
    let h = harness(test_config(), vec![Outcome::Rows(rows(PORT_SCAN_HEADER, 3))]);

    let report = h.pipeline.run().await.unwrap();

    assert_eq!(report.anomalies_found(), 1);
    let anomaly = &report.anomalies[0];
    assert_eq!(anomaly.kind(), AnomalyType::PortScanning);
    assert_eq!(anomaly.severity(), Severity::High);
    assert_eq!(anomaly.instance_count(), 3);
    for row in anomaly.rows() {
        assert_eq!(row.keys().map(String::as_str).collect::<Vec<_>>(), PORT_SCAN_HEADER);
    }

    let subjects = h.notifier.subjects();
    assert_eq!(subjects.len(), 1);
    assert!(subjects[0].contains("Port Scanning"));
    assert!(subjects[0].chars().count() <= 100);
    assert_eq!(report.alerts_published, 1);
}

#[tokio::test]
async fn quiet_run_reports_zero_with_status_200() {
    let h = harness(test_config(), Vec::new());

    let response = handle_invocation(&h.pipeline, "req-quiet").await;

    assert_eq!(response.status_code, 200);
    assert_eq!(response.body.anomalies_found, Some(0));
    assert_eq!(response.body.request_id, "req-quiet");
    assert_eq!(response.body.enrichment_enabled, Some(false));
    assert_eq!(h.engine.submissions(), 4);
    // all-clear odds of 0 keep the topic silent
    assert!(h.notifier.subjects().is_empty());
}

#[tokio::test]
async fn ddos_permission_error_is_isolated() {
    let h = harness(
        test_config(),
        vec![
            Outcome::Rows(header_only()),
            Outcome::SubmitError("AccessDeniedException: not authorized to perform athena:StartQueryExecution".into()),
            Outcome::Rows(header_only()),
            Outcome::Rows(header_only()),
        ],
    );

    let response = handle_invocation(&h.pipeline, "req-ddos").await;

    assert_eq!(response.status_code, 200);
    assert_eq!(response.body.anomalies_found, Some(0));
    assert_eq!(h.engine.submissions(), 4, "later detectors still ran");
}

#[tokio::test]
async fn failed_detector_does_not_hide_later_findings() {
    let h = harness(
        test_config(),
        vec![
            Outcome::Fails("HIVE_BAD_DATA: malformed partition".into()),
            Outcome::Rows(rows(DDOS_HEADER, 2)),
        ],
    );

    let report = h.pipeline.run().await.unwrap();

    assert_eq!(report.anomalies_found(), 1);
    assert_eq!(report.anomalies[0].kind(), AnomalyType::DDoS);
    assert_eq!(report.anomalies[0].severity(), Severity::Critical);
}

#[tokio::test]
async fn missing_config_returns_500_and_reports_request_id() {
    let mut config = test_config();
    config.athena.database = None;
    let h = harness(config, Vec::new());

    let response = handle_invocation(&h.pipeline, "req-missing").await;

    assert_eq!(response.status_code, 500);
    let error = response.body.error.as_deref().unwrap();
    assert!(error.contains("ATHENA_DATABASE"), "{error}");
    assert_eq!(response.body.anomalies_found, None);
    assert_eq!(h.engine.submissions(), 0);

    let bodies = h.notifier.bodies();
    assert_eq!(bodies.len(), 1);
    assert!(bodies[0].contains("Request ID: req-missing"));
    assert!(bodies[0].contains("Database: (unset)"));
    assert!(bodies[0].contains("Table: vpc_flow_logs"));
    assert!(h.notifier.subjects()[0].contains("ERROR"));
}

#[tokio::test]
async fn invalid_table_name_is_a_config_failure() {
    let mut config = test_config();
    config.athena.table = Some("flows; DROP TABLE x".into());
    let h = harness(config, Vec::new());

    let response = handle_invocation(&h.pipeline, "req-table").await;

    assert_eq!(response.status_code, 500);
    assert!(response.body.error.unwrap().contains("ATHENA_TABLE"));
    assert_eq!(h.engine.submissions(), 0);
}

#[tokio::test]
async fn two_anomalies_pace_once() {
    let h = harness(
        test_config(),
        vec![
            Outcome::Rows(rows(PORT_SCAN_HEADER, 1)),
            Outcome::Rows(rows(DDOS_HEADER, 4)),
        ],
    );

    let report = h.pipeline.run().await.unwrap();

    assert_eq!(report.anomalies_found(), 2);
    assert_eq!(h.clock.sleeps(), vec![Duration::from_secs(3)]);
    let subjects = h.notifier.subjects();
    assert!(subjects[0].contains("Port Scanning"));
    assert!(subjects[1].contains("DDoS Attack"));
}

#[tokio::test]
async fn single_anomaly_is_not_paced() {
    let h = harness(test_config(), vec![Outcome::Rows(rows(PORT_SCAN_HEADER, 2))]);

    h.pipeline.run().await.unwrap();

    assert!(h.clock.sleeps().is_empty());
}

#[tokio::test]
async fn throttled_model_still_yields_a_narrative() {
    let h = harness_with(
        test_config(),
        vec![Outcome::Rows(rows(PORT_SCAN_HEADER, 1))],
        throttled_enricher(),
        Arc::new(RecordingNotifier::default()),
        0,
    );

    let report = h.pipeline.run().await.unwrap();

    let narrative = report.anomalies[0].narrative().unwrap();
    assert!(narrative.contains("BASIC ANALYSIS - PORT SCANNING"));
    assert!(narrative.contains("Note: AI analysis unavailable"));
    assert!(h.notifier.bodies()[0].contains("BASIC ANALYSIS - PORT SCANNING"));
}

#[tokio::test]
async fn publish_failures_are_swallowed() {
    let h = harness_with(
        test_config(),
        vec![Outcome::Rows(rows(PORT_SCAN_HEADER, 1))],
        Enricher::disabled(),
        RecordingNotifier::failing(),
        0,
    );

    let response = handle_invocation(&h.pipeline, "req-sns").await;

    assert_eq!(response.status_code, 200);
    assert_eq!(response.body.anomalies_found, Some(1));
    assert_eq!(h.notifier.subjects().len(), 1, "publish was attempted");
}

#[tokio::test]
async fn failed_publish_does_not_stop_the_next_alert() {
    let h = harness_with(
        test_config(),
        vec![
            Outcome::Rows(rows(PORT_SCAN_HEADER, 1)),
            Outcome::Rows(rows(DDOS_HEADER, 2)),
        ],
        Enricher::disabled(),
        RecordingNotifier::failing(),
        0,
    );

    let report = h.pipeline.run().await.unwrap();

    assert_eq!(report.anomalies_found(), 2);
    assert_eq!(report.alerts_published, 0);
    let subjects = h.notifier.subjects();
    assert_eq!(subjects.len(), 2, "both alerts were attempted");
    assert!(subjects[1].contains("DDoS Attack"));
    assert_eq!(h.clock.sleeps(), vec![Duration::from_secs(3)]);
}

#[tokio::test]
async fn check_reports_throttled_model_as_failed() {
    let h = harness_with(
        test_config(),
        Vec::new(),
        throttled_enricher(),
        Arc::new(RecordingNotifier::default()),
        0,
    );

    let checks = check_components(&h.pipeline, false).await;

    let llm = checks.iter().find(|c| c.component == "llm").unwrap();
    assert!(!llm.ok);
    assert!(llm.detail.contains("429"), "{}", llm.detail);
    assert!(checks.iter().filter(|c| c.component != "llm").all(|c| c.ok));
    assert!(h.notifier.subjects().is_empty());
    assert_eq!(h.engine.submissions(), 0);
}

#[tokio::test]
async fn check_passes_with_enrichment_disabled() {
    let h = harness(test_config(), Vec::new());

    let checks = check_components(&h.pipeline, false).await;

    assert_eq!(checks.len(), 4);
    assert!(checks.iter().all(|c| c.ok), "{checks:?}");
    let llm = checks.iter().find(|c| c.component == "llm").unwrap();
    assert!(llm.detail.contains("disabled"));
}

#[tokio::test]
async fn send_test_publishes_one_notice() {
    let h = harness(test_config(), Vec::new());

    let checks = check_components(&h.pipeline, true).await;

    let delivery = checks.iter().find(|c| c.component == "delivery").unwrap();
    assert!(delivery.ok);
    let subjects = h.notifier.subjects();
    assert_eq!(subjects.len(), 1);
    assert!(subjects[0].contains("TEST"));
}

#[tokio::test]
async fn send_test_reports_delivery_failure() {
    let h = harness_with(
        test_config(),
        Vec::new(),
        Enricher::disabled(),
        RecordingNotifier::failing(),
        0,
    );

    let checks = check_components(&h.pipeline, true).await;

    let delivery = checks.iter().find(|c| c.component == "delivery").unwrap();
    assert!(!delivery.ok);
    assert!(delivery.detail.contains("AuthorizationError"));
}

#[tokio::test]
async fn all_clear_sent_when_gate_always_passes() {
    let h = harness_with(
        test_config(),
        Vec::new(),
        Enricher::disabled(),
        Arc::new(RecordingNotifier::default()),
        1,
    );

    let report = h.pipeline.run().await.unwrap();

    assert!(report.all_clear_sent);
    let subjects = h.notifier.subjects();
    assert_eq!(subjects.len(), 1);
    assert!(subjects[0].contains("Status OK"));
}

#[tokio::test]
async fn unusual_protocol_toggle_skips_the_last_detector() {
    let mut config = test_config();
    config.pipeline.detect_unusual_protocol = false;
    let h = harness(config, Vec::new());

    h.pipeline.run().await.unwrap();

    assert_eq!(h.engine.submissions(), 3);
    let submitted = h.engine.submitted.lock().unwrap();
    assert!(submitted.iter().all(|sql| sql.contains("FROM vpc_flow_logs")));
}
