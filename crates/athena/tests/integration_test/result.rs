//! Materialization properties over realistic flow-log result sets.

use vpcwatch_athena::{materialize, RawResultSet};

use crate::mock::cells;

fn header() -> Vec<Option<String>> {
    cells(&[
        Some("srcaddr"),
        Some("dstaddr"),
        Some("total_bytes"),
        Some("connection_count"),
        Some("avg_bytes_per_connection"),
        Some("first_connection"),
        Some("last_connection"),
    ])
}

#[test]
fn header_only_result_is_no_result() {
    assert!(materialize(RawResultSet::new(vec![header()])).is_none());
}

#[test]
fn every_row_has_the_header_key_set() {
    let mut rows = vec![header()];
    for i in 0..25 {
        let mut row = cells(&[
            Some("10.0.0.12"),
            Some("198.51.100.20"),
            Some("31000000"),
            Some("14"),
            None,
            Some("2024-06-01T00:10:00.000Z"),
        ]);
        if i % 2 == 0 {
            row.push(Some("2024-06-01T01:00:00.000Z".to_string()));
        }
        rows.push(row);
    }

    let records = materialize(RawResultSet::new(rows)).unwrap();
    assert_eq!(records.len(), 25);

    let expected: Vec<String> = header().into_iter().flatten().collect();
    for record in &records {
        let keys: Vec<String> = record.keys().cloned().collect();
        assert_eq!(keys, expected);
        assert_eq!(record["avg_bytes_per_connection"], "");
    }
    assert_eq!(records[0]["last_connection"], "2024-06-01T01:00:00.000Z");
    assert_eq!(records[1]["last_connection"], "");
}

#[test]
fn raw_result_set_serializes() {
    let raw = RawResultSet::new(vec![cells(&[Some("protocol")]), cells(&[None])]);
    let json = serde_json::to_string(&raw).unwrap();
    assert_eq!(json, r#"{"rows":[["protocol"],[null]]}"#);
}
