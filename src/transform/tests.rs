//! Tests for the transform module

use super::*;
use crate::output::to_jsonl_bytes;
use crate::reporting::{AccountSummaries, RawReport, Report};
use pretty_assertions::assert_eq;
use serde_json::json;
use test_case::test_case;

fn report(value: serde_json::Value) -> Report {
    let raw: RawReport = serde_json::from_value(value).unwrap();
    Report::from_raw(raw).unwrap()
}

fn country_city_sessions() -> Report {
    report(json!({
        "columnHeader": {
            "dimensions": ["ga:country", "ga:city"],
            "metricHeader": {"metricHeaderEntries": [{"name": "ga:sessions", "type": "INTEGER"}]}
        },
        "data": {
            "rows": [{"dimensions": ["US", "NYC"], "metrics": [{"values": ["42"]}]}]
        }
    }))
}

// ============================================================================
// Flattening
// ============================================================================

#[test]
fn test_flatten_single_row() {
    let records = Flattener::default().flatten(&country_city_sessions(), "123", "2020-01-01");

    assert_eq!(records.len(), 1);
    let line = serde_json::to_string(&records[0]).unwrap();
    assert_eq!(
        line,
        r#"{"country":"US","city":"NYC","sessions":"42","viewid":"123","timestamp":"2020-01-01"}"#
    );
}

#[test]
fn test_flatten_one_record_per_metric_set() {
    let report = report(json!({
        "columnHeader": {
            "dimensions": ["ga:date"],
            "metricHeader": {"metricHeaderEntries": [
                {"name": "ga:users", "type": "INTEGER"},
                {"name": "ga:bounceRate", "type": "PERCENT"}
            ]}
        },
        "data": {
            "rows": [
                {"dimensions": ["20200101"], "metrics": [
                    {"values": ["10", "0.5"]},
                    {"values": ["11", "0.6"]}
                ]},
                {"dimensions": ["20200102"], "metrics": [
                    {"values": ["12", "0.7"]}
                ]}
            ]
        }
    }));

    let records = Flattener::default().flatten(&report, "9", "2020-01-01");

    assert_eq!(records.len(), 3);
    assert_eq!(records.len(), report.record_count());

    assert_eq!(records[0].get("date"), Some("20200101"));
    assert_eq!(records[0].get("users"), Some("10"));
    assert_eq!(records[1].get("date"), Some("20200101"));
    assert_eq!(records[1].get("bouncerate"), Some("0.6"));
    assert_eq!(records[2].get("date"), Some("20200102"));
    assert_eq!(records[2].get("users"), Some("12"));

    for record in &records {
        assert_eq!(
            record.keys().collect::<Vec<_>>(),
            vec!["date", "users", "bouncerate", "viewid", "timestamp"]
        );
    }
}

#[test]
fn test_flatten_rows_without_metric_sets_yield_nothing() {
    let report = report(json!({
        "columnHeader": {
            "dimensions": ["ga:country"],
            "metricHeader": {"metricHeaderEntries": [{"name": "ga:sessions"}]}
        },
        "data": {"rows": [{"dimensions": ["US"], "metrics": []}]}
    }));

    assert!(Flattener::default().flatten(&report, "1", "2020-01-01").is_empty());
}

#[test]
fn test_flatten_empty_report() {
    let records = Flattener::default().flatten(&Report::empty(), "1", "2020-01-01");
    assert!(records.is_empty());
}

#[test]
fn test_flatten_is_repeatable() {
    let report = country_city_sessions();
    let flattener = Flattener::default();

    let first = to_jsonl_bytes(&flattener.flatten(&report, "123", "2020-01-01")).unwrap();
    let second = to_jsonl_bytes(&flattener.flatten(&report, "123", "2020-01-01")).unwrap();

    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn test_timestamp_is_caller_supplied() {
    let records = Flattener::default().flatten(&country_city_sessions(), "123", "2019-12-25");
    assert_eq!(records[0].get(TIMESTAMP_KEY), Some("2019-12-25"));
    assert_eq!(records[0].get(VIEW_ID_KEY), Some("123"));
}

#[test_case("ga:sessions", "sessions")]
#[test_case("ga:pageViews", "pageviews")]
#[test_case("sessions", "sessions")]
#[test_case("GA:Users", "ga:users" ; "prefix match is case sensitive")]
#[test_case("ga:ga:x", "ga:x" ; "only one prefix is removed")]
fn test_column_name(input: &str, expected: &str) {
    assert_eq!(column_name(input), expected);
}

// ============================================================================
// Column types
// ============================================================================

#[test_case("CURRENCY", "decimal(20,5)")]
#[test_case("INTEGER", "int(11)")]
#[test_case("FLOAT", "decimal(20,5)")]
#[test_case("PERCENT", "decimal(20,5)")]
#[test_case("TIME", "time")]
#[test_case("METRIC_TYPE_UNSPECIFIED", "varchar(255)")]
#[test_case("SOMETHING_NEW", "varchar(255)" ; "unknown type falls back")]
fn test_metric_sql_type(metric_type: &str, expected: &str) {
    assert_eq!(DEFAULT_METRIC_TYPE_MAP.sql_type(metric_type), expected);
}

#[test]
fn test_column_types() {
    let report = report(json!({
        "columnHeader": {
            "dimensions": ["ga:country"],
            "metricHeader": {"metricHeaderEntries": [
                {"name": "ga:revenue", "type": "CURRENCY"},
                {"name": "ga:avgTime", "type": "TIME"},
                {"name": "ga:odd"}
            ]}
        }
    }));

    let types = Flattener::default().column_types(&report);

    assert_eq!(
        types,
        vec![
            ColumnType { name: "country".into(), sql_type: DIMENSION_SQL_TYPE },
            ColumnType { name: "revenue".into(), sql_type: "decimal(20,5)" },
            ColumnType { name: "avgtime".into(), sql_type: "time" },
            ColumnType { name: "odd".into(), sql_type: FALLBACK_SQL_TYPE },
        ]
    );
}

#[test]
fn test_column_types_without_header() {
    assert!(Flattener::default().column_types(&Report::empty()).is_empty());
}

#[test]
fn test_custom_type_map() {
    static MAP: MetricTypeMap = MetricTypeMap::new(&[("INTEGER", "bigint")]);
    let types = Flattener::new(&MAP).column_types(&country_city_sessions());
    assert_eq!(types[2].sql_type, "bigint");
    assert_eq!(MAP.sql_type("CURRENCY"), FALLBACK_SQL_TYPE);
}

// ============================================================================
// Records
// ============================================================================

#[test]
fn test_record_insert_replaces_in_place() {
    let mut record = FlatRecord::new();
    record.insert("a", "1");
    record.insert("b", "2");
    record.insert("a", "3");

    assert_eq!(record.len(), 2);
    assert_eq!(record.iter().collect::<Vec<_>>(), vec![("a", "3"), ("b", "2")]);
}

#[test]
fn test_record_to_json_object() {
    let record: FlatRecord = [("x", "1")].into_iter().collect();
    let object = record.to_json_object();
    assert_eq!(object.get("x"), Some(&json!("1")));
}

// ============================================================================
// Account summaries
// ============================================================================

fn summaries() -> AccountSummaries {
    serde_json::from_value(json!({
        "items": [
            {
                "id": "acc1",
                "name": "Account One",
                "webProperties": [
                    {"id": "UA-1-1", "profiles": [
                        {"id": "p1", "name": "All Web Site Data"},
                        {"id": "p2", "name": "Filtered"}
                    ]},
                    {"id": "UA-1-2", "profiles": []}
                ]
            },
            {
                "id": "acc2",
                "webProperties": [
                    {"id": "UA-2-1", "profiles": [{"id": "p3", "name": "Main"}]}
                ]
            },
            {"id": "acc3"}
        ]
    }))
    .unwrap()
}

#[test]
fn test_account_summaries_one_record_per_profile() {
    let records = flatten_account_summaries(&summaries(), "acme", "emea");

    assert_eq!(records.len(), 3);
    assert_eq!(
        records[0],
        AccountSummaryRecord {
            account_id: "acc1".into(),
            brand: "acme".into(),
            space: "emea".into(),
            property_id: "UA-1-1".into(),
            profile_id: "p1".into(),
            profile_name: "All Web Site Data".into(),
        }
    );
    assert_eq!(records[1].profile_id, "p2");
    assert_eq!(records[1].property_id, "UA-1-1");
    assert_eq!(records[2].account_id, "acc2");
    assert_eq!(records[2].profile_id, "p3");
}

#[test]
fn test_account_summary_record_serializes_in_field_order() {
    let records = flatten_account_summaries(&summaries(), "b", "s");
    let line = serde_json::to_string(&records[2]).unwrap();
    assert_eq!(
        line,
        r#"{"account_id":"acc2","brand":"b","space":"s","property_id":"UA-2-1","profile_id":"p3","profile_name":"Main"}"#
    );
}

#[test]
fn test_account_summaries_empty() {
    let records = flatten_account_summaries(&AccountSummaries::default(), "b", "s");
    assert!(records.is_empty());
}
