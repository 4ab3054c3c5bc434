//! Tests for the task pipelines

use super::*;
use crate::config::{Connection, ConnectionStore, TaskDefinition};
use crate::database::TableWriter;
use crate::output::{ObjectStoreSink, ObjectStoreUploader};
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::tempdir;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Helpers
// ============================================================================

fn connections() -> ConnectionStore {
    let mut store = ConnectionStore::new();
    store.insert(
        "ga_test",
        Connection {
            password: Some("test-token".into()),
            ..Default::default()
        },
    );
    store
}

fn page(rows: serde_json::Value, token: Option<&str>) -> serde_json::Value {
    let mut report = json!({
        "columnHeader": {
            "dimensions": ["ga:country", "ga:city"],
            "metricHeader": {"metricHeaderEntries": [{"name": "ga:sessions", "type": "INTEGER"}]}
        },
        "data": {"rows": rows, "rowCount": 2, "totals": [{"values": ["45"]}]}
    });
    if let Some(token) = token {
        report["nextPageToken"] = json!(token);
    }
    json!({"reports": [report]})
}

async fn mount_two_pages(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v4/reports:batchGet"))
        .and(body_partial_json(json!({"reportRequests": [{"pageToken": "p2"}]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            json!([{"dimensions": ["FR", "Paris"], "metrics": [{"values": ["3"]}]}]),
            None,
        )))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v4/reports:batchGet"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            json!([{"dimensions": ["US", "NYC"], "metrics": [{"values": ["42"]}]}]),
            Some("p2"),
        )))
        .with_priority(10)
        .expect(1)
        .mount(server)
        .await;
}

fn report_fields(server: &MockServer) -> String {
    format!(
        r"
google_analytics_conn_id: ga_test
view_id: '123'
since: '2020-01-01'
until: '2020-01-31'
dimensions: ['ga:country', 'ga:city']
metrics: ['ga:sessions']
page_pause_ms: 0
endpoints:
  reporting_url: {uri}
  management_url: {uri}
  upload_url: {uri}/upload
",
        uri = server.uri()
    )
}

fn object_store_task(server: &MockServer, root: &std::path::Path) -> ReportToObjectStore {
    let doc = format!(
        "task: report_to_object_store\n{}storage:\n  provider: local\n  root: {}\nbucket: analytics\nkey: ga/out.json\n",
        report_fields(server),
        root.display()
    );
    let TaskDefinition::ReportToObjectStore(config) = TaskDefinition::from_str(&doc).unwrap() else {
        panic!("wrong task kind");
    };
    ReportToObjectStore::new(config)
}

fn table_task(server: &MockServer, extra: &str) -> ReportToTable {
    let doc = format!(
        "task: report_to_table\n{}database:\n  engine: duckdb\ndestination:\n  table: ga_sessions\n{extra}",
        report_fields(server)
    );
    let TaskDefinition::ReportToTable(config) = TaskDefinition::from_str(&doc).unwrap() else {
        panic!("wrong task kind");
    };
    ReportToTable::new(config)
}

// ============================================================================
// Report → Object Store
// ============================================================================

#[tokio::test]
async fn test_report_to_object_store_end_to_end() {
    let server = MockServer::start().await;
    mount_two_pages(&server).await;
    let root = tempdir().unwrap();

    let outcome = object_store_task(&server, root.path())
        .execute(&connections())
        .await
        .unwrap();

    assert_eq!(outcome.records, 2);
    assert_eq!(outcome.destination, "analytics/ga/out.json");

    let body = std::fs::read_to_string(root.path().join("analytics/ga/out.json")).unwrap();
    assert_eq!(
        body,
        "{\"country\":\"US\",\"city\":\"NYC\",\"sessions\":\"42\",\"viewid\":\"123\",\"timestamp\":\"2020-01-01\"}\n\
         {\"country\":\"FR\",\"city\":\"Paris\",\"sessions\":\"3\",\"viewid\":\"123\",\"timestamp\":\"2020-01-01\"}"
    );
}

#[tokio::test]
async fn test_report_to_object_store_empty_report() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v4/reports:batchGet"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let task = object_store_task(&server, std::path::Path::new("/unused"));
    let fetcher = report_fetcher(&task.config().report, &connections()).unwrap();
    let (uploader, store) = ObjectStoreUploader::in_memory();

    let outcome = task
        .run(&fetcher, &ObjectStoreSink::new(uploader))
        .await
        .unwrap();

    assert_eq!(outcome.records, 0);
    let object = store
        .get(&ObjectPath::from("analytics/ga/out.json"))
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();
    assert!(object.is_empty());
}

#[tokio::test]
async fn test_report_to_object_store_failure_writes_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v4/reports:batchGet"))
        .and(body_partial_json(json!({"reportRequests": [{"pageToken": "p2"}]})))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend error"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v4/reports:batchGet"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            json!([{"dimensions": ["US", "NYC"], "metrics": [{"values": ["42"]}]}]),
            Some("p2"),
        )))
        .with_priority(10)
        .expect(1)
        .mount(&server)
        .await;
    let root = tempdir().unwrap();

    let err = object_store_task(&server, root.path())
        .execute(&connections())
        .await
        .unwrap_err();

    assert!(err.is_upstream(), "got {err:?}");
    assert!(!root.path().join("analytics/ga/out.json").exists());
}

#[tokio::test]
async fn test_missing_credentials_fail_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;
    let mut store = ConnectionStore::new();
    store.insert("ga_test", Connection::default());
    let root = tempdir().unwrap();

    let err = object_store_task(&server, root.path())
        .execute(&store)
        .await
        .unwrap_err();

    assert!(err.is_configuration(), "got {err:?}");
}

// ============================================================================
// Report → Table
// ============================================================================

#[tokio::test]
async fn test_report_to_table() {
    let server = MockServer::start().await;
    mount_two_pages(&server).await;
    let task = table_task(&server, "typed_columns: true\n");
    let fetcher = report_fetcher(&task.config().report, &connections()).unwrap();
    let mut writer = TableWriter::in_memory().unwrap();

    let outcome = task.run(&fetcher, &mut writer).await.unwrap();

    assert_eq!(outcome.records, 2);
    assert_eq!(outcome.destination, "ga_sessions");

    let (sessions, sessions_type): (i64, String) = writer
        .connection()
        .query_row(
            "SELECT CAST(sum(sessions) AS BIGINT), \
             (SELECT data_type FROM information_schema.columns \
              WHERE table_name = 'ga_sessions' AND column_name = 'sessions') \
             FROM ga_sessions",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(sessions, 45);
    assert_eq!(sessions_type, "INTEGER");
}

#[tokio::test]
async fn test_report_to_table_fail_policy() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v4/reports:batchGet"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            json!([{"dimensions": ["US", "NYC"], "metrics": [{"values": ["42"]}]}]),
            None,
        )))
        .mount(&server)
        .await;
    let task = table_task(&server, "");
    let fetcher = report_fetcher(&task.config().report, &connections()).unwrap();
    let mut writer = TableWriter::in_memory().unwrap();
    writer
        .connection()
        .execute_batch("CREATE TABLE ga_sessions (country VARCHAR)")
        .unwrap();

    let err = task.run(&fetcher, &mut writer).await.unwrap_err();

    assert!(err.is_configuration(), "got {err:?}");
    let rows: i64 = writer
        .connection()
        .query_row("SELECT count(*) FROM ga_sessions", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 0);
}

#[tokio::test]
async fn test_report_to_table_untyped_columns_are_varchar() {
    let server = MockServer::start().await;
    mount_two_pages(&server).await;
    let task = table_task(&server, "");
    let fetcher = report_fetcher(&task.config().report, &connections()).unwrap();
    let mut writer = TableWriter::in_memory().unwrap();

    task.run(&fetcher, &mut writer).await.unwrap();

    let data_type: String = writer
        .connection()
        .query_row(
            "SELECT data_type FROM information_schema.columns \
             WHERE table_name = 'ga_sessions' AND column_name = 'sessions'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(data_type, "VARCHAR");
}

// ============================================================================
// Account Summaries → Object Store
// ============================================================================

#[tokio::test]
async fn test_account_summaries_to_object_store() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/management/accountSummaries"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{
                "id": "1001",
                "webProperties": [{
                    "id": "UA-1001-1",
                    "profiles": [
                        {"id": "9001", "name": "All Web Site Data"},
                        {"id": "9002", "name": "Raw"}
                    ]
                }]
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    let root = tempdir().unwrap();
    let doc = format!(
        "task: account_summaries_to_object_store\ngoogle_analytics_conn_id: ga_test\nbrand: acme\nspace: emea\n\
         storage:\n  provider: local\n  root: {}\nbucket: meta\nkey: accounts.json\n\
         endpoints:\n  management_url: {}\n",
        root.path().display(),
        server.uri()
    );
    let task = TaskDefinition::from_str(&doc).unwrap();

    let outcome = run_task(&task, &connections()).await.unwrap();

    assert_eq!(outcome.records, 2);
    let body = std::fs::read_to_string(root.path().join("meta/accounts.json")).unwrap();
    let lines: Vec<serde_json::Value> = body
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(
        lines[1],
        json!({
            "account_id": "1001",
            "brand": "acme",
            "space": "emea",
            "property_id": "UA-1001-1",
            "profile_id": "9002",
            "profile_name": "Raw"
        })
    );
}
