//! Authenticated clients for the reporting and management APIs

use super::model::BatchGetResponse;
use super::query::{BatchGetRequest, ReportRequest};
use crate::auth::{Authenticator, Credentials};
use crate::error::Result;
use crate::http::{HttpClient, HttpClientConfig, RequestConfig};
use crate::types::{ApiService, JsonValue};
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Base URLs of the analytics APIs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiEndpoints {
    /// Reporting API v4 root
    pub reporting_url: String,
    /// Management / core reporting API v3 root
    pub management_url: String,
    /// Media upload root for the management API
    pub upload_url: String,
    /// OAuth token endpoint; the key document's `token_uri` when unset
    pub token_url: Option<String>,
}

impl Default for ApiEndpoints {
    fn default() -> Self {
        Self {
            reporting_url: "https://analyticsreporting.googleapis.com".to_string(),
            management_url: "https://www.googleapis.com/analytics/v3".to_string(),
            upload_url: "https://www.googleapis.com/upload/analytics/v3".to_string(),
            token_url: None,
        }
    }
}

impl ApiEndpoints {
    /// Point every service at one root (mock servers, proxies)
    pub fn with_root(root: impl Into<String>) -> Self {
        let root = root.into();
        Self {
            reporting_url: root.clone(),
            management_url: root.clone(),
            upload_url: format!("{}/upload", root.trim_end_matches('/')),
            token_url: Some(format!("{}/token", root.trim_end_matches('/'))),
        }
    }
}

/// One paged batchGet call
#[async_trait]
pub trait ReportingApi: Send + Sync {
    /// Execute a single-report batchGet
    async fn batch_get(&self, request: &ReportRequest) -> Result<BatchGetResponse>;
}

/// Reporting API v4 client
#[derive(Debug)]
pub struct ReportingClient {
    http: HttpClient,
}

impl ReportingClient {
    /// Build a client authenticated with reporting scopes
    pub fn new(credentials: Credentials, endpoints: &ApiEndpoints) -> Result<Self> {
        let config = HttpClientConfig::builder()
            .base_url(endpoints.reporting_url.clone())
            .build();
        let credentials = credentials.with_token_uri(endpoints.token_url.as_deref());
        let auth = Authenticator::new(credentials, ApiService::Reporting.scopes());
        Ok(Self {
            http: HttpClient::with_auth(config, auth)?,
        })
    }
}

#[async_trait]
impl ReportingApi for ReportingClient {
    async fn batch_get(&self, request: &ReportRequest) -> Result<BatchGetResponse> {
        let body = BatchGetRequest::new(request);
        debug!(
            "batchGet view={} page_token={:?}",
            request.view_id, request.page_token
        );
        self.http.post_json("/v4/reports:batchGet", &body).await
    }
}

// ============================================================================
// Management API
// ============================================================================

/// accountSummaries list response
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummaries {
    #[serde(default)]
    pub items: Vec<AccountSummary>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub web_properties: Vec<WebPropertySummary>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebPropertySummary {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub profiles: Vec<ProfileSummary>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileSummary {
    pub id: String,
    pub name: String,
}

/// Management / core reporting API v3 client
#[derive(Debug)]
pub struct ManagementClient {
    http: HttpClient,
    upload_url: String,
}

impl ManagementClient {
    /// Build a client authenticated with management scopes
    pub fn new(credentials: Credentials, endpoints: &ApiEndpoints) -> Result<Self> {
        let config = HttpClientConfig::builder()
            .base_url(endpoints.management_url.clone())
            .build();
        let credentials = credentials.with_token_uri(endpoints.token_url.as_deref());
        let auth = Authenticator::new(credentials, ApiService::Management.scopes());
        Ok(Self {
            http: HttpClient::with_auth(config, auth)?,
            upload_url: endpoints.upload_url.trim_end_matches('/').to_string(),
        })
    }

    /// Account → web property → profile hierarchy of the authenticated identity
    pub async fn account_summaries(&self) -> Result<AccountSummaries> {
        self.http
            .get_json("/management/accountSummaries", RequestConfig::new())
            .await
    }

    /// Core reporting (v3) query, returned as the raw response document
    pub async fn get_report(
        &self,
        view_id: &str,
        since: &str,
        until: &str,
        metrics: &str,
        dimensions: Option<&str>,
    ) -> Result<JsonValue> {
        let mut config = RequestConfig::new()
            .query("ids", view_id)
            .query("start-date", since)
            .query("end-date", until)
            .query("metrics", metrics);
        if let Some(dimensions) = dimensions {
            config = config.query("dimensions", dimensions);
        }
        self.http.get_json("/data/ga", config).await
    }

    /// Upload a file to a custom data source
    pub async fn upload_data(
        &self,
        account_id: &str,
        web_property_id: &str,
        data_source_id: &str,
        data: Bytes,
    ) -> Result<JsonValue> {
        let url = format!(
            "{}/management/accounts/{account_id}/webproperties/{web_property_id}/customDataSources/{data_source_id}/uploads",
            self.upload_url
        );
        let config = RequestConfig::new()
            .query("uploadType", "media")
            .bytes("application/octet-stream", data);
        self.http
            .request_json(reqwest::Method::POST, &url, config)
            .await
    }
}
