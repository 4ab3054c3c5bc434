//! Credential types
//!
//! The analytics connection either carries a pre-obtained bearer token or a
//! service-account key document from which short-lived tokens are derived.

use crate::config::Connection;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use jsonwebtoken::EncodingKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Default OAuth2 token endpoint for service accounts
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Service-account key document (the `client_secrets` JSON)
#[derive(Clone, Serialize, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(rename = "type")]
    pub key_type: String,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub private_key_id: Option<String>,
    pub private_key: String,
    pub client_email: String,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub auth_uri: Option<String>,
    #[serde(default)]
    pub token_uri: Option<String>,
    #[serde(default)]
    pub auth_provider_x509_cert_url: Option<String>,
    #[serde(default)]
    pub client_x509_cert_url: Option<String>,
}

impl ServiceAccountKey {
    /// Parse and validate a key document
    ///
    /// Fails with a configuration error when required fields are missing,
    /// the document is not a service account, or the private key is not PEM.
    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        let key: Self = serde_json::from_value(value.clone())
            .map_err(|e| Error::config(format!("Malformed service account document: {e}")))?;
        key.validate()?;
        Ok(key)
    }

    /// Read a key document from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read key file {}: {e}",
                path.display()
            ))
        })?;
        let value: serde_json::Value = serde_json::from_str(&content)
            .map_err(|e| Error::config(format!("Key file {} is not JSON: {e}", path.display())))?;
        Self::from_value(&value)
    }

    fn validate(&self) -> Result<()> {
        if self.key_type != "service_account" {
            return Err(Error::config(format!(
                "Expected a 'service_account' key document, got type '{}'",
                self.key_type
            )));
        }
        if self.client_email.is_empty() {
            return Err(Error::config("Service account document has an empty client_email"));
        }
        EncodingKey::from_rsa_pem(self.private_key.as_bytes())
            .map_err(|e| Error::config(format!("Service account private key is invalid: {e}")))?;
        Ok(())
    }

    /// Token endpoint to exchange signed assertions at
    pub fn token_uri(&self) -> &str {
        self.token_uri.as_deref().unwrap_or(DEFAULT_TOKEN_URI)
    }
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

/// Credentials resolved from a connection record
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Opaque bearer token, used as-is and never refreshed
    AccessToken(String),
    /// Service account from which tokens are derived per scope list
    ServiceAccount(ServiceAccountKey),
}

impl Credentials {
    /// Select credentials for a connection
    ///
    /// Precedence: bearer token in `password`, then `client_secrets` in the
    /// connection extras, then the optional key file.
    pub fn from_connection(connection: &Connection, key_file: Option<&Path>) -> Result<Self> {
        if let Some(token) = connection.bearer_token() {
            return Ok(Self::AccessToken(token.to_string()));
        }

        if let Some(secrets) = connection.extra_field("client_secrets") {
            return Ok(Self::ServiceAccount(ServiceAccountKey::from_value(&secrets)?));
        }

        if let Some(path) = key_file {
            return Ok(Self::ServiceAccount(ServiceAccountKey::from_file(path)?));
        }

        Err(Error::config("No valid credentials could be found"))
    }

    /// Redirect service-account token exchange to another endpoint
    pub fn with_token_uri(self, token_uri: Option<&str>) -> Self {
        match (self, token_uri) {
            (Self::ServiceAccount(mut key), Some(uri)) => {
                key.token_uri = Some(uri.to_string());
                Self::ServiceAccount(key)
            }
            (credentials, _) => credentials,
        }
    }
}

/// Cached token with expiration
#[derive(Debug, Clone)]
pub struct CachedToken {
    /// The access token
    pub token: String,
    /// When the token expires
    pub expires_at: Option<DateTime<Utc>>,
}

impl CachedToken {
    /// Create a new cached token
    pub fn new(token: String, expires_at: Option<DateTime<Utc>>) -> Self {
        Self { token, expires_at }
    }

    /// Create a token that expires in N seconds from now
    pub fn expires_in(token: String, seconds: i64) -> Self {
        let expires_at = Utc::now() + chrono::Duration::seconds(seconds);
        Self {
            token,
            expires_at: Some(expires_at),
        }
    }

    /// Check if the token is expired (with 30 second buffer)
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => {
                let buffer = chrono::Duration::seconds(30);
                Utc::now() + buffer >= expires_at
            }
            None => false,
        }
    }
}
