//! Authenticator implementation
//!
//! Applies a bearer token to outgoing requests, deriving and caching one from
//! a service account when the connection does not carry a token directly.

use super::types::{CachedToken, Credentials, ServiceAccountKey};
use crate::error::{Error, Result};
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Lifetime requested for signed service-account assertions
const ASSERTION_LIFETIME_SECONDS: i64 = 3600;

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Authenticator handles applying authentication to HTTP requests
pub struct Authenticator {
    credentials: Credentials,
    scopes: Vec<String>,
    /// Token derived from the service account, if any
    cached_token: Arc<RwLock<Option<CachedToken>>>,
    http_client: Client,
}

impl Authenticator {
    /// Create a new authenticator scoped to the given scope list
    pub fn new(credentials: Credentials, scopes: &[&str]) -> Self {
        Self::with_client(credentials, scopes, Client::new())
    }

    /// Create an authenticator with a custom HTTP client
    pub fn with_client(credentials: Credentials, scopes: &[&str], http_client: Client) -> Self {
        Self {
            credentials,
            scopes: scopes.iter().map(|s| (*s).to_string()).collect(),
            cached_token: Arc::new(RwLock::new(None)),
            http_client,
        }
    }

    /// Apply authentication to a request builder
    pub async fn apply(&self, req: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.token().await?;
        Ok(req.bearer_auth(token))
    }

    /// Current bearer token, deriving a fresh one when needed
    pub async fn token(&self) -> Result<String> {
        match &self.credentials {
            Credentials::AccessToken(token) => Ok(token.clone()),
            Credentials::ServiceAccount(key) => self.get_or_refresh_token(key).await,
        }
    }

    async fn get_or_refresh_token(&self, key: &ServiceAccountKey) -> Result<String> {
        {
            let cached = self.cached_token.read().await;
            if let Some(token) = cached.as_ref() {
                if !token.is_expired() {
                    return Ok(token.token.clone());
                }
            }
        }

        let mut cached = self.cached_token.write().await;

        // Double-check after acquiring write lock
        if let Some(token) = cached.as_ref() {
            if !token.is_expired() {
                return Ok(token.token.clone());
            }
        }

        let new_token = self.exchange_assertion(key).await?;
        let token_str = new_token.token.clone();
        *cached = Some(new_token);

        Ok(token_str)
    }

    /// Sign a JWT assertion for the service account
    pub fn sign_assertion(&self, key: &ServiceAccountKey) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: key.client_email.clone(),
            scope: self.scopes.join(" "),
            aud: key.token_uri().to_string(),
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECONDS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid.clone_from(&key.private_key_id);

        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| Error::auth(format!("Invalid private key: {e}")))?;

        encode(&header, &claims, &encoding_key)
            .map_err(|e| Error::auth(format!("Failed to encode JWT: {e}")))
    }

    /// Exchange a signed assertion for an access token at the key's token URI
    async fn exchange_assertion(&self, key: &ServiceAccountKey) -> Result<CachedToken> {
        let jwt = self.sign_assertion(key)?;
        let token_uri = key.token_uri();

        debug!(
            "Requesting access token for {} from {token_uri}",
            key.client_email
        );

        let form = [("grant_type", JWT_BEARER_GRANT), ("assertion", jwt.as_str())];

        let response = self
            .http_client
            .post(token_uri)
            .form(&form)
            .send()
            .await
            .map_err(|e| Error::auth(format!("Token request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::auth(format!(
                "JWT token exchange failed with status {status}: {body}"
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::auth(format!("Malformed token response: {e}")))?;
        Ok(token_response.into_cached_token())
    }

    /// Clear the cached token (forces a new exchange on next use)
    pub async fn clear_cache(&self) {
        let mut cached = self.cached_token.write().await;
        *cached = None;
    }

    /// Scopes this authenticator requests
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// The credentials in use
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("credentials", &self.credentials)
            .field("scopes", &self.scopes)
            .finish_non_exhaustive()
    }
}

/// OAuth2 token response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl TokenResponse {
    fn into_cached_token(self) -> CachedToken {
        match self.expires_in {
            Some(secs) => CachedToken::expires_in(self.access_token, secs),
            None => CachedToken::new(self.access_token, None),
        }
    }
}

/// Claims of a service-account assertion
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct AssertionClaims {
    pub(crate) iss: String,
    pub(crate) scope: String,
    pub(crate) aud: String,
    pub(crate) iat: i64,
    pub(crate) exp: i64,
}
