//! Authentication module
//!
//! Supports: pre-obtained bearer tokens and service-account key documents.
//!
//! The `Authenticator` turns the credentials on a connection into a bearer
//! token, caching derived service-account tokens until they expire.

mod authenticator;
mod types;

pub use authenticator::Authenticator;
pub use types::{CachedToken, Credentials, ServiceAccountKey, DEFAULT_TOKEN_URI};

#[cfg(test)]
mod tests;
