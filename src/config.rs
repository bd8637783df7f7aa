// ABOUTME: Immutable per-provider OAuth credentials and endpoint overrides
// ABOUTME: Validated at construction; shared read-only across concurrent flows
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use crate::errors::{AuthError, AuthResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-provider OAuth credentials and endpoints.
///
/// Immutable once constructed. An [`crate::AuthRequest`] built from a config
/// owns it exclusively; configs produced by a resolver function are shared
/// read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    /// Requested scopes. When empty, the source's default scopes apply.
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Override for the source's authorize endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorize_endpoint: Option<String>,
    /// Override for the source's token endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_endpoint: Option<String>,
    /// Override for the source's profile endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_endpoint: Option<String>,
    /// Provider-specific extension values (e.g. WeChat component app id).
    #[serde(default)]
    pub extras: HashMap<String, serde_json::Value>,
}

impl AuthConfig {
    /// Create a validated config.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::ConfigResolution`] when `client_id` or
    /// `client_secret` is empty.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> AuthResult<Self> {
        let config = Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            scopes: Vec::new(),
            authorize_endpoint: None,
            token_endpoint: None,
            profile_endpoint: None,
            extras: HashMap::new(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Set requested scopes, replacing the source defaults.
    #[must_use]
    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    /// Attach a provider-specific extension value.
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extras.insert(key.into(), value);
        self
    }

    /// Validate completeness.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::ConfigResolution`] on empty credentials.
    pub fn validate(&self) -> AuthResult<()> {
        if self.client_id.is_empty() {
            return Err(AuthError::ConfigResolution("client_id must not be empty".into()));
        }
        if self.client_secret.is_empty() {
            return Err(AuthError::ConfigResolution(
                "client_secret must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Fetch a string-valued extra.
    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extras.get(key).and_then(serde_json::Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_credentials() {
        assert!(AuthConfig::new("", "secret", "http://x/cb").is_err());
        assert!(AuthConfig::new("id", "", "http://x/cb").is_err());
        assert!(AuthConfig::new("id", "secret", "http://x/cb").is_ok());
    }

    #[test]
    fn test_extras_roundtrip() {
        let config = AuthConfig::new("id", "secret", "http://x/cb")
            .unwrap()
            .with_extra("component_appid", serde_json::json!("wx123"));
        assert_eq!(config.extra_str("component_appid"), Some("wx123"));
        assert_eq!(config.extra_str("missing"), None);
    }
}
