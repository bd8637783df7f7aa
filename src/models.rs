// ABOUTME: Wire-facing data models for the OAuth flow
// ABOUTME: Callback payload, provider token response, and the normalized identity
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Parameters a provider sends to the redirect URI after user consent.
///
/// Providers disagree on field names (`code` vs `auth_code` vs
/// `authorization_code`); [`AuthCallback::from_params`] folds the aliases into
/// `code` and keeps everything it does not recognize in `extras`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthCallback {
    pub code: Option<String>,
    pub state: Option<String>,
    /// OAuth 1.0a temporary credential returned by the provider.
    pub oauth_token: Option<String>,
    /// OAuth 1.0a verifier accompanying `oauth_token`.
    pub oauth_verifier: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
    #[serde(default)]
    pub extras: HashMap<String, String>,
}

impl AuthCallback {
    /// Build from an arbitrary string-keyed parameter map (query or form).
    pub fn from_params<I, K, V>(params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut callback = Self::default();
        for (key, value) in params {
            let key = key.into();
            let value = value.into();
            match key.as_str() {
                "code" => callback.code = Some(value),
                // Alipay sends auth_code, Huawei sends authorization_code
                "auth_code" | "authorization_code" => {
                    if callback.code.is_none() {
                        callback.code = Some(value);
                    }
                }
                "state" => callback.state = Some(value),
                "oauth_token" => callback.oauth_token = Some(value),
                "oauth_verifier" => callback.oauth_verifier = Some(value),
                "error" => callback.error = Some(value),
                "error_description" => callback.error_description = Some(value),
                _ => {
                    callback.extras.insert(key, value);
                }
            }
        }
        callback
    }

    /// Convenience constructor for the common code+state callback.
    pub fn new(code: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            state: Some(state.into()),
            ..Self::default()
        }
    }
}

/// Token material returned by a provider's token endpoint.
///
/// Never persisted by the core beyond the current call; the caller owns it
/// after `login` returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthToken {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Lifetime in seconds as reported by the provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Provider-native user id when embedded in the token response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub union_id: Option<String>,
    /// OAuth 1.0a token secret paired with `access_token`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_secret: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Response fields the mapping table does not cover.
    #[serde(default)]
    pub extras: HashMap<String, serde_json::Value>,
}

impl AuthToken {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: None,
            refresh_token: None,
            expires_in: None,
            scope: None,
            uid: None,
            open_id: None,
            union_id: None,
            token_secret: None,
            created_at: Utc::now(),
            extras: HashMap::new(),
        }
    }

    /// Whether the token's reported lifetime has elapsed. Tokens without a
    /// lifetime never expire from the client's point of view.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_in
            .filter(|secs| *secs > 0)
            .is_some_and(|secs| Utc::now() > self.created_at + Duration::seconds(secs))
    }
}

/// User gender as normalized from heterogeneous provider codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Unknown,
}

impl Gender {
    /// Parse provider codes: `1`/`m`/`male`, `2`/`f`/`female`, anything else
    /// is unknown.
    pub fn from_code(code: Option<&str>) -> Self {
        match code.map(str::to_ascii_lowercase).as_deref() {
            Some("1" | "m" | "male") => Self::Male,
            Some("2" | "f" | "female") => Self::Female,
            _ => Self::Unknown,
        }
    }
}

/// The normalized identity: terminal artifact of a successful `login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    /// Provider key this identity came from.
    pub source: String,
    /// Provider-native user id.
    pub uid: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
    pub gender: Gender,
    /// Raw provider payload for callers needing unmapped fields.
    pub raw: serde_json::Value,
    pub token: AuthToken,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_aliases_fold_into_code() {
        let callback = AuthCallback::from_params([("auth_code", "abc"), ("state", "s1")]);
        assert_eq!(callback.code.as_deref(), Some("abc"));
        assert_eq!(callback.state.as_deref(), Some("s1"));
    }

    #[test]
    fn test_callback_unknown_keys_preserved() {
        let callback =
            AuthCallback::from_params([("code", "c"), ("appid_echo", "wx1"), ("lang", "zh_CN")]);
        assert_eq!(callback.extras.get("appid_echo").map(String::as_str), Some("wx1"));
        assert_eq!(callback.extras.len(), 2);
    }

    #[test]
    fn test_canonical_code_wins_over_alias() {
        let callback = AuthCallback::from_params([("auth_code", "alias"), ("code", "real")]);
        assert_eq!(callback.code.as_deref(), Some("real"));
    }

    #[test]
    fn test_token_expiry() {
        let mut token = AuthToken::new("t");
        assert!(!token.is_expired());

        token.expires_in = Some(3600);
        assert!(!token.is_expired());

        token.created_at = Utc::now() - Duration::seconds(7200);
        assert!(token.is_expired());

        // Zero or negative lifetime means "does not expire"
        token.expires_in = Some(0);
        assert!(!token.is_expired());
    }

    #[test]
    fn test_gender_codes() {
        assert_eq!(Gender::from_code(Some("1")), Gender::Male);
        assert_eq!(Gender::from_code(Some("M")), Gender::Male);
        assert_eq!(Gender::from_code(Some("female")), Gender::Female);
        assert_eq!(Gender::from_code(Some("x")), Gender::Unknown);
        assert_eq!(Gender::from_code(None), Gender::Unknown);
    }
}
