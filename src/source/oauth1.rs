// ABOUTME: OAuth 1.0a request signing (HMAC-SHA1, RFC 5849) and source wrapper
// ABOUTME: Keeps signature construction pure; callers supply the token secret
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use crate::config::AuthConfig;
use crate::errors::{AuthError, AuthResult};
use crate::http::{HttpMethod, HttpRequest};
use crate::models::{AuthCallback, AuthToken};
use crate::source::{AuthSource, SourceSpec};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha1::Sha1;
use url::Url;

type HmacSha1 = Hmac<Sha1>;

/// RFC 3986 percent-encoding as RFC 5849 section 3.6 requires: everything
/// except unreserved characters.
fn percent_encode(input: &str) -> String {
    urlencoding::encode(input).into_owned()
}

fn nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

fn timestamp() -> String {
    chrono::Utc::now().timestamp().to_string()
}

/// Signature base string per RFC 5849 section 3.4.1: method, the URL without
/// its query, and all parameters (query plus oauth protocol parameters)
/// encoded, sorted, and joined.
fn signature_base_string(
    method: HttpMethod,
    url: &Url,
    oauth_params: &[(String, String)],
) -> String {
    let mut base_url = url.clone();
    base_url.set_query(None);
    base_url.set_fragment(None);

    let mut encoded: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (percent_encode(&k), percent_encode(&v)))
        .chain(
            oauth_params
                .iter()
                .map(|(k, v)| (percent_encode(k), percent_encode(v))),
        )
        .collect();
    encoded.sort();

    let params = encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let method = match method {
        HttpMethod::Get => "GET",
        HttpMethod::Post => "POST",
    };
    format!(
        "{method}&{}&{}",
        percent_encode(base_url.as_str()),
        percent_encode(&params)
    )
}

/// HMAC-SHA1 signature over the base string, keyed by the encoded consumer
/// secret and token secret (empty for the temporary-credential request).
fn sign(base_string: &str, consumer_secret: &str, token_secret: &str) -> AuthResult<String> {
    let key = format!(
        "{}&{}",
        percent_encode(consumer_secret),
        percent_encode(token_secret)
    );
    let mut mac = HmacSha1::new_from_slice(key.as_bytes())
        .map_err(|e| AuthError::TokenExchangeFailed(format!("hmac key error: {e}")))?;
    mac.update(base_string.as_bytes());
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

/// Build a signed request with an `Authorization: OAuth ...` header.
fn signed_request(
    method: HttpMethod,
    url: &str,
    config: &AuthConfig,
    token_secret: &str,
    mut oauth_params: Vec<(String, String)>,
) -> AuthResult<HttpRequest> {
    let parsed = Url::parse(url)?;
    oauth_params.push(("oauth_consumer_key".into(), config.client_id.clone()));
    oauth_params.push(("oauth_nonce".into(), nonce()));
    oauth_params.push(("oauth_signature_method".into(), "HMAC-SHA1".into()));
    oauth_params.push(("oauth_timestamp".into(), timestamp()));
    oauth_params.push(("oauth_version".into(), "1.0".into()));

    let base = signature_base_string(method, &parsed, &oauth_params);
    let signature = sign(&base, &config.client_secret, token_secret)?;
    oauth_params.push(("oauth_signature".into(), signature));
    oauth_params.sort();

    let header_value = format!(
        "OAuth {}",
        oauth_params
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
            .collect::<Vec<_>>()
            .join(", ")
    );

    let request = match method {
        HttpMethod::Get => HttpRequest::get(url),
        HttpMethod::Post => HttpRequest::post(url).form(Vec::new()),
    };
    Ok(request.header("Authorization", header_value))
}

/// Parse the form-encoded temporary-credential response into
/// `(oauth_token, oauth_token_secret)`.
pub fn parse_temporary_credentials(raw: &str) -> AuthResult<(String, String)> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(raw).map_err(|e| {
        AuthError::TokenExchangeFailed(format!("unparseable request token response: {e}"))
    })?;
    let mut token = None;
    let mut secret = None;
    for (key, value) in pairs {
        match key.as_str() {
            "oauth_token" => token = Some(value),
            "oauth_token_secret" => secret = Some(value),
            _ => {}
        }
    }
    match (token, secret) {
        (Some(token), Some(secret)) => Ok((token, secret)),
        _ => Err(AuthError::TokenExchangeFailed(
            "request token response lacks oauth_token or oauth_token_secret".into(),
        )),
    }
}

/// An OAuth 1.0a source (Twitter). Signing needs the consumer secret and,
/// after the redirect, the temporary-credential secret; the orchestrator
/// supplies the latter from its cache so the source stays stateless.
pub struct Oauth1Source {
    spec: SourceSpec,
}

impl Oauth1Source {
    #[must_use]
    pub const fn new(spec: SourceSpec) -> Self {
        Self { spec }
    }
}

impl AuthSource for Oauth1Source {
    fn spec(&self) -> &SourceSpec {
        &self.spec
    }

    fn oauth1_request_token(&self, config: &AuthConfig) -> AuthResult<HttpRequest> {
        let endpoint = self.spec.request_token_url.ok_or_else(|| {
            AuthError::UnsupportedOperation(format!(
                "{} lacks a request token endpoint",
                self.spec.name
            ))
        })?;
        signed_request(
            HttpMethod::Post,
            endpoint,
            config,
            "",
            vec![("oauth_callback".into(), config.redirect_uri.clone())],
        )
    }

    fn oauth1_token_request(
        &self,
        config: &AuthConfig,
        callback: &AuthCallback,
        token_secret: &str,
    ) -> AuthResult<HttpRequest> {
        let oauth_token = callback
            .oauth_token
            .as_deref()
            .ok_or_else(|| AuthError::InvalidCallback("missing oauth_token".into()))?;
        let verifier = callback
            .oauth_verifier
            .as_deref()
            .ok_or_else(|| AuthError::InvalidCallback("missing oauth_verifier".into()))?;
        signed_request(
            HttpMethod::Post,
            self.spec.token_url,
            config,
            token_secret,
            vec![
                ("oauth_token".into(), oauth_token.to_owned()),
                ("oauth_verifier".into(), verifier.to_owned()),
            ],
        )
    }

    /// Token-credential responses are form-encoded and keyed `oauth_token`
    /// rather than `access_token`.
    fn parse_token_response(&self, raw: &str) -> AuthResult<AuthToken> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(raw).map_err(|e| {
            AuthError::TokenExchangeFailed(format!("unparseable token response: {e}"))
        })?;
        let mut access_token = None;
        let mut token_secret = None;
        let mut uid = None;
        let mut extras = std::collections::HashMap::new();
        for (key, value) in pairs {
            match key.as_str() {
                "oauth_token" => access_token = Some(value),
                "oauth_token_secret" => token_secret = Some(value),
                "user_id" => uid = Some(value),
                _ => {
                    extras.insert(key, serde_json::Value::String(value));
                }
            }
        }
        let access_token = access_token.ok_or_else(|| {
            AuthError::TokenExchangeFailed("response lacks an oauth_token field".into())
        })?;
        let mut token = AuthToken::new(access_token);
        token.token_secret = token_secret;
        token.uid = uid;
        token.extras = extras;
        Ok(token)
    }

    /// Profile fetches are signed like every other 1.0a request, with the
    /// token credentials alongside the consumer credentials.
    fn profile_request(
        &self,
        config: &AuthConfig,
        token: &AuthToken,
    ) -> AuthResult<Option<HttpRequest>> {
        let Some(endpoint) = config.profile_endpoint.as_deref().or(self.spec.profile_url) else {
            return Ok(None);
        };
        let secret = token.token_secret.as_deref().unwrap_or("");
        let request = signed_request(
            HttpMethod::Get,
            endpoint,
            config,
            secret,
            vec![("oauth_token".into(), token.access_token.clone())],
        )?;
        Ok(Some(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Worked example from RFC 5849 section 3.4.1.1 (parameter normalization
    // folded into the full base string).
    #[test]
    fn test_signature_base_string_sorts_and_encodes() {
        let url = Url::parse("http://example.com/request?b5=%3D%253D&a3=a&c%40=&a2=r%20b").unwrap();
        let oauth_params = vec![
            ("oauth_consumer_key".to_owned(), "9djdj82h48djs9d2".to_owned()),
            ("oauth_token".to_owned(), "kkk9d7dh3k39sjv7".to_owned()),
        ];
        let base = signature_base_string(HttpMethod::Get, &url, &oauth_params);
        assert!(base.starts_with("GET&http%3A%2F%2Fexample.com%2Frequest&"));
        assert!(base.contains("a2%3Dr%2520b"));
        assert!(base.contains("oauth_consumer_key%3D9djdj82h48djs9d2"));
    }

    #[test]
    fn test_hmac_sha1_signature_is_deterministic() {
        let first = sign("GET&base&string", "secret", "token_secret").unwrap();
        let second = sign("GET&base&string", "secret", "token_secret").unwrap();
        assert_eq!(first, second);
        assert_ne!(first, sign("GET&base&string", "secret", "other").unwrap());
    }

    #[test]
    fn test_parse_temporary_credentials() {
        let (token, secret) =
            parse_temporary_credentials("oauth_token=abc&oauth_token_secret=xyz&oauth_callback_confirmed=true")
                .unwrap();
        assert_eq!(token, "abc");
        assert_eq!(secret, "xyz");
        assert!(parse_temporary_credentials("oauth_token=abc").is_err());
    }

    #[test]
    fn test_nonce_is_unique() {
        assert_ne!(nonce(), nonce());
        assert_eq!(nonce().len(), 32);
    }
}
