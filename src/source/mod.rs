// ABOUTME: Provider source abstraction: descriptors plus pure mapping rules
// ABOUTME: Isolates per-provider endpoint shapes, parameter names, and response schemas
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

/// Built-in provider descriptors
pub mod builtin;
/// OAuth 1.0a request signing and source wrapper
pub mod oauth1;

use crate::config::AuthConfig;
use crate::errors::{AuthError, AuthResult};
use crate::http::HttpRequest;
use crate::models::{AuthCallback, AuthToken, AuthUser, Gender};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde_json::Value;
use url::Url;

/// The OAuth variant a provider speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantFlavor {
    /// OAuth 2.0 authorization-code grant.
    AuthorizationCode,
    /// OAuth 1.0a request-token / signature flow.
    OAuth1a,
}

/// How the token endpoint wants the exchange request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRequestStyle {
    /// POST with credentials as form fields.
    PostForm,
    /// POST with credentials in a Basic Authorization header (Fitbit-style).
    PostFormBasicAuth,
    /// GET with everything in the query string (WeChat-style).
    GetQuery,
}

/// How the token endpoint encodes its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenResponseFormat {
    Json,
    /// `application/x-www-form-urlencoded` text (GitHub without the Accept
    /// header, Twitter, QQ).
    FormEncoded,
}

/// Where the profile call carries the access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPlacement {
    /// `Authorization: Bearer <token>` header.
    BearerHeader,
    /// Custom Authorization header prefix (`token <t>` for GitHub's older API).
    HeaderPrefix(&'static str),
    /// Query parameter with the given name.
    QueryParam(&'static str),
}

/// Extra identity parameter some profile endpoints require alongside the
/// access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityQueryParam {
    None,
    /// Append the token's `open_id` under the given name (WeChat, Douyin).
    OpenId(&'static str),
    /// Append the token's `uid` under the given name (Weibo).
    Uid(&'static str),
}

/// Field-mapping table from a provider's profile payload to the normalized
/// identity. Values are JSON pointers into the raw response.
#[derive(Debug, Clone, Copy)]
pub struct ProfileMap {
    pub uid: &'static str,
    pub username: &'static str,
    pub nickname: Option<&'static str>,
    pub avatar: Option<&'static str>,
    pub email: Option<&'static str>,
    pub remark: Option<&'static str>,
    pub gender: Option<&'static str>,
    /// Key whose (truthy) presence marks an error despite HTTP 200.
    pub error_key: Option<&'static str>,
    pub error_detail_key: Option<&'static str>,
}

impl ProfileMap {
    pub const DEFAULT: Self = Self {
        uid: "/id",
        username: "/name",
        nickname: None,
        avatar: None,
        email: None,
        remark: None,
        gender: None,
        error_key: None,
        error_detail_key: None,
    };
}

/// Static descriptor for one provider: endpoints, grant flavor, parameter
/// naming, response shapes, and the profile mapping table. Stateless and
/// shared by all requests for that provider.
#[derive(Debug, Clone, Copy)]
pub struct SourceSpec {
    pub name: &'static str,
    pub grant: GrantFlavor,
    pub authorize_url: &'static str,
    pub token_url: &'static str,
    /// `None` means the token response already carries the identity.
    pub profile_url: Option<&'static str>,
    /// OAuth 1.0a temporary-credential endpoint.
    pub request_token_url: Option<&'static str>,
    pub refresh_url: Option<&'static str>,
    pub revoke_url: Option<&'static str>,
    /// `client_id` vs `appid` vs `app_key` -- the central naming divergence.
    pub client_id_param: &'static str,
    pub client_secret_param: &'static str,
    /// Space, comma, or plus; providers disagree on scope formatting.
    pub scope_delimiter: &'static str,
    pub default_scopes: &'static [&'static str],
    pub token_style: TokenRequestStyle,
    pub token_format: TokenResponseFormat,
    /// JSON pointer to the object holding token fields when nested (Douyin
    /// wraps them under `data`).
    pub token_root: Option<&'static str>,
    /// Key marking a provider error in a 200 token response (`error`,
    /// `errcode`).
    pub token_error_key: Option<&'static str>,
    pub token_error_detail_key: Option<&'static str>,
    pub token_placement: TokenPlacement,
    pub profile_identity_param: IdentityQueryParam,
    /// Fixed query parameters some profile endpoints need (`site=stackoverflow`).
    pub profile_extra_query: &'static [(&'static str, &'static str)],
    /// Literal fragment appended to the authorize URL (`#wechat_redirect`).
    pub authorize_fragment: Option<&'static str>,
    pub extra_authorize_params: &'static [(&'static str, &'static str)],
    pub profile: ProfileMap,
}

impl SourceSpec {
    /// Baseline OAuth 2.0 descriptor; providers override what diverges.
    pub const DEFAULT: Self = Self {
        name: "",
        grant: GrantFlavor::AuthorizationCode,
        authorize_url: "",
        token_url: "",
        profile_url: None,
        request_token_url: None,
        refresh_url: None,
        revoke_url: None,
        client_id_param: "client_id",
        client_secret_param: "client_secret",
        scope_delimiter: " ",
        default_scopes: &[],
        token_style: TokenRequestStyle::PostForm,
        token_format: TokenResponseFormat::Json,
        token_root: None,
        token_error_key: Some("error"),
        token_error_detail_key: Some("error_description"),
        token_placement: TokenPlacement::BearerHeader,
        profile_identity_param: IdentityQueryParam::None,
        profile_extra_query: &[],
        authorize_fragment: None,
        extra_authorize_params: &[],
        profile: ProfileMap::DEFAULT,
    };
}

/// Stringify a JSON scalar (ids arrive as numbers on half the providers).
fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn pointer_string(value: &Value, pointer: &str) -> Option<String> {
    value.pointer(pointer).and_then(value_to_string)
}

/// Truthiness test for provider error keys: `0`, `null`, and `""` mean no
/// error (WeChat reports `errcode: 0` on success in some responses).
fn is_error_value(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Number(n) => n.as_i64() != Some(0),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// A provider source: a descriptor plus pure mapping functions.
///
/// Default implementations are driven entirely by the [`SourceSpec`]; only
/// providers with genuinely divergent behavior (OAuth 1.0a signatures)
/// override methods. Implementations hold no mutable state and are shared
/// across concurrent login attempts.
pub trait AuthSource: Send + Sync {
    fn spec(&self) -> &SourceSpec;

    fn name(&self) -> &str {
        self.spec().name
    }

    /// Scope string: config scopes when supplied, else the source defaults,
    /// joined with the source's delimiter. `None` when both are empty.
    fn scope_string(&self, config: &AuthConfig) -> Option<String> {
        let spec = self.spec();
        let joined = if config.scopes.is_empty() {
            spec.default_scopes.join(spec.scope_delimiter)
        } else {
            config.scopes.join(spec.scope_delimiter)
        };
        (!joined.is_empty()).then_some(joined)
    }

    /// Build the provider authorize URL for a minted state token.
    fn authorize_url(&self, config: &AuthConfig, state: &str) -> AuthResult<String> {
        let spec = self.spec();
        let base = config
            .authorize_endpoint
            .as_deref()
            .unwrap_or(spec.authorize_url);
        let mut url = Url::parse(base)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair(spec.client_id_param, &config.client_id)
                .append_pair("redirect_uri", &config.redirect_uri)
                .append_pair("response_type", "code")
                .append_pair("state", state);
            if let Some(scope) = self.scope_string(config) {
                pairs.append_pair("scope", &scope);
            }
            for (key, value) in spec.extra_authorize_params {
                pairs.append_pair(key, value);
            }
        }
        let mut out = url.to_string();
        if let Some(fragment) = spec.authorize_fragment {
            out.push_str(fragment);
        }
        Ok(out)
    }

    /// Descriptor for the code-for-token exchange request.
    fn token_request(&self, config: &AuthConfig, callback: &AuthCallback) -> AuthResult<HttpRequest> {
        let spec = self.spec();
        let code = callback
            .code
            .as_deref()
            .ok_or_else(|| AuthError::InvalidCallback("missing authorization code".into()))?;
        let endpoint = config.token_endpoint.as_deref().unwrap_or(spec.token_url);

        match spec.token_style {
            TokenRequestStyle::PostForm => {
                let fields = vec![
                    (spec.client_id_param.to_owned(), config.client_id.clone()),
                    (spec.client_secret_param.to_owned(), config.client_secret.clone()),
                    ("code".to_owned(), code.to_owned()),
                    ("grant_type".to_owned(), "authorization_code".to_owned()),
                    ("redirect_uri".to_owned(), config.redirect_uri.clone()),
                ];
                Ok(HttpRequest::post(endpoint)
                    .header("Accept", "application/json")
                    .form(fields))
            }
            TokenRequestStyle::PostFormBasicAuth => {
                let credentials =
                    BASE64.encode(format!("{}:{}", config.client_id, config.client_secret));
                let fields = vec![
                    (spec.client_id_param.to_owned(), config.client_id.clone()),
                    ("code".to_owned(), code.to_owned()),
                    ("grant_type".to_owned(), "authorization_code".to_owned()),
                    ("redirect_uri".to_owned(), config.redirect_uri.clone()),
                ];
                Ok(HttpRequest::post(endpoint)
                    .header("Authorization", format!("Basic {credentials}"))
                    .header("Accept", "application/json")
                    .form(fields))
            }
            TokenRequestStyle::GetQuery => {
                let mut url = Url::parse(endpoint)?;
                url.query_pairs_mut()
                    .append_pair(spec.client_id_param, &config.client_id)
                    .append_pair(spec.client_secret_param, &config.client_secret)
                    .append_pair("code", code)
                    .append_pair("grant_type", "authorization_code");
                Ok(HttpRequest::get(url.to_string()))
            }
        }
    }

    /// Parse the raw token-endpoint body into an [`AuthToken`], preserving
    /// unmapped fields in `extras`.
    fn parse_token_response(&self, raw: &str) -> AuthResult<AuthToken> {
        let spec = self.spec();
        let parsed: Value = match spec.token_format {
            TokenResponseFormat::Json => serde_json::from_str(raw).map_err(|e| {
                AuthError::TokenExchangeFailed(format!("unparseable token response: {e}"))
            })?,
            TokenResponseFormat::FormEncoded => {
                let pairs: Vec<(String, String)> = serde_urlencoded::from_str(raw).map_err(|e| {
                    AuthError::TokenExchangeFailed(format!("unparseable token response: {e}"))
                })?;
                Value::Object(
                    pairs
                        .into_iter()
                        .map(|(k, v)| (k, Value::String(v)))
                        .collect(),
                )
            }
        };

        let body = spec
            .token_root
            .and_then(|root| parsed.pointer(root))
            .unwrap_or(&parsed);

        if let Some(error_key) = spec.token_error_key {
            if let Some(error) = body.get(error_key) {
                if is_error_value(error) {
                    let detail = spec
                        .token_error_detail_key
                        .and_then(|key| body.get(key))
                        .and_then(value_to_string)
                        .unwrap_or_else(|| error.to_string());
                    return Err(AuthError::TokenExchangeFailed(detail));
                }
            }
        }

        let Some(object) = body.as_object() else {
            return Err(AuthError::TokenExchangeFailed(
                "token response is not an object".into(),
            ));
        };

        let access_token = object
            .get("access_token")
            .and_then(value_to_string)
            .ok_or_else(|| {
                AuthError::TokenExchangeFailed("response lacks an access_token field".into())
            })?;

        let mut token = AuthToken::new(access_token);
        for (key, value) in object {
            match key.as_str() {
                "access_token" => {}
                "token_type" => token.token_type = value_to_string(value),
                "refresh_token" => token.refresh_token = value_to_string(value),
                "expires_in" => {
                    token.expires_in = value
                        .as_i64()
                        .or_else(|| value.as_str().and_then(|s| s.parse().ok()));
                }
                "scope" => token.scope = value_to_string(value),
                "openid" | "open_id" => token.open_id = value_to_string(value),
                "unionid" | "union_id" => token.union_id = value_to_string(value),
                "uid" | "user_id" => token.uid = value_to_string(value),
                "oauth_token_secret" => token.token_secret = value_to_string(value),
                _ => {
                    token.extras.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(token)
    }

    /// Descriptor for the profile fetch, or `None` when the token response
    /// already carries the identity.
    fn profile_request(
        &self,
        config: &AuthConfig,
        token: &AuthToken,
    ) -> AuthResult<Option<HttpRequest>> {
        let spec = self.spec();
        let Some(endpoint) = config.profile_endpoint.as_deref().or(spec.profile_url) else {
            return Ok(None);
        };

        let mut url = Url::parse(endpoint)?;
        let mut headers: Vec<(String, String)> = vec![("Accept".into(), "application/json".into())];

        match spec.token_placement {
            TokenPlacement::BearerHeader => {
                headers.push(("Authorization".into(), format!("Bearer {}", token.access_token)));
            }
            TokenPlacement::HeaderPrefix(prefix) => {
                headers.push((
                    "Authorization".into(),
                    format!("{prefix} {}", token.access_token),
                ));
            }
            TokenPlacement::QueryParam(param) => {
                url.query_pairs_mut().append_pair(param, &token.access_token);
            }
        }

        match spec.profile_identity_param {
            IdentityQueryParam::None => {}
            IdentityQueryParam::OpenId(param) => {
                let open_id = token.open_id.as_deref().ok_or_else(|| {
                    AuthError::ProfileFetchFailed("token response lacks openid".into())
                })?;
                url.query_pairs_mut().append_pair(param, open_id);
            }
            IdentityQueryParam::Uid(param) => {
                let uid = token.uid.as_deref().ok_or_else(|| {
                    AuthError::ProfileFetchFailed("token response lacks uid".into())
                })?;
                url.query_pairs_mut().append_pair(param, uid);
            }
        }

        for (key, value) in spec.profile_extra_query {
            url.query_pairs_mut().append_pair(key, value);
        }

        let mut request = HttpRequest::get(url.to_string());
        request.headers = headers;
        Ok(Some(request))
    }

    /// Map the raw profile payload through the source's field table. Unmapped
    /// fields stay available in `raw`.
    fn parse_profile_response(&self, raw: &str, token: &AuthToken) -> AuthResult<AuthUser> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| AuthError::ProfileFetchFailed(format!("unparseable profile: {e}")))?;
        let map = &self.spec().profile;

        if let Some(error_key) = map.error_key {
            if let Some(error) = value.pointer(error_key) {
                if is_error_value(error) {
                    let detail = map
                        .error_detail_key
                        .and_then(|key| value.pointer(key))
                        .and_then(value_to_string)
                        .unwrap_or_else(|| error.to_string());
                    return Err(AuthError::ProfileFetchFailed(detail));
                }
            }
        }

        let uid = pointer_string(&value, map.uid).ok_or_else(|| {
            AuthError::ProfileFetchFailed(format!("profile lacks id field {}", map.uid))
        })?;
        let username = pointer_string(&value, map.username).unwrap_or_else(|| uid.clone());
        let gender = Gender::from_code(
            map.gender
                .and_then(|pointer| pointer_string(&value, pointer))
                .as_deref(),
        );

        Ok(AuthUser {
            source: self.name().to_owned(),
            uid,
            username,
            nickname: map.nickname.and_then(|p| pointer_string(&value, p)),
            avatar: map.avatar.and_then(|p| pointer_string(&value, p)),
            email: map.email.and_then(|p| pointer_string(&value, p)),
            remark: map.remark.and_then(|p| pointer_string(&value, p)),
            gender,
            raw: value,
            token: token.clone(),
        })
    }

    /// Fallback identity for sources whose token response embeds the user.
    fn identity_from_token(&self, token: &AuthToken) -> AuthResult<AuthUser> {
        let uid = token
            .uid
            .clone()
            .or_else(|| token.open_id.clone())
            .ok_or_else(|| {
                AuthError::ProfileFetchFailed("token response carries no user identity".into())
            })?;
        Ok(AuthUser {
            source: self.name().to_owned(),
            uid: uid.clone(),
            username: uid,
            nickname: None,
            avatar: None,
            email: None,
            remark: None,
            gender: Gender::Unknown,
            raw: serde_json::to_value(&token.extras)?,
            token: token.clone(),
        })
    }

    /// Descriptor for a refresh-token request.
    fn refresh_request(&self, config: &AuthConfig, refresh_token: &str) -> AuthResult<HttpRequest> {
        let spec = self.spec();
        let endpoint = spec.refresh_url.ok_or_else(|| {
            AuthError::UnsupportedOperation(format!("{} does not support token refresh", spec.name))
        })?;
        let fields = vec![
            (spec.client_id_param.to_owned(), config.client_id.clone()),
            (spec.client_secret_param.to_owned(), config.client_secret.clone()),
            ("refresh_token".to_owned(), refresh_token.to_owned()),
            ("grant_type".to_owned(), "refresh_token".to_owned()),
        ];
        Ok(HttpRequest::post(endpoint)
            .header("Accept", "application/json")
            .form(fields))
    }

    /// Descriptor for a token-revocation request.
    fn revoke_request(&self, config: &AuthConfig, access_token: &str) -> AuthResult<HttpRequest> {
        let spec = self.spec();
        let endpoint = spec.revoke_url.ok_or_else(|| {
            AuthError::UnsupportedOperation(format!(
                "{} does not support token revocation",
                spec.name
            ))
        })?;
        let fields = vec![
            (spec.client_id_param.to_owned(), config.client_id.clone()),
            ("access_token".to_owned(), access_token.to_owned()),
        ];
        Ok(HttpRequest::post(endpoint).form(fields))
    }

    // OAuth 1.0a hooks. The orchestrator calls these only for sources whose
    // grant flavor is OAuth1a; `oauth1::Oauth1Source` provides them.

    fn oauth1_request_token(&self, _config: &AuthConfig) -> AuthResult<HttpRequest> {
        Err(AuthError::UnsupportedOperation(format!(
            "{} is not an OAuth 1.0a source",
            self.name()
        )))
    }

    fn oauth1_authorize_url(&self, oauth_token: &str) -> AuthResult<String> {
        let mut url = Url::parse(self.spec().authorize_url)?;
        url.query_pairs_mut().append_pair("oauth_token", oauth_token);
        Ok(url.to_string())
    }

    fn oauth1_token_request(
        &self,
        _config: &AuthConfig,
        _callback: &AuthCallback,
        _token_secret: &str,
    ) -> AuthResult<HttpRequest> {
        Err(AuthError::UnsupportedOperation(format!(
            "{} is not an OAuth 1.0a source",
            self.name()
        )))
    }
}

/// A source fully described by its descriptor; the common case.
pub struct DescriptorSource {
    spec: SourceSpec,
}

impl DescriptorSource {
    #[must_use]
    pub const fn new(spec: SourceSpec) -> Self {
        Self { spec }
    }
}

impl AuthSource for DescriptorSource {
    fn spec(&self) -> &SourceSpec {
        &self.spec
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_value_truthiness() {
        assert!(!is_error_value(&Value::Null));
        assert!(!is_error_value(&serde_json::json!(0)));
        assert!(!is_error_value(&serde_json::json!("")));
        assert!(is_error_value(&serde_json::json!(40029)));
        assert!(is_error_value(&serde_json::json!("invalid_grant")));
    }

    #[test]
    fn test_value_to_string_handles_numeric_ids() {
        assert_eq!(value_to_string(&serde_json::json!(12345)), Some("12345".into()));
        assert_eq!(value_to_string(&serde_json::json!("abc")), Some("abc".into()));
        assert_eq!(value_to_string(&serde_json::json!({"x": 1})), None);
    }
}
