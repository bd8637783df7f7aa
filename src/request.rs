// ABOUTME: Login orchestrator: drives authorize, token exchange, and profile
// ABOUTME: fetch against one source, owning state anti-forgery and timeouts
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use crate::cache::CacheStore;
use crate::config::AuthConfig;
use crate::errors::{AuthError, AuthResult};
use crate::http::{HttpRequest, HttpResponse, HttpTransport};
use crate::models::{AuthCallback, AuthToken, AuthUser};
use crate::source::{oauth1, AuthSource, GrantFlavor};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A configured login flow for one provider. Cheap to clone; holds no
/// per-attempt state, so one instance serves concurrent logins.
#[derive(Clone)]
pub struct AuthRequest {
    source: Arc<dyn AuthSource>,
    config: AuthConfig,
    cache: Arc<dyn CacheStore>,
    transport: Arc<dyn HttpTransport>,
    timeout: Duration,
    state_ttl: Duration,
}

impl std::fmt::Debug for AuthRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthRequest")
            .field("source", &self.source.name())
            .field("config", &self.config)
            .field("timeout", &self.timeout)
            .field("state_ttl", &self.state_ttl)
            .finish_non_exhaustive()
    }
}

impl AuthRequest {
    pub(crate) fn new(
        source: Arc<dyn AuthSource>,
        config: AuthConfig,
        cache: Arc<dyn CacheStore>,
        transport: Arc<dyn HttpTransport>,
        timeout: Duration,
        state_ttl: Duration,
    ) -> Self {
        Self {
            source,
            config,
            cache,
            transport,
            timeout,
            state_ttl,
        }
    }

    #[must_use]
    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Build the provider authorize URL, minting and caching an anti-forgery
    /// state token when the caller does not supply one.
    ///
    /// OAuth 1.0a sources first obtain temporary credentials from the
    /// provider; the credential secret is cached under the issued
    /// `oauth_token`, which then plays the anti-forgery role the state
    /// parameter plays for OAuth 2.0.
    pub async fn authorize(&self, state: Option<&str>) -> AuthResult<String> {
        let url = match self.source.spec().grant {
            GrantFlavor::AuthorizationCode => {
                let state = state.map_or_else(|| Uuid::new_v4().to_string(), str::to_owned);
                self.cache
                    .set(&self.state_key(&state), "pending", self.state_ttl)
                    .await?;
                self.source.authorize_url(&self.config, &state)?
            }
            GrantFlavor::OAuth1a => {
                let request = self.source.oauth1_request_token(&self.config)?;
                let response = self.execute(request).await?;
                if !response.is_success() {
                    return Err(AuthError::TokenExchangeFailed(format!(
                        "request token endpoint returned {}",
                        response.status
                    )));
                }
                let (oauth_token, secret) =
                    oauth1::parse_temporary_credentials(&response.body)?;
                self.cache
                    .set(
                        &self.request_token_key(&oauth_token),
                        &secret,
                        self.state_ttl,
                    )
                    .await?;
                self.source.oauth1_authorize_url(&oauth_token)?
            }
        };
        debug!(source = self.source.name(), "built authorize url");
        Ok(url)
    }

    /// Complete a login from the provider redirect: validate and consume the
    /// anti-forgery token, exchange the code, and resolve the user identity.
    pub async fn login(&self, callback: AuthCallback) -> AuthResult<AuthUser> {
        let token = match self.source.spec().grant {
            GrantFlavor::AuthorizationCode => self.exchange_oauth2(&callback).await?,
            GrantFlavor::OAuth1a => self.exchange_oauth1(&callback).await?,
        };

        let user = match self.source.profile_request(&self.config, &token)? {
            Some(request) => {
                let response = self.execute(request).await?;
                if !response.is_success() {
                    return Err(AuthError::ProfileFetchFailed(format!(
                        "profile endpoint returned {}",
                        response.status
                    )));
                }
                self.source.parse_profile_response(&response.body, &token)?
            }
            None => self.source.identity_from_token(&token)?,
        };

        info!(source = self.source.name(), uid = %user.uid, "login complete");
        Ok(user)
    }

    /// Exchange a refresh token for fresh credentials.
    pub async fn refresh(&self, token: &AuthToken) -> AuthResult<AuthToken> {
        let refresh_token = token.refresh_token.as_deref().ok_or_else(|| {
            AuthError::UnsupportedOperation("token carries no refresh_token".into())
        })?;
        let request = self.source.refresh_request(&self.config, refresh_token)?;
        let response = self.execute(request).await?;
        if !response.is_success() {
            return Err(AuthError::TokenExchangeFailed(format!(
                "refresh endpoint returned {}: {}",
                response.status, response.body
            )));
        }
        self.source.parse_token_response(&response.body)
    }

    /// Revoke an access token at the provider.
    pub async fn revoke(&self, token: &AuthToken) -> AuthResult<()> {
        let request = self
            .source
            .revoke_request(&self.config, &token.access_token)?;
        let response = self.execute(request).await?;
        if response.is_success() {
            info!(source = self.source.name(), "token revoked");
            Ok(())
        } else {
            Err(AuthError::TokenExchangeFailed(format!(
                "revocation endpoint returned {}",
                response.status
            )))
        }
    }

    async fn exchange_oauth2(&self, callback: &AuthCallback) -> AuthResult<AuthToken> {
        let state = callback.state.as_deref().ok_or(AuthError::StateMismatch)?;
        self.consume_state(state).await?;

        // Provider-reported denial still consumes the state above, so the
        // callback cannot be retried.
        if let Some(error) = &callback.error {
            let detail = callback
                .error_description
                .clone()
                .unwrap_or_else(|| error.clone());
            warn!(source = self.source.name(), error = %error, "provider denied authorization");
            return Err(AuthError::TokenExchangeFailed(detail));
        }

        let request = self.source.token_request(&self.config, callback)?;
        let response = self.execute(request).await?;
        if !response.is_success() {
            return Err(AuthError::TokenExchangeFailed(format!(
                "token endpoint returned {}: {}",
                response.status, response.body
            )));
        }
        self.source.parse_token_response(&response.body)
    }

    async fn exchange_oauth1(&self, callback: &AuthCallback) -> AuthResult<AuthToken> {
        let oauth_token = callback
            .oauth_token
            .as_deref()
            .ok_or_else(|| AuthError::InvalidCallback("missing oauth_token".into()))?;

        // Single use, like the state token: the secret is deleted whether or
        // not the exchange goes on to succeed.
        let key = self.request_token_key(oauth_token);
        let secret = self.cache.get(&key).await?;
        self.cache.delete(&key).await?;
        let secret = secret.ok_or(AuthError::StateMismatch)?;

        if let Some(error) = &callback.error {
            let detail = callback
                .error_description
                .clone()
                .unwrap_or_else(|| error.clone());
            warn!(source = self.source.name(), error = %error, "provider denied authorization");
            return Err(AuthError::TokenExchangeFailed(detail));
        }

        let request = self
            .source
            .oauth1_token_request(&self.config, callback, &secret)?;
        let response = self.execute(request).await?;
        if !response.is_success() {
            return Err(AuthError::TokenExchangeFailed(format!(
                "token endpoint returned {}: {}",
                response.status, response.body
            )));
        }
        self.source.parse_token_response(&response.body)
    }

    /// Validate and delete the cached state in one step. The delete happens
    /// regardless of the outcome, making every state single-use.
    async fn consume_state(&self, state: &str) -> AuthResult<()> {
        let key = self.state_key(state);
        let found = self.cache.get(&key).await?;
        self.cache.delete(&key).await?;
        if found.is_some() {
            Ok(())
        } else {
            warn!(source = self.source.name(), "unknown or expired state token");
            Err(AuthError::StateMismatch)
        }
    }

    async fn execute(&self, request: HttpRequest) -> AuthResult<HttpResponse> {
        let url = request.url.clone();
        match tokio::time::timeout(self.timeout, self.transport.execute(request)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(source = self.source.name(), url = %url, "request timed out");
                Err(AuthError::Timeout(url))
            }
        }
    }

    fn state_key(&self, state: &str) -> String {
        format!("{}:state:{state}", self.source.name())
    }

    fn request_token_key(&self, oauth_token: &str) -> String {
        format!("{}:request_token:{oauth_token}", self.source.name())
    }
}
