// ABOUTME: Source registry and request assembly: resolves a source by name,
// ABOUTME: resolves credentials, and wires cache, transport, and timeouts
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use crate::cache::{default_cache_store, CacheStore};
use crate::config::AuthConfig;
use crate::errors::{AuthError, AuthResult};
use crate::http::{default_transport, HttpTransport};
use crate::request::AuthRequest;
use crate::source::{builtin, AuthSource};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_STATE_TTL: Duration = Duration::from_secs(300);

/// Name-keyed collection of sources. Lookup is case-insensitive on insert
/// and query; custom sources may shadow built-ins by registering under the
/// same name.
#[derive(Default)]
pub struct SourceRegistry {
    sources: HashMap<String, Arc<dyn AuthSource>>,
}

impl SourceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with every built-in source.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for source in builtin::all() {
            registry.register(source);
        }
        registry
    }

    pub fn register(&mut self, source: Arc<dyn AuthSource>) {
        self.sources
            .insert(source.name().to_ascii_lowercase(), source);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn AuthSource>> {
        self.sources.get(&name.to_ascii_lowercase()).cloned()
    }

    /// Registered source names, sorted for stable output.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sources.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Where per-source credentials come from.
pub enum CredentialSource {
    /// Fixed configuration supplied up front.
    Static(AuthConfig),
    /// Resolver invoked with the source name at assembly time; backs
    /// multi-tenant setups where credentials live in a database.
    Resolver(Box<dyn Fn(&str) -> AuthResult<AuthConfig> + Send + Sync>),
}

/// Explicit assembly options for an [`AuthRequest`]. Every field is plain
/// data; `build` is the only fallible step.
pub struct AuthRequestOptions {
    source: String,
    credentials: CredentialSource,
    cache: Option<Arc<dyn CacheStore>>,
    transport: Option<Arc<dyn HttpTransport>>,
    timeout: Duration,
    state_ttl: Duration,
}

impl AuthRequestOptions {
    #[must_use]
    pub fn new(source: impl Into<String>, config: AuthConfig) -> Self {
        Self {
            source: source.into(),
            credentials: CredentialSource::Static(config),
            cache: None,
            transport: None,
            timeout: DEFAULT_REQUEST_TIMEOUT,
            state_ttl: DEFAULT_STATE_TTL,
        }
    }

    #[must_use]
    pub fn with_resolver(
        source: impl Into<String>,
        resolver: impl Fn(&str) -> AuthResult<AuthConfig> + Send + Sync + 'static,
    ) -> Self {
        Self {
            source: source.into(),
            credentials: CredentialSource::Resolver(Box::new(resolver)),
            cache: None,
            transport: None,
            timeout: DEFAULT_REQUEST_TIMEOUT,
            state_ttl: DEFAULT_STATE_TTL,
        }
    }

    #[must_use]
    pub fn cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Lifetime of cached anti-forgery state tokens.
    #[must_use]
    pub fn state_ttl(mut self, ttl: Duration) -> Self {
        self.state_ttl = ttl;
        self
    }

    /// Resolve the source and credentials and assemble the request.
    ///
    /// # Errors
    /// `UnknownSource` when the registry has no source under the given name;
    /// `ConfigResolution` when the credential resolver fails.
    pub fn build(self, registry: &SourceRegistry) -> AuthResult<AuthRequest> {
        let source = registry
            .get(&self.source)
            .ok_or_else(|| AuthError::UnknownSource(self.source.clone()))?;
        let config = match self.credentials {
            CredentialSource::Static(config) => config,
            CredentialSource::Resolver(resolver) => resolver(source.name())?,
        };
        Ok(AuthRequest::new(
            source,
            config,
            self.cache.unwrap_or_else(default_cache_store),
            self.transport.unwrap_or_else(default_transport),
            self.timeout,
            self.state_ttl,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AuthConfig {
        AuthConfig::new("id", "secret", "https://example.com/callback").unwrap()
    }

    #[test]
    fn test_registry_lookup_is_case_insensitive() {
        let registry = SourceRegistry::with_builtins();
        assert!(registry.get("GitHub").is_some());
        assert!(registry.get("github").is_some());
        assert!(registry.get("does-not-exist").is_none());
    }

    #[test]
    fn test_unknown_source_is_rejected() {
        let registry = SourceRegistry::with_builtins();
        let err = AuthRequestOptions::new("nope", config())
            .build(&registry)
            .unwrap_err();
        assert!(matches!(err, AuthError::UnknownSource(name) if name == "nope"));
    }

    #[test]
    fn test_resolver_failure_surfaces_as_config_resolution() {
        let registry = SourceRegistry::with_builtins();
        let err = AuthRequestOptions::with_resolver("github", |_| {
            Err(AuthError::ConfigResolution("tenant not found".into()))
        })
        .build(&registry)
        .unwrap_err();
        assert!(matches!(err, AuthError::ConfigResolution(_)));
    }

    #[test]
    fn test_static_credentials_build() {
        let registry = SourceRegistry::with_builtins();
        let request = AuthRequestOptions::new("gitee", config())
            .build(&registry)
            .unwrap();
        assert_eq!(request.source_name(), "gitee");
    }
}
