// ABOUTME: Unified third-party login library: one authorize/exchange/profile
// ABOUTME: flow across OAuth 2.0 and OAuth 1.0a providers
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! One login flow for many identity providers.
//!
//! Providers differ in endpoints, parameter names, scope formatting, token
//! response encoding, and profile schemas, but the flow is always the same:
//! build an authorize URL, exchange the redirect code for a token, fetch and
//! normalize the user profile. This crate keeps that flow in one place
//! ([`AuthRequest`]) and pushes every per-provider difference into a
//! declarative [`SourceSpec`] descriptor.
//!
//! ```no_run
//! use omniauth::{AuthCallback, AuthConfig, AuthRequestOptions, SourceRegistry};
//!
//! # async fn example() -> omniauth::AuthResult<()> {
//! let registry = SourceRegistry::with_builtins();
//! let config = AuthConfig::new("client-id", "client-secret", "https://example.com/callback")?;
//! let request = AuthRequestOptions::new("github", config).build(&registry)?;
//!
//! let url = request.authorize(None).await?;
//! // ... redirect the user to `url`; the provider calls back with code and state ...
//! let user = request
//!     .login(AuthCallback::new("code-from-redirect", "state-from-redirect"))
//!     .await?;
//! println!("logged in as {} via {}", user.username, user.source);
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod cache;
pub mod config;
pub mod errors;
pub mod http;
pub mod models;
pub mod request;
pub mod source;

pub use builder::{AuthRequestOptions, CredentialSource, SourceRegistry};
pub use cache::{CacheStore, MemoryCacheStore, RedisCacheStore};
pub use config::AuthConfig;
pub use errors::{AuthError, AuthResult};
pub use http::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
pub use models::{AuthCallback, AuthToken, AuthUser, Gender};
pub use request::AuthRequest;
pub use source::{AuthSource, DescriptorSource, GrantFlavor, ProfileMap, SourceSpec};
