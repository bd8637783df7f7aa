// ABOUTME: Unified error taxonomy for the OAuth client core
// ABOUTME: Maps every failure path of the authorize/login state machine to a typed variant
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use thiserror::Error;

/// Errors surfaced by the authorize / login state machine and its collaborators.
///
/// The callback-facing variants (`StateMismatch`, `TokenExchangeFailed`,
/// `ProfileFetchFailed`) carry provider-reported detail where available. None
/// of them is retried automatically: OAuth authorization codes are single-use,
/// so the caller must restart the whole flow.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Forged, expired, or replayed callback state. Never recoverable.
    #[error("state parameter mismatch: forged, expired, or already consumed")]
    StateMismatch,

    /// Provider rejected the code exchange or returned an unexpected shape.
    #[error("token exchange failed: {0}")]
    TokenExchangeFailed(String),

    /// Transport or mapping error while fetching the user profile.
    #[error("profile fetch failed: {0}")]
    ProfileFetchFailed(String),

    /// A network or external-cache collaborator exceeded the configured timeout.
    #[error("operation timed out: {0}")]
    Timeout(String),

    /// Provider key has no registered source and no extension was supplied.
    #[error("unknown source: {0}")]
    UnknownSource(String),

    /// Static config missing or the resolver function failed.
    #[error("config resolution failed: {0}")]
    ConfigResolution(String),

    /// Callback payload lacks a required field (code, oauth_token, ...).
    #[error("invalid callback: {0}")]
    InvalidCallback(String),

    /// The source does not support this operation (refresh, revoke).
    #[error("operation not supported by this source: {0}")]
    UnsupportedOperation(String),

    /// Cache backend failure (connection, serialization).
    #[error("cache error: {0}")]
    Cache(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    UrlBuild(#[from] url::ParseError),
}

/// Result type alias for convenience
pub type AuthResult<T> = Result<T, AuthError>;
