// ABOUTME: OAuth 1.0a flow tests: request-token step, signed exchanges, and
// ABOUTME: single-use temporary-credential semantics
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

mod common;

use anyhow::Result;
use common::{test_config, MockTransport};
use omniauth::{
    AuthCallback, AuthError, AuthRequest, AuthRequestOptions, CacheStore, MemoryCacheStore,
    SourceRegistry,
};
use std::sync::Arc;

fn twitter_request(transport: Arc<MockTransport>) -> AuthRequest {
    common::init_tracing();
    let registry = SourceRegistry::with_builtins();
    let cache: Arc<dyn CacheStore> = Arc::new(MemoryCacheStore::new());
    AuthRequestOptions::new("twitter", test_config())
        .transport(transport)
        .cache(cache)
        .build(&registry)
        .expect("build twitter request")
}

fn auth_header(request: &omniauth::HttpRequest) -> String {
    request
        .headers
        .iter()
        .find(|(k, _)| k == "Authorization")
        .map(|(_, v)| v.clone())
        .expect("Authorization header")
}

#[tokio::test]
async fn test_authorize_obtains_temporary_credentials_first() -> Result<()> {
    let transport = Arc::new(MockTransport::new());
    let request = twitter_request(transport.clone());

    transport.push_response(
        200,
        "oauth_token=req-token&oauth_token_secret=req-secret&oauth_callback_confirmed=true",
    );
    let url = request.authorize(None).await?;

    assert_eq!(
        url,
        "https://api.twitter.com/oauth/authenticate?oauth_token=req-token"
    );
    let recorded = transport.recorded_requests();
    assert_eq!(recorded.len(), 1);
    assert!(recorded[0]
        .url
        .starts_with("https://api.twitter.com/oauth/request_token"));
    let header = auth_header(&recorded[0]);
    assert!(header.starts_with("OAuth "));
    assert!(header.contains("oauth_callback="));
    assert!(header.contains("oauth_signature="));
    assert!(header.contains("oauth_signature_method=\"HMAC-SHA1\""));
    Ok(())
}

#[tokio::test]
async fn test_full_oauth1_login() -> Result<()> {
    let transport = Arc::new(MockTransport::new());
    let request = twitter_request(transport.clone());

    transport.push_response(
        200,
        "oauth_token=req-token&oauth_token_secret=req-secret&oauth_callback_confirmed=true",
    );
    request.authorize(None).await?;

    transport.push_response(
        200,
        "oauth_token=acc-token&oauth_token_secret=acc-secret&user_id=12&screen_name=jack",
    );
    transport.push_json(
        200,
        serde_json::json!({
            "id_str": "12",
            "screen_name": "jack",
            "name": "Jack",
            "profile_image_url_https": "https://pbs.twimg.com/x.png"
        }),
    );

    let callback =
        AuthCallback::from_params([("oauth_token", "req-token"), ("oauth_verifier", "v-1")]);
    let user = request.login(callback).await?;

    assert_eq!(user.source, "twitter");
    assert_eq!(user.uid, "12");
    assert_eq!(user.username, "jack");
    assert_eq!(user.token.access_token, "acc-token");
    assert_eq!(user.token.token_secret.as_deref(), Some("acc-secret"));

    let recorded = transport.recorded_requests();
    assert_eq!(recorded.len(), 3);
    // The exchange is signed with the verifier and the temporary token.
    let exchange_header = auth_header(&recorded[1]);
    assert!(exchange_header.contains("oauth_verifier=\"v-1\""));
    assert!(exchange_header.contains("oauth_token=\"req-token\""));
    // The profile fetch is signed with the final token credentials.
    let profile_header = auth_header(&recorded[2]);
    assert!(profile_header.contains("oauth_token=\"acc-token\""));
    Ok(())
}

#[tokio::test]
async fn test_temporary_credentials_are_single_use() -> Result<()> {
    let transport = Arc::new(MockTransport::new());
    let request = twitter_request(transport.clone());

    transport.push_response(
        200,
        "oauth_token=req-token&oauth_token_secret=req-secret&oauth_callback_confirmed=true",
    );
    request.authorize(None).await?;

    transport.push_response(
        200,
        "oauth_token=acc-token&oauth_token_secret=acc-secret&user_id=12",
    );
    transport.push_json(200, serde_json::json!({"id_str": "12", "screen_name": "jack"}));
    let callback =
        AuthCallback::from_params([("oauth_token", "req-token"), ("oauth_verifier", "v-1")]);
    request.login(callback.clone()).await?;
    let seen = transport.request_count();

    let err = request.login(callback).await.unwrap_err();
    assert!(matches!(err, AuthError::StateMismatch));
    assert_eq!(transport.request_count(), seen);
    Ok(())
}

#[tokio::test]
async fn test_unknown_oauth_token_is_rejected() {
    let transport = Arc::new(MockTransport::new());
    let request = twitter_request(transport.clone());

    let callback =
        AuthCallback::from_params([("oauth_token", "never-issued"), ("oauth_verifier", "v-1")]);
    let err = request.login(callback).await.unwrap_err();
    assert!(matches!(err, AuthError::StateMismatch));
    assert_eq!(transport.request_count(), 0);
}
