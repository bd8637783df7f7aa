// ABOUTME: Shared test fixtures: a scripted transport that records every
// ABOUTME: outgoing request, plus configuration helpers
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use async_trait::async_trait;
use omniauth::errors::AuthResult;
use omniauth::{AuthConfig, HttpRequest, HttpResponse, HttpTransport};
use std::collections::VecDeque;
use std::sync::{Mutex, Once};

/// Install a test subscriber once per process so failing tests show flow logs.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Transport that replays scripted responses in order and records every
/// request it saw, so tests can assert on both traffic and outcomes.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, status: u16, body: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(HttpResponse {
                status,
                body: body.to_owned(),
            });
    }

    pub fn push_json(&self, status: u16, body: serde_json::Value) {
        self.push_response(status, &body.to_string());
    }

    pub fn recorded_requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn execute(&self, request: HttpRequest) -> AuthResult<HttpResponse> {
        self.requests.lock().unwrap().push(request.clone());
        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unscripted request to {}", request.url));
        Ok(response)
    }
}

pub fn test_config() -> AuthConfig {
    AuthConfig::new("test-client-id", "test-client-secret", "https://example.com/callback")
        .expect("valid test config")
}

/// Pull one query parameter out of a URL.
pub fn query_param(url: &str, name: &str) -> Option<String> {
    let parsed = url::Url::parse(url).expect("valid url");
    parsed
        .query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}
