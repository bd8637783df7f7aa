// ABOUTME: HTTP transport boundary with abstract request descriptors
// ABOUTME: Sources emit descriptors; the host-supplied transport executes them
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use crate::errors::AuthResult;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// Request body encoding. Token endpoints in the wild take form bodies or
/// nothing at all; JSON bodies have not been needed by any built-in source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    Empty,
    Form(Vec<(String, String)>),
}

/// Abstract request descriptor issued by the core.
///
/// Query parameters are already encoded into `url`; `headers` and `body` are
/// carried separately so a transport (or a test double) can inspect them.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            headers: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn form(mut self, fields: Vec<(String, String)>) -> Self {
        self.body = RequestBody::Form(fields);
        self
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport collaborator supplied by the host application.
///
/// Connection pooling, retries, and TLS are the transport's concern; the core
/// only issues descriptors. Cancellation is enforced by the caller via
/// `tokio::time::timeout`, so implementations need no timeout of their own.
#[async_trait::async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> AuthResult<HttpResponse>;
}

/// Default transport backed by a pooled `reqwest` client.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Build with an upper-bound connect timeout as a safety net under the
    /// per-call timeout the orchestrator applies.
    pub fn with_connect_timeout(timeout: Duration) -> AuthResult<Self> {
        let client = reqwest::Client::builder().connect_timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> AuthResult<HttpResponse> {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };

        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        if let RequestBody::Form(fields) = &request.body {
            builder = builder.form(fields);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(HttpResponse { status, body })
    }
}

/// Shared default transport, created at first use.
pub(crate) fn default_transport() -> Arc<dyn HttpTransport> {
    static INSTANCE: std::sync::OnceLock<Arc<ReqwestTransport>> = std::sync::OnceLock::new();
    INSTANCE
        .get_or_init(|| Arc::new(ReqwestTransport::new()))
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builders() {
        let request = HttpRequest::post("https://example.com/token")
            .header("Accept", "application/json")
            .form(vec![("code".into(), "abc".into())]);

        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.headers.len(), 1);
        assert!(matches!(request.body, RequestBody::Form(ref f) if f.len() == 1));
    }

    #[test]
    fn test_success_range() {
        assert!(HttpResponse { status: 204, body: String::new() }.is_success());
        assert!(!HttpResponse { status: 400, body: String::new() }.is_success());
        assert!(!HttpResponse { status: 302, body: String::new() }.is_success());
    }
}
