//! HTTP exchange seam.
//!
//! The client only needs "send this method/url/JSON body, give me status and
//! body text". [`ReqwestTransport`] is the production implementation; pooling,
//! TLS and timeouts are reqwest's business.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::config::HttpConfig;
use crate::error::{NpcError, Result};

const MAX_ERROR_BODY_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Delete => "DELETE",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Generic request/response exchange with the backend.
///
/// Implementations report "could not reach the backend" as
/// [`NpcError::ConnectionFailure`] and return every HTTP answer, including
/// non-2xx ones, as `Ok`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;

    /// The name of this transport implementation.
    fn name(&self) -> &str;
}

/// reqwest-backed transport.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::from_config(&HttpConfig::default())
    }

    pub fn from_config(http: &HttpConfig) -> Self {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs(http.timeout_secs))
            .connect_timeout(Duration::from_secs(http.connect_timeout_secs));

        if let Some(proxy_url) = http.proxy.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            match reqwest::Proxy::all(proxy_url) {
                Ok(proxy) => builder = builder.proxy(proxy),
                Err(error) => {
                    tracing::warn!(proxy = proxy_url, "Ignoring invalid proxy URL: {error}");
                }
            }
        }

        let client = builder.build().unwrap_or_else(|error| {
            tracing::warn!("Failed to build configured HTTP client, using defaults: {error}");
            Client::new()
        });
        Self { client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
            Method::Delete => self.client.delete(&request.url),
        };
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| NpcError::ConnectionFailure(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| NpcError::ConnectionFailure(format!("failed to read response body: {e}")))?;

        Ok(HttpResponse { status, body })
    }

    fn name(&self) -> &str {
        "reqwest"
    }
}

/// Build a [`NpcError::BackendFailure`] from a non-2xx answer.
///
/// Prefers the backend's `{error, code}` body; otherwise the raw body,
/// truncated.
pub fn backend_failure(response: &HttpResponse) -> NpcError {
    let message = serde_json::from_str::<Value>(&response.body)
        .ok()
        .and_then(|body| {
            let error = body.get("error")?.as_str()?.to_string();
            Some(match body.get("code").and_then(Value::as_str) {
                Some(code) => format!("{error} [{code}]"),
                None => error,
            })
        })
        .unwrap_or_else(|| truncate_error_body(response.body.trim()));

    NpcError::BackendFailure {
        status: response.status,
        message,
    }
}

/// Cap error text at a fixed number of characters.
pub fn truncate_error_body(input: &str) -> String {
    if input.chars().count() <= MAX_ERROR_BODY_CHARS {
        return input.to_string();
    }

    let mut end = MAX_ERROR_BODY_CHARS;
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }

    format!("{}...", &input[..end])
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_range_is_2xx() {
        let ok = HttpResponse {
            status: 201,
            body: String::new(),
        };
        let moved = HttpResponse {
            status: 302,
            body: String::new(),
        };
        assert!(ok.is_success());
        assert!(!moved.is_success());
    }

    #[test]
    fn backend_failure_prefers_structured_error() {
        let response = HttpResponse {
            status: 400,
            body: r#"{"error":"Session ID is required","code":"VALIDATION_ERROR"}"#.into(),
        };
        assert_eq!(
            backend_failure(&response),
            NpcError::BackendFailure {
                status: 400,
                message: "Session ID is required [VALIDATION_ERROR]".into()
            }
        );
    }

    #[test]
    fn backend_failure_falls_back_to_raw_body() {
        let response = HttpResponse {
            status: 502,
            body: "  upstream timeout \n".into(),
        };
        assert_eq!(
            backend_failure(&response).to_string(),
            "backend error (502): upstream timeout"
        );
    }

    #[test]
    fn long_error_bodies_are_truncated() {
        let long = "a".repeat(400);
        let result = truncate_error_body(&long);
        assert!(result.len() <= 203);
        assert!(result.ends_with("..."));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let long = "é".repeat(300);
        let result = truncate_error_body(&long);
        assert!(result.ends_with("..."));
        assert!(result.chars().count() <= 203);
    }

    #[test]
    fn method_names() {
        assert_eq!(Method::Delete.as_str(), "DELETE");
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_connection_failure() {
        let transport = ReqwestTransport::from_config(&HttpConfig {
            timeout_secs: 2,
            connect_timeout_secs: 1,
            proxy: None,
        });
        let result = transport
            .send(HttpRequest {
                method: Method::Get,
                url: "http://127.0.0.1:1/health".into(),
                body: None,
            })
            .await;
        assert!(matches!(result, Err(NpcError::ConnectionFailure(_))));
    }
}
