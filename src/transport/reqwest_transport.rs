//! # Reqwest Transport
//!
//! Default `Transport` backed by a pooled `reqwest::Client`.

use std::time::Duration;

use serde_json::Value as Json;

use super::errors::{TransportError, TransportResult};
use super::http::{HttpRequest, HttpResponse, Method, RequestBody, Transport, TransportFuture};

/// Default per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// HTTP transport using reqwest
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport with the given per-request timeout
    pub fn new(timeout: Duration) -> TransportResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("firerest/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(Self { client })
    }

    /// Wrap an existing client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn execute(&self, request: HttpRequest) -> TransportResult<HttpResponse> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, &request.url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        builder = match &request.body {
            Some(RequestBody::Json(json)) => builder.json(json),
            Some(RequestBody::Form(pairs)) => builder.form(pairs),
            None => builder,
        };

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(map_reqwest_error)?;

        tracing::debug!(
            method = request.method.as_str(),
            url = %request.url,
            status,
            "http_exchange"
        );

        Ok(HttpResponse::new(status, parse_body(&text)))
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: HttpRequest) -> TransportFuture<'_> {
        Box::pin(self.execute(request))
    }
}

/// Decode a response body; non-JSON bodies (proxy error pages) are kept as
/// a JSON string so the status mapping can still report them
fn parse_body(text: &str) -> Json {
    if text.trim().is_empty() {
        return Json::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Json::String(text.to_string()))
}

fn map_reqwest_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_decode() {
        TransportError::InvalidResponse(e.to_string())
    } else {
        TransportError::Network(e.to_string())
    }
}
