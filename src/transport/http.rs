//! # HTTP Exchange Types
//!
//! The request/response pair the core hands to a `Transport`. Bodies are
//! JSON except for the OAuth token exchange, which is form encoded.

use std::future::Future;
use std::pin::Pin;

use serde_json::Value as Json;

use super::errors::TransportResult;

/// HTTP methods used by the REST protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

/// Request body
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(Json),
    Form(Vec<(String, String)>),
}

/// An outgoing request
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    /// Query parameters, percent-encoded by the transport
    pub query: Vec<(String, String)>,
    pub bearer: Option<String>,
    pub body: Option<RequestBody>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            bearer: None,
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn json(mut self, body: Json) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    pub fn form(mut self, pairs: Vec<(String, String)>) -> Self {
        self.body = Some(RequestBody::Form(pairs));
        self
    }

    pub fn bearer(mut self, token: Option<String>) -> Self {
        self.bearer = token;
        self
    }

    /// JSON body, if any
    pub fn json_body(&self) -> Option<&Json> {
        match &self.body {
            Some(RequestBody::Json(json)) => Some(json),
            _ => None,
        }
    }

    /// Value of a query parameter, if present
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// A response: status plus decoded JSON body (`Null` when empty)
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Json,
}

impl HttpResponse {
    pub fn new(status: u16, body: Json) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Boxed future returned by `Transport::send`
pub type TransportFuture<'a> =
    Pin<Box<dyn Future<Output = TransportResult<HttpResponse>> + Send + 'a>>;

/// Sends HTTP requests on behalf of the core
///
/// Implementations own connection pooling and any transport-level retry
/// policy; the core never retries a failed send itself.
pub trait Transport: Send + Sync {
    fn send(&self, request: HttpRequest) -> TransportFuture<'_>;
}
