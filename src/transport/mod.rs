//! # Transport
//!
//! The HTTP collaborator the core sends REST calls through.

pub mod errors;
pub mod http;
pub mod reqwest_transport;

pub use errors::{TransportError, TransportResult};
pub use http::{HttpRequest, HttpResponse, Method, RequestBody, Transport, TransportFuture};
pub use reqwest_transport::{ReqwestTransport, DEFAULT_REQUEST_TIMEOUT};
