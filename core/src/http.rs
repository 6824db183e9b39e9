//! HTTP transport types and the transport seam.
//!
//! # Design
//! Every Brickset v3 endpoint is a form-encoded `POST`, so a request is just
//! a URL plus ordered key/value pairs. The client builds `HttpRequest`
//! values and hands them to a `Transport`; the transport performs the actual
//! I/O and returns the raw status and body as an `HttpResponse`. Keeping the
//! round-trip behind a trait lets tests swap in an in-memory transport.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// A form-encoded `POST` request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub form: Vec<(String, String)>,
}

impl HttpRequest {
    /// Look up a form field by name.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.form
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Names of the form fields, in wire order.
    pub fn field_names(&self) -> Vec<&str> {
        self.form.iter().map(|(k, _)| k.as_str()).collect()
    }
}

/// An HTTP response described as plain data.
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

/// The network round-trip failed before any HTTP status was received.
#[derive(Debug, Error)]
#[error("transport error: {0}")]
pub struct TransportError(pub String);

/// Executes a form `POST` and returns the raw response.
///
/// Implementations must return non-2xx responses as `Ok`; classifying the
/// status is the client's job.
pub trait Transport {
    fn post(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn post(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).post(request)
    }
}

/// Blocking transport backed by a `ureq` agent.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqTransport").finish_non_exhaustive()
    }
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn post(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut response = self
            .agent
            .post(&request.url)
            .send_form(request.form.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .map_err(|e| TransportError(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| TransportError(e.to_string()))?;

        Ok(HttpResponse { status, body })
    }
}
