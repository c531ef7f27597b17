//! Transport seam
//!
//! The crate ships no network stack of its own: the request/response
//! primitive is an external collaborator behind the [`Transport`] trait. A
//! transport resolves to `Ok` for any completed HTTP exchange (2xx or not)
//! and to `Err` only when no response was obtained at all (connection
//! failure, timeout). The orchestrator normalizes both shapes into the
//! standard envelope.

use bytes::Bytes;
use http::Method;

use crate::core::FlowResult;

/// One outgoing request handed to the transport.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub url: String,
    pub method: Method,
    /// Urlencoded request body, if any.
    pub body: Option<String>,
}

impl TransportRequest {
    pub fn new(url: impl Into<String>, method: Method) -> Self {
        Self {
            url: url.into(),
            method,
            body: None,
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// The raw response a transport produced.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code; 0 when the transport could not determine one.
    pub status: u16,
    pub status_text: String,
    pub body: Bytes,
}

impl TransportResponse {
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self {
            status: 200,
            status_text: "OK".to_string(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as text, lossily decoded.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// The request/response primitive the orchestrator dispatches through.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: TransportRequest) -> FlowResult<TransportResponse>;
}
