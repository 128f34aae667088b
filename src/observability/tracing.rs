//! Forward trace hooks.
//!
//! # Responsibilities
//! - Define the three points at which a forward attempt is observable
//! - Provide a log-based implementation
//!
//! # Design Decisions
//! - Hooks receive borrowed views; they cannot alter the attempt
//! - A failing hook is logged by the forwarder and otherwise ignored
//! - Every hook call for one inbound request carries the same trace id

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode, Uri};

use crate::forwarder::TransportError;
use crate::http::TraceId;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Data visible when the upstream call is about to be made.
#[derive(Debug)]
pub struct ForwardStart<'a> {
    pub trace_id: &'a TraceId,
    pub mapping_name: &'a str,
    pub method: &'a Method,
    pub host: &'a str,
    pub destination: &'a Uri,
    pub body: &'a Bytes,
    pub headers: &'a HeaderMap,
}

/// Data visible once the upstream answered with any status.
#[derive(Debug)]
pub struct ForwardComplete<'a> {
    pub trace_id: &'a TraceId,
    pub status: StatusCode,
    pub body: &'a Bytes,
    pub headers: &'a HeaderMap,
}

/// Observability callbacks around a forward attempt.
pub trait TraceInterceptor: Send + Sync {
    fn on_forward_start(&self, _event: &ForwardStart<'_>) -> Result<(), BoxError> {
        Ok(())
    }

    fn on_forward_complete(&self, _event: &ForwardComplete<'_>) -> Result<(), BoxError> {
        Ok(())
    }

    fn on_forward_failed(
        &self,
        _trace_id: &TraceId,
        _error: &TransportError,
    ) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTrace;

impl TraceInterceptor for NoTrace {}

/// Writes forward events to the log.
#[derive(Debug, Clone, Copy)]
pub struct LoggingTraceInterceptor {
    enabled: bool,
}

impl LoggingTraceInterceptor {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl TraceInterceptor for LoggingTraceInterceptor {
    fn on_forward_start(&self, event: &ForwardStart<'_>) -> Result<(), BoxError> {
        if self.enabled {
            tracing::info!(
                trace_id = %event.trace_id,
                mapping = %event.mapping_name,
                method = %event.method,
                host = %event.host,
                destination = %event.destination,
                body_bytes = event.body.len(),
                headers = ?event.headers,
                "Forwarding request"
            );
        }
        Ok(())
    }

    fn on_forward_complete(&self, event: &ForwardComplete<'_>) -> Result<(), BoxError> {
        if self.enabled {
            tracing::info!(
                trace_id = %event.trace_id,
                status = event.status.as_u16(),
                body_bytes = event.body.len(),
                headers = ?event.headers,
                "Forward complete"
            );
        }
        Ok(())
    }

    fn on_forward_failed(
        &self,
        trace_id: &TraceId,
        error: &TransportError,
    ) -> Result<(), BoxError> {
        if self.enabled {
            tracing::warn!(trace_id = %trace_id, error = %error, "Forward failed");
        }
        Ok(())
    }
}
