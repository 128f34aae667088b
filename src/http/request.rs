//! Inbound request values.
//!
//! # Responsibilities
//! - Carry the parts of an inbound request that get forwarded upstream
//! - Provide an immutable snapshot for hooks and response back-references
//! - Carry the caller-assigned correlation id
//!
//! # Design Decisions
//! - `RequestData` is the mutable working value, used until the upstream call
//! - `RequestSnapshot` is built once by moving the working value behind an `Arc`;
//!   later mutation is impossible, clones are cheap
//! - Bodies are `Bytes`: possibly empty, never absent

use std::fmt;
use std::sync::Arc;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method};

/// Opaque per-request correlation id, threaded unchanged through every hook.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TraceId(String);

impl TraceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A request about to be forwarded.
#[derive(Debug, Clone)]
pub struct RequestData {
    method: Method,
    host: String,
    uri: String,
    headers: HeaderMap,
    body: Bytes,
}

impl RequestData {
    /// `uri` is the path and query only, e.g. `/api/x?y=1`.
    pub fn new(
        method: Method,
        host: impl Into<String>,
        uri: impl Into<String>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Self {
        Self {
            method,
            host: host.into(),
            uri: uri.into(),
            headers,
            body,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn set_body(&mut self, body: Bytes) {
        self.body = body;
    }

    /// Freeze the request.
    pub fn into_snapshot(self) -> RequestSnapshot {
        RequestSnapshot(Arc::new(self))
    }
}

/// Read-only view of a forwarded request.
#[derive(Debug, Clone)]
pub struct RequestSnapshot(Arc<RequestData>);

impl RequestSnapshot {
    pub fn method(&self) -> &Method {
        self.0.method()
    }

    pub fn host(&self) -> &str {
        self.0.host()
    }

    pub fn uri(&self) -> &str {
        self.0.uri()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.0.headers()
    }

    pub fn body(&self) -> &Bytes {
        self.0.body()
    }
}

impl From<RequestData> for RequestSnapshot {
    fn from(data: RequestData) -> Self {
        data.into_snapshot()
    }
}
