//! Header sanitization.
//!
//! # Responsibilities
//! - Strip headers from the client request that only concern the inbound connection
//! - Strip framing and security-policy headers from the backend response
//!
//! # Design Decisions
//! - The gateway's own transport owns framing, so backend framing headers never leak
//! - Backend HSTS / key pinning must not be applied to the gateway's own domain
//! - Removal drops every value of a multi-valued header

use axum::http::header::{self, HeaderMap, HeaderName};

/// Removed from every outbound (upstream) request.
pub static STRIPPED_REQUEST_HEADERS: [HeaderName; 1] = [header::TE];

/// Removed from every client-facing response.
pub static STRIPPED_RESPONSE_HEADERS: [HeaderName; 5] = [
    header::TRANSFER_ENCODING,
    header::CONNECTION,
    header::PUBLIC_KEY_PINS,
    header::SERVER,
    header::STRICT_TRANSPORT_SECURITY,
];

/// Remove protocol-level headers of the client request that do not apply to
/// the request re-sent by the gateway's own client.
pub fn prepare_forwarded_request_headers(headers: &mut HeaderMap) {
    strip(headers, &STRIPPED_REQUEST_HEADERS);
}

/// Remove protocol-level headers of the backend response that do not apply to
/// the response the gateway sends.
pub fn prepare_forwarded_response_headers(headers: &mut HeaderMap) {
    strip(headers, &STRIPPED_RESPONSE_HEADERS);
}

fn strip(headers: &mut HeaderMap, names: &[HeaderName]) {
    for name in names {
        headers.remove(name);
    }
}
