//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, mapping lookup)
//!     → request.rs (RequestData built from the inbound request)
//!     → [forwarder sends it upstream]
//!     → headers.rs (strip hop-by-hop / protocol-only headers both ways)
//!     → response.rs (ResponseData → client response)
//! ```

pub mod headers;
pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestData, RequestSnapshot, TraceId};
pub use response::ResponseData;
pub use server::{HttpServer, X_REQUEST_ID};
