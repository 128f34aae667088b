//! HTTP gateway forwarding core.
//!
//! Resolves a matched mapping to a backend destination, rewrites the request,
//! performs the upstream call and rewrites the response, with trace hooks and
//! latency metrics around every attempt.

pub mod config;
pub mod forwarder;
pub mod http;
pub mod load_balancer;
pub mod observability;
pub mod routing;

pub use config::GatewayConfig;
pub use forwarder::{ForwardError, RequestForwarder};
pub use http::{HttpServer, RequestData, ResponseData, TraceId};
pub use routing::{Mapping, MappingsProvider};
