//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Forward attempt produces:
//!     → tracing.rs (start / complete / failed hooks, keyed by trace id)
//!     → metrics.rs (one latency observation per attempt)
//!     → logging.rs (structured log events from every subsystem)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging via the tracing crate
//! - Trace id flows unchanged through every hook of a request
//! - Metrics are optional; absence is a silent no-op

pub mod logging;
pub mod metrics;
pub mod tracing;

pub use self::metrics::{MetricsSink, PrometheusSink};
pub use self::tracing::{
    BoxError, ForwardComplete, ForwardStart, LoggingTraceInterceptor, NoTrace, TraceInterceptor,
};
