//! Request forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! RequestData + TraceId + Mapping
//!     → destination.rs (balancer pick + path/query → absolute URI)
//!     → http::headers (strip TE)
//!     → trace hook: forward start
//!     → upstream.rs (timed exchange → Completed | Rejected | Failed)
//!     → trace hook: forward complete / forward failed
//!     → interceptor.rs (post-forward rewrite)
//!     → http::headers (strip response framing / policy headers)
//!     → ResponseData
//! ```
//!
//! # Design Decisions
//! - Upstream 4xx/5xx responses are data, never errors
//! - Exactly one latency observation per attempt that reached the upstream
//! - Resolution failures happen before any hook or metric
//! - Hook failures are logged and swallowed; they never affect traffic

pub mod destination;
pub mod error;
pub mod interceptor;
pub mod upstream;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::http::headers::{
    prepare_forwarded_request_headers, prepare_forwarded_response_headers,
};
use crate::http::{RequestData, ResponseData, TraceId};
use crate::load_balancer::LoadBalancer;
use crate::observability::{
    BoxError, ForwardComplete, ForwardStart, MetricsSink, NoTrace, TraceInterceptor,
};
use crate::routing::{Mapping, MappingsProvider};

pub use destination::ForwardDestination;
pub use error::{ForwardError, InvalidDestination, ResolutionError, TransportError};
pub use interceptor::{NoopInterceptor, PostForwardInterceptor, ResponseHeaderInterceptor};
pub use upstream::{
    HyperUpstreamClient, UpstreamClient, UpstreamOutcome, UpstreamRequest, UpstreamResponse,
};

/// Forwards matched requests to a mapping's destinations.
pub struct RequestForwarder {
    metrics_prefix: String,
    upstream: Arc<dyn UpstreamClient>,
    balancer: Arc<dyn LoadBalancer>,
    mappings: Arc<MappingsProvider>,
    metrics: Option<Arc<dyn MetricsSink>>,
    trace: Arc<dyn TraceInterceptor>,
    post_forward: Arc<dyn PostForwardInterceptor>,
}

impl RequestForwarder {
    /// Create a forwarder without metrics, trace hooks or interceptors.
    pub fn new(
        metrics_prefix: impl Into<String>,
        upstream: Arc<dyn UpstreamClient>,
        balancer: Arc<dyn LoadBalancer>,
        mappings: Arc<MappingsProvider>,
    ) -> Self {
        Self {
            metrics_prefix: metrics_prefix.into(),
            upstream,
            balancer,
            mappings,
            metrics: None,
            trace: Arc::new(NoTrace),
            post_forward: Arc::new(NoopInterceptor),
        }
    }

    pub fn with_metrics(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.metrics = Some(sink);
        self
    }

    pub fn with_trace(mut self, trace: Arc<dyn TraceInterceptor>) -> Self {
        self.trace = trace;
        self
    }

    pub fn with_post_forward(mut self, interceptor: Arc<dyn PostForwardInterceptor>) -> Self {
        self.post_forward = interceptor;
        self
    }

    /// The route table this forwarder serves.
    pub fn mappings(&self) -> &Arc<MappingsProvider> {
        &self.mappings
    }

    /// Swap in a new route table, then drop balancer cursors and upstream
    /// clients that belonged to mappings no longer present.
    pub fn reload(&self, mappings: Vec<Mapping>) {
        let live: HashSet<String> = mappings.iter().map(|m| m.name().to_owned()).collect();
        self.mappings.replace(mappings);

        let keep = |name: &str| live.contains(name);
        self.balancer.retain_pools(&keep);
        self.upstream.retain_mappings(&keep);
    }

    /// Forward `request`, already matched to `mapping`, and build the client response.
    pub async fn forward(
        &self,
        mut request: RequestData,
        trace_id: &TraceId,
        mapping: &Mapping,
    ) -> Result<ResponseData, ForwardError> {
        let destination = self.resolve_destination(&request, mapping)?;
        prepare_forwarded_request_headers(request.headers_mut());

        report_hook(
            "forward start",
            trace_id,
            self.trace.on_forward_start(&ForwardStart {
                trace_id,
                mapping_name: destination.mapping_name(),
                method: request.method(),
                host: request.host(),
                destination: destination.uri(),
                body: request.body(),
                headers: request.headers(),
            }),
        );

        let request = request.into_snapshot();
        let upstream_request = UpstreamRequest {
            method: request.method().clone(),
            uri: destination.uri().clone(),
            headers: request.headers().clone(),
            body: request.body().clone(),
        };
        let upstream_response = self
            .send_request(trace_id, upstream_request, mapping, &destination)
            .await?;

        tracing::debug!(
            trace_id = %trace_id,
            "Forwarded: {} {} {} -> {} {}",
            request.method(),
            request.host(),
            request.uri(),
            destination.uri(),
            upstream_response.status.as_u16()
        );

        report_hook(
            "forward complete",
            trace_id,
            self.trace.on_forward_complete(&ForwardComplete {
                trace_id,
                status: upstream_response.status,
                body: &upstream_response.body,
                headers: &upstream_response.headers,
            }),
        );

        let mut response = ResponseData::new(
            upstream_response.status,
            upstream_response.headers,
            upstream_response.body,
            request,
        );
        self.post_forward.intercept(&mut response, mapping);
        prepare_forwarded_response_headers(response.headers_mut());

        Ok(response)
    }

    fn resolve_destination(
        &self,
        request: &RequestData,
        mapping: &Mapping,
    ) -> Result<ForwardDestination, ResolutionError> {
        let base = self.balancer.choose(mapping.pool());
        ForwardDestination::resolve(base, request.uri(), mapping, &self.metrics_prefix)
    }

    async fn send_request(
        &self,
        trace_id: &TraceId,
        request: UpstreamRequest,
        mapping: &Mapping,
        destination: &ForwardDestination,
    ) -> Result<UpstreamResponse, TransportError> {
        let started = Instant::now();
        let outcome = self.upstream.exchange(request, mapping).await;
        self.record_latency(destination.metrics_name(), started.elapsed());

        match outcome {
            UpstreamOutcome::Completed(response) => Ok(response),
            UpstreamOutcome::Rejected(response) => {
                tracing::debug!(
                    trace_id = %trace_id,
                    status = response.status.as_u16(),
                    "Upstream status error forwarded as response"
                );
                Ok(response)
            }
            UpstreamOutcome::Failed(error) => {
                report_hook(
                    "forward failed",
                    trace_id,
                    self.trace.on_forward_failed(trace_id, &error),
                );
                Err(error)
            }
        }
    }

    fn record_latency(&self, metric_name: &str, elapsed: Duration) {
        if let Some(sink) = &self.metrics {
            sink.record_latency(metric_name, elapsed);
        }
    }
}

fn report_hook(hook: &str, trace_id: &TraceId, result: Result<(), BoxError>) {
    if let Err(e) = result {
        tracing::warn!(trace_id = %trace_id, hook, error = %e, "Trace hook failed");
    }
}
