//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all proxy handler
//! - Wire up middleware (request ID, tracing, timeout)
//! - Resolve the mapping for each request
//! - Hand matched requests to the RequestForwarder on a detached task
//! - Map forward failures to gateway status codes
//! - Apply mapping reloads

use std::error::Error as StdError;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{header, uri::Authority, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use http_body_util::LengthLimitError;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use uuid::Uuid;

use crate::config::GatewayConfig;
use crate::forwarder::{
    ForwardError, HyperUpstreamClient, RequestForwarder, ResponseHeaderInterceptor,
};
use crate::http::{RequestData, TraceId};
use crate::observability::{LoggingTraceInterceptor, PrometheusSink};
use crate::routing::{mappings, MappingError, MappingsProvider};

/// Header carrying the request correlation id.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub forwarder: Arc<RequestForwarder>,
    pub max_body_bytes: usize,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    forwarder: Arc<RequestForwarder>,
}

impl HttpServer {
    /// Create a server with the hyper upstream client and the configured
    /// balancer, trace logging, interceptors and metrics.
    pub fn new(config: GatewayConfig) -> Result<Self, MappingError> {
        let mappings = Arc::new(MappingsProvider::from_config(&config.mappings)?);

        let mut forwarder = RequestForwarder::new(
            config.metrics.names_prefix.clone(),
            Arc::new(HyperUpstreamClient::new()),
            config.balancer.build(),
            mappings,
        )
        .with_trace(Arc::new(LoggingTraceInterceptor::new(config.tracing.enabled)))
        .with_post_forward(Arc::new(ResponseHeaderInterceptor));

        if config.metrics.enabled {
            forwarder = forwarder.with_metrics(Arc::new(PrometheusSink));
        }

        Ok(Self::with_forwarder(config, Arc::new(forwarder)))
    }

    /// Create a server around an already assembled forwarder.
    pub fn with_forwarder(config: GatewayConfig, forwarder: Arc<RequestForwarder>) -> Self {
        let state = AppState {
            forwarder: forwarder.clone(),
            max_body_bytes: config.listener.max_body_bytes,
        };
        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            forwarder,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::new(Duration::from_secs(
                        config.listener.request_timeout_secs,
                    ))),
            )
    }

    /// Run the server until `shutdown` resolves, applying mapping reloads
    /// received on `config_updates`.
    pub async fn run<F>(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        shutdown: F,
    ) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            mappings = self.forwarder.mappings().snapshot().len(),
            "HTTP server starting"
        );

        let forwarder = self.forwarder.clone();
        tokio::spawn(async move {
            while let Some(new_config) = config_updates.recv().await {
                match mappings::compile(&new_config.mappings) {
                    Ok(compiled) => forwarder.reload(compiled),
                    Err(e) => tracing::error!(
                        error = %e,
                        "Rejected mapping reload, keeping current table"
                    ),
                }
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn forwarder(&self) -> &Arc<RequestForwarder> {
        &self.forwarder
    }
}

/// Main proxy handler.
/// Resolves the mapping, buffers the body and forwards the request.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let trace_id = TraceId::new(
        request
            .headers()
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
    );
    let host = request_host(&request);
    let path = request.uri().path().to_owned();

    let Some(mapping) = state.forwarder.mappings().resolve(&host, &path) else {
        tracing::warn!(trace_id = %trace_id, host = %host, path = %path, "No mapping matched");
        return (StatusCode::NOT_FOUND, "No matching mapping found").into_response();
    };

    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) if exceeds_length_limit(&e) => {
            tracing::warn!(
                trace_id = %trace_id,
                limit = state.max_body_bytes,
                "Request body too large"
            );
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
        Err(e) => {
            tracing::warn!(trace_id = %trace_id, error = %e, "Failed to read request body");
            return (StatusCode::BAD_REQUEST, "Request body unreadable").into_response();
        }
    };
    let uri = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str().to_owned())
        .unwrap_or_else(|| "/".to_owned());

    let data = RequestData::new(parts.method, host, uri, parts.headers, body);

    // The attempt runs on its own task: a client disconnect or the listener
    // timeout drops this handler but never the upstream attempt.
    let forwarder = state.forwarder.clone();
    let attempt = {
        let trace_id = trace_id.clone();
        let mapping = mapping.clone();
        tokio::spawn(async move { forwarder.forward(data, &trace_id, &mapping).await })
    };

    let result = match attempt.await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(
                trace_id = %trace_id,
                mapping = %mapping.name(),
                error = %e,
                "Forward task failed"
            );
            return (StatusCode::INTERNAL_SERVER_ERROR, "Forward failed").into_response();
        }
    };

    match result {
        Ok(response) => response.into_response(),
        Err(ForwardError::Transport(e)) => {
            let status = if e.is_timeout() {
                StatusCode::GATEWAY_TIMEOUT
            } else {
                StatusCode::BAD_GATEWAY
            };
            tracing::error!(
                trace_id = %trace_id,
                mapping = %mapping.name(),
                error = %e,
                "Upstream error"
            );
            (status, "Upstream request failed").into_response()
        }
        Err(ForwardError::Resolution(e)) => {
            tracing::error!(
                trace_id = %trace_id,
                mapping = %mapping.name(),
                error = %e,
                cause = %e.cause(),
                "Destination resolution failed"
            );
            (StatusCode::INTERNAL_SERVER_ERROR, "Invalid destination").into_response()
        }
    }
}

/// True when buffering failed because the body passed the size limit.
fn exceeds_length_limit(error: &axum::Error) -> bool {
    let mut source = StdError::source(error);
    while let Some(cause) = source {
        if cause.is::<LengthLimitError>() {
            return true;
        }
        source = cause.source();
    }
    false
}

/// Host without port, from the Host header or the request target.
fn request_host(request: &Request<Body>) -> String {
    request
        .headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| Authority::from_str(h).ok())
        .map(|a| a.host().to_owned())
        .or_else(|| request.uri().host().map(str::to_owned))
        .unwrap_or_default()
}
