//! Upstream HTTP client.
//!
//! # Responsibilities
//! - Execute one HTTP exchange against a resolved destination
//! - Report the result as a tagged outcome, never as a panic
//! - Apply per-mapping connect/read timeouts and response size limits
//!
//! # Design Decisions
//! - One pooled hyper client per mapping, rebuilt when the mapping's tuning changes
//! - `http` and `https` destinations share one connector; TLS uses rustls with
//!   the webpki root store
//! - Any well-formed response is `Completed`, whatever its status
//! - Response bodies are buffered so hooks and interceptors can see them

use std::error::Error as StdError;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode, Uri};
use dashmap::DashMap;
use futures_util::future::BoxFuture;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use rustls::{ClientConfig, RootCertStore};

use crate::forwarder::error::TransportError;
use crate::routing::{ClientTuning, Mapping};

/// Request as sent to the upstream.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// A well-formed upstream response, any status.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Result of one upstream exchange.
#[derive(Debug)]
pub enum UpstreamOutcome {
    /// The upstream answered.
    Completed(UpstreamResponse),
    /// The upstream answered with a status the client treats as an error.
    /// Still a valid HTTP response and forwarded as such.
    Rejected(UpstreamResponse),
    /// No valid HTTP response was produced.
    Failed(TransportError),
}

/// Executes upstream exchanges. Timeouts and cancellation are its concern.
pub trait UpstreamClient: Send + Sync {
    fn exchange<'a>(
        &'a self,
        request: UpstreamRequest,
        mapping: &'a Mapping,
    ) -> BoxFuture<'a, UpstreamOutcome>;

    /// Release per-mapping resources for mappings `keep` rejects.
    fn retain_mappings(&self, _keep: &dyn Fn(&str) -> bool) {}
}

type HttpClient = Client<HttpsConnector<HttpConnector>, Body>;

/// hyper-backed upstream client with a connection pool per mapping.
#[derive(Default)]
pub struct HyperUpstreamClient {
    clients: DashMap<String, (ClientTuning, HttpClient)>,
}

impl HyperUpstreamClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn client_for(&self, mapping: &Mapping) -> Result<HttpClient, TransportError> {
        if let Some(entry) = self.clients.get(mapping.name()) {
            if entry.0 == *mapping.tuning() {
                return Ok(entry.1.clone());
            }
        }

        tracing::debug!(
            mapping = %mapping.name(),
            tuning = ?mapping.tuning(),
            "Building upstream client"
        );
        let client = build_client(mapping.tuning())?;
        self.clients.insert(
            mapping.name().to_owned(),
            (mapping.tuning().clone(), client.clone()),
        );
        Ok(client)
    }

    async fn send(&self, request: UpstreamRequest, mapping: &Mapping) -> UpstreamOutcome {
        let client = match self.client_for(mapping) {
            Ok(client) => client,
            Err(e) => return UpstreamOutcome::Failed(e),
        };
        let tuning = mapping.tuning();

        let mut req = Request::new(Body::from(request.body));
        *req.method_mut() = request.method;
        *req.uri_mut() = request.uri;
        *req.headers_mut() = request.headers;

        let exchange = async {
            let response = client.request(req).await.map_err(classify)?;
            let (parts, body) = response.into_parts();
            let body = axum::body::to_bytes(Body::new(body), tuning.max_response_bytes)
                .await
                .map_err(|e| TransportError::Body(error_chain(&e)))?;
            Ok::<_, TransportError>(UpstreamResponse {
                status: parts.status,
                headers: parts.headers,
                body,
            })
        };

        match tokio::time::timeout(tuning.read_timeout, exchange).await {
            Ok(Ok(response)) => UpstreamOutcome::Completed(response),
            Ok(Err(e)) => UpstreamOutcome::Failed(e),
            Err(_) => UpstreamOutcome::Failed(TransportError::Timeout(tuning.read_timeout)),
        }
    }
}

impl UpstreamClient for HyperUpstreamClient {
    fn exchange<'a>(
        &'a self,
        request: UpstreamRequest,
        mapping: &'a Mapping,
    ) -> BoxFuture<'a, UpstreamOutcome> {
        Box::pin(self.send(request, mapping))
    }

    fn retain_mappings(&self, keep: &dyn Fn(&str) -> bool) {
        self.clients.retain(|name, _| keep(name.as_str()));
    }
}

fn build_client(tuning: &ClientTuning) -> Result<HttpClient, TransportError> {
    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http.set_connect_timeout(Some(tuning.connect_timeout));
    http.set_nodelay(true);

    let tls = tls_config().map_err(|e| TransportError::Connect(format!("TLS setup: {e}")))?;
    let connector = HttpsConnectorBuilder::new()
        .with_tls_config(tls)
        .https_or_http()
        .enable_http1()
        .wrap_connector(http);

    Ok(Client::builder(TokioExecutor::new())
        .pool_max_idle_per_host(tuning.max_idle_per_host)
        .build(connector))
}

/// rustls client config pinned to the ring provider, trusting the webpki roots.
fn tls_config() -> Result<ClientConfig, rustls::Error> {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    Ok(
        ClientConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
            .with_safe_default_protocol_versions()?
            .with_root_certificates(roots)
            .with_no_client_auth(),
    )
}

fn classify(e: hyper_util::client::legacy::Error) -> TransportError {
    if e.is_connect() {
        TransportError::Connect(error_chain(&e))
    } else {
        TransportError::Protocol(error_chain(&e))
    }
}

/// Flatten an error and its sources into one line.
fn error_chain(e: &dyn StdError) -> String {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
