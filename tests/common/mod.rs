//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode};
use futures_util::future::BoxFuture;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use edge_proxy::forwarder::{
    TransportError, UpstreamClient, UpstreamOutcome, UpstreamRequest, UpstreamResponse,
};
use edge_proxy::http::TraceId;
use edge_proxy::observability::{
    BoxError, ForwardComplete, ForwardStart, MetricsSink, TraceInterceptor,
};
use edge_proxy::routing::Mapping;

/// One recorded trace hook invocation.
#[derive(Debug, Clone)]
pub enum TraceEvent {
    Start {
        trace_id: TraceId,
        mapping: String,
        method: Method,
        host: String,
        destination: String,
        body: Bytes,
        headers: HeaderMap,
    },
    Complete {
        trace_id: TraceId,
        status: StatusCode,
        body: Bytes,
        headers: HeaderMap,
    },
    Failed {
        trace_id: TraceId,
        error: TransportError,
    },
}

/// Trace hooks that remember every call, optionally failing each one.
#[derive(Default)]
pub struct RecordingTrace {
    pub events: Mutex<Vec<TraceEvent>>,
    pub fail: bool,
}

impl RecordingTrace {
    pub fn failing() -> Self {
        Self {
            events: Mutex::default(),
            fail: true,
        }
    }

    pub fn events(&self) -> Vec<TraceEvent> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: TraceEvent) -> Result<(), BoxError> {
        self.events.lock().unwrap().push(event);
        if self.fail {
            Err("hook exploded".into())
        } else {
            Ok(())
        }
    }
}

impl TraceInterceptor for RecordingTrace {
    fn on_forward_start(&self, event: &ForwardStart<'_>) -> Result<(), BoxError> {
        self.push(TraceEvent::Start {
            trace_id: event.trace_id.clone(),
            mapping: event.mapping_name.to_owned(),
            method: event.method.clone(),
            host: event.host.to_owned(),
            destination: event.destination.to_string(),
            body: event.body.clone(),
            headers: event.headers.clone(),
        })
    }

    fn on_forward_complete(&self, event: &ForwardComplete<'_>) -> Result<(), BoxError> {
        self.push(TraceEvent::Complete {
            trace_id: event.trace_id.clone(),
            status: event.status,
            body: event.body.clone(),
            headers: event.headers.clone(),
        })
    }

    fn on_forward_failed(
        &self,
        trace_id: &TraceId,
        error: &TransportError,
    ) -> Result<(), BoxError> {
        self.push(TraceEvent::Failed {
            trace_id: trace_id.clone(),
            error: error.clone(),
        })
    }
}

/// Metrics sink that remembers every observation.
#[derive(Default)]
pub struct RecordingSink {
    pub observations: Mutex<Vec<(String, Duration)>>,
}

impl RecordingSink {
    pub fn names(&self) -> Vec<String> {
        self.observations
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }
}

impl MetricsSink for RecordingSink {
    fn record_latency(&self, metric_name: &str, elapsed: Duration) {
        self.observations
            .lock()
            .unwrap()
            .push((metric_name.to_owned(), elapsed));
    }
}

type Script = dyn Fn(&UpstreamRequest) -> UpstreamOutcome + Send + Sync;

/// Upstream client answering from a closure and recording each request.
pub struct ScriptedUpstream {
    script: Box<Script>,
    pub requests: Mutex<Vec<UpstreamRequest>>,
}

impl ScriptedUpstream {
    pub fn new<F>(script: F) -> Self
    where
        F: Fn(&UpstreamRequest) -> UpstreamOutcome + Send + Sync + 'static,
    {
        Self {
            script: Box::new(script),
            requests: Mutex::default(),
        }
    }

    /// Always answers `status` with `body` and the given headers.
    pub fn responding(status: StatusCode, headers: HeaderMap, body: &'static [u8]) -> Self {
        Self::new(move |_| {
            UpstreamOutcome::Completed(UpstreamResponse {
                status,
                headers: headers.clone(),
                body: Bytes::from_static(body),
            })
        })
    }

    pub fn requests(&self) -> Vec<UpstreamRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl UpstreamClient for ScriptedUpstream {
    fn exchange<'a>(
        &'a self,
        request: UpstreamRequest,
        _mapping: &'a Mapping,
    ) -> BoxFuture<'a, UpstreamOutcome> {
        let outcome = (self.script)(&request);
        self.requests.lock().unwrap().push(request);
        Box::pin(async move { outcome })
    }
}

/// Start a programmable raw HTTP/1.1 backend on an ephemeral port.
///
/// `f` receives the request head and returns (status line, extra headers, body).
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (&'static str, Vec<(&'static str, String)>, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = f.clone();
            tokio::spawn(async move {
                let mut buf = vec![0u8; 16 * 1024];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                let head = String::from_utf8_lossy(&buf[..n]).into_owned();

                let (status, headers, body) = f(head).await;
                let mut response =
                    format!("HTTP/1.1 {}\r\nContent-Length: {}\r\n", status, body.len());
                for (name, value) in headers {
                    response.push_str(&format!("{}: {}\r\n", name, value));
                }
                response.push_str("Connection: close\r\n\r\n");
                response.push_str(&body);

                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// An address with nothing listening on it.
pub async fn closed_port() -> SocketAddr {
    TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap()
        .local_addr()
        .unwrap()
}
