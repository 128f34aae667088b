//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::load_balancer::BalancerPolicy;

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, body limits).
    pub listener: ListenerConfig,

    /// Destination selection policy shared by every mapping.
    pub balancer: BalancerPolicy,

    /// Latency metrics settings.
    pub metrics: MetricsConfig,

    /// Forward trace logging.
    pub tracing: TracingConfig,

    /// Log settings.
    pub observability: ObservabilityConfig,

    /// Route definitions, evaluated in order.
    pub mappings: Vec<MappingConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Largest inbound request body that will be buffered and forwarded.
    pub max_body_bytes: usize,

    /// Upper bound on a whole client request, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_bytes: 2 * 1024 * 1024,
            request_timeout_secs: 60,
        }
    }
}

/// Metrics configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Record forward latency and expose the Prometheus endpoint.
    pub enabled: bool,

    /// Prefix of every per-mapping metric name (`<prefix>.<mapping>`).
    pub names_prefix: String,

    /// Prometheus endpoint bind address.
    pub address: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            names_prefix: "edge".to_string(),
            address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TracingConfig {
    /// Log every forward start/complete/failure.
    pub enabled: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// A named route binding a match rule to a pool of destinations.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MappingConfig {
    /// Unique mapping name, also the metric suffix.
    pub name: String,

    /// Host header to match (exact, case-insensitive).
    #[serde(default)]
    pub host: Option<String>,

    /// Path prefix to match.
    #[serde(default)]
    pub path: Option<String>,

    /// Destination base URIs, e.g. "http://10.0.0.1:8080".
    pub destinations: Vec<String>,

    /// Upstream client tuning.
    #[serde(default)]
    pub timeout: TimeoutConfig,

    /// Largest upstream response body accepted, in bytes.
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,

    /// Idle pooled connections kept per upstream host.
    #[serde(default = "default_max_idle_per_host")]
    pub max_idle_per_host: usize,

    /// Post-forward interceptor settings.
    #[serde(default)]
    pub interceptors: InterceptorConfig,
}

fn default_max_response_bytes() -> usize {
    16 * 1024 * 1024
}

fn default_max_idle_per_host() -> usize {
    32
}

/// Upstream timeouts in milliseconds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout.
    pub connect_ms: u64,

    /// Time allowed for the upstream to answer, body included.
    pub read_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_ms: 2_000,
            read_ms: 20_000,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct InterceptorConfig {
    /// Headers set on every response of this mapping.
    pub response_headers: BTreeMap<String, String>,
}
