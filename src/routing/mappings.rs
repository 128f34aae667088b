//! Mapping table and lookup.
//!
//! # Responsibilities
//! - Compile mapping configs into immutable `Mapping`s
//! - Look up the first mapping (configuration order) matching a host/path
//! - Swap the whole table atomically on reload
//!
//! # Design Decisions
//! - Readers load one `Arc<MappingTable>` per lookup and never see a partial table
//! - Writers build a fresh table and publish it with a single pointer swap
//! - Explicit `None` rather than a silent default mapping

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::http::{HeaderName, HeaderValue};
use thiserror::Error;

use crate::config::MappingConfig;
use crate::load_balancer::{Destination, DestinationPool, EmptyPool};
use crate::routing::matcher::{AndMatcher, Matcher};

#[derive(Debug, Error)]
pub enum MappingError {
    #[error(transparent)]
    EmptyPool(#[from] EmptyPool),

    #[error("mapping `{mapping}` has an invalid interceptor header `{header}`")]
    InvalidHeader { mapping: String, header: String },
}

/// Per-mapping upstream client tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientTuning {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub max_response_bytes: usize,
    pub max_idle_per_host: usize,
}

impl Default for ClientTuning {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_millis(2_000),
            read_timeout: Duration::from_millis(20_000),
            max_response_bytes: 16 * 1024 * 1024,
            max_idle_per_host: 32,
        }
    }
}

/// Post-forward interceptor settings enabled for a mapping.
#[derive(Debug, Clone, Default)]
pub struct InterceptorSettings {
    /// Headers set (overwriting) on every response.
    pub response_headers: Vec<(HeaderName, HeaderValue)>,
}

/// An immutable route: match rule, destination pool and client tuning.
#[derive(Debug)]
pub struct Mapping {
    name: String,
    rule: AndMatcher,
    pool: DestinationPool,
    tuning: ClientTuning,
    interceptors: InterceptorSettings,
}

impl Mapping {
    /// A mapping matching every request, with default tuning.
    pub fn new(
        name: impl Into<String>,
        destinations: Vec<Destination>,
    ) -> Result<Self, MappingError> {
        let name = name.into();
        let pool = DestinationPool::new(name.clone(), destinations)?;
        Ok(Self {
            name,
            rule: AndMatcher::default(),
            pool,
            tuning: ClientTuning::default(),
            interceptors: InterceptorSettings::default(),
        })
    }

    pub fn with_rule(mut self, host: Option<&str>, path_prefix: Option<&str>) -> Self {
        self.rule = AndMatcher::for_route(host, path_prefix);
        self
    }

    pub fn with_tuning(mut self, tuning: ClientTuning) -> Self {
        self.tuning = tuning;
        self
    }

    pub fn with_interceptors(mut self, interceptors: InterceptorSettings) -> Self {
        self.interceptors = interceptors;
        self
    }

    /// Compile a mapping from its configuration.
    pub fn from_config(config: &MappingConfig) -> Result<Self, MappingError> {
        let destinations = config.destinations.iter().map(Destination::new).collect();

        let mut response_headers = Vec::with_capacity(config.interceptors.response_headers.len());
        for (name, value) in &config.interceptors.response_headers {
            let invalid = || MappingError::InvalidHeader {
                mapping: config.name.clone(),
                header: name.clone(),
            };
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
            let value = HeaderValue::from_str(value).map_err(|_| invalid())?;
            response_headers.push((name, value));
        }

        let tuning = ClientTuning {
            connect_timeout: Duration::from_millis(config.timeout.connect_ms),
            read_timeout: Duration::from_millis(config.timeout.read_ms),
            max_response_bytes: config.max_response_bytes,
            max_idle_per_host: config.max_idle_per_host,
        };

        Ok(Self::new(config.name.clone(), destinations)?
            .with_rule(config.host.as_deref(), config.path.as_deref())
            .with_tuning(tuning)
            .with_interceptors(InterceptorSettings { response_headers }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pool(&self) -> &DestinationPool {
        &self.pool
    }

    pub fn destinations(&self) -> &[Destination] {
        self.pool.destinations()
    }

    pub fn tuning(&self) -> &ClientTuning {
        &self.tuning
    }

    pub fn interceptors(&self) -> &InterceptorSettings {
        &self.interceptors
    }

    pub fn matches(&self, host: &str, path: &str) -> bool {
        self.rule.matches(host, path)
    }
}

/// One consistent generation of the route table.
#[derive(Debug, Default)]
pub struct MappingTable {
    mappings: Vec<Arc<Mapping>>,
}

impl MappingTable {
    pub fn new(mappings: Vec<Mapping>) -> Self {
        Self {
            mappings: mappings.into_iter().map(Arc::new).collect(),
        }
    }

    /// First mapping, in configuration order, accepting the host/path pair.
    pub fn resolve(&self, host: &str, path: &str) -> Option<&Arc<Mapping>> {
        self.mappings.iter().find(|m| m.matches(host, path))
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Mapping>> {
        self.mappings.iter().find(|m| m.name() == name)
    }

    pub fn mappings(&self) -> &[Arc<Mapping>] {
        &self.mappings
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

/// Holds the live route table; safe to query while it is being replaced.
#[derive(Debug)]
pub struct MappingsProvider {
    table: ArcSwap<MappingTable>,
}

impl MappingsProvider {
    pub fn new(mappings: Vec<Mapping>) -> Self {
        Self {
            table: ArcSwap::from_pointee(MappingTable::new(mappings)),
        }
    }

    pub fn from_config(configs: &[MappingConfig]) -> Result<Self, MappingError> {
        Ok(Self::new(compile(configs)?))
    }

    pub fn resolve(&self, host: &str, path: &str) -> Option<Arc<Mapping>> {
        let table = self.table.load();
        let found = table.resolve(host, path).cloned();
        if found.is_none() {
            tracing::debug!(
                host = %host,
                path = %path,
                mappings = table.len(),
                "No mapping matched"
            );
        }
        found
    }

    /// The current table generation.
    pub fn snapshot(&self) -> Arc<MappingTable> {
        self.table.load_full()
    }

    /// Publish a new table. In-flight lookups keep the generation they loaded.
    pub fn replace(&self, mappings: Vec<Mapping>) {
        let table = MappingTable::new(mappings);
        tracing::info!(mappings = table.len(), "Mapping table replaced");
        self.table.store(Arc::new(table));
    }
}

/// Compile every mapping config, failing on the first invalid one.
pub fn compile(configs: &[MappingConfig]) -> Result<Vec<Mapping>, MappingError> {
    configs.iter().map(Mapping::from_config).collect()
}
