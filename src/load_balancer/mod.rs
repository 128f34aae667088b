//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Mapping matched → DestinationPool identified
//!     → Apply load balancing policy:
//!         - round_robin.rs (rotate through destinations, per-pool cursor)
//!         - random.rs (uniform pick)
//!     → Return the chosen base URI
//! ```
//!
//! # Design Decisions
//! - A pool is never empty; `DestinationPool::new` refuses an empty list
//! - Policy state lives in the balancer, keyed by pool, never behind a global lock
//! - Policy selection is global (one balancer shared by every mapping)

pub mod random;
pub mod round_robin;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use random::Random;
pub use round_robin::RoundRobin;

/// A backend base URI (scheme + authority, optionally a base path).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Destination(String);

impl Destination {
    pub fn new(base: impl Into<String>) -> Self {
        Self(base.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("destination pool `{0}` has no destinations")]
pub struct EmptyPool(pub String);

/// Ordered, non-empty set of destinations belonging to one mapping.
#[derive(Debug, Clone)]
pub struct DestinationPool {
    key: String,
    destinations: Vec<Destination>,
}

impl DestinationPool {
    /// Create a pool identified by `key` (the owning mapping's name).
    pub fn new(key: impl Into<String>, destinations: Vec<Destination>) -> Result<Self, EmptyPool> {
        let key = key.into();
        if destinations.is_empty() {
            return Err(EmptyPool(key));
        }
        Ok(Self { key, destinations })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn destinations(&self) -> &[Destination] {
        &self.destinations
    }

    pub fn len(&self) -> usize {
        self.destinations.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.destinations.is_empty()
    }

    pub(crate) fn at(&self, index: usize) -> &Destination {
        &self.destinations[index % self.destinations.len()]
    }
}

/// Destination selection policy.
///
/// Called once per forward attempt, possibly from many tasks at once for the
/// same pool.
pub trait LoadBalancer: Send + Sync + fmt::Debug {
    fn choose<'a>(&self, pool: &'a DestinationPool) -> &'a Destination;

    /// Drop any per-pool state for pools whose key `keep` rejects.
    fn retain_pools(&self, _keep: &dyn Fn(&str) -> bool) {}
}

/// Configured balancing policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BalancerPolicy {
    #[default]
    RoundRobin,
    Random,
}

impl BalancerPolicy {
    pub fn build(self) -> Arc<dyn LoadBalancer> {
        match self {
            BalancerPolicy::RoundRobin => Arc::new(RoundRobin::new()),
            BalancerPolicy::Random => Arc::new(Random::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_pool_rejected() {
        let err = DestinationPool::new("svc-a", Vec::new()).unwrap_err();
        assert_eq!(err, EmptyPool("svc-a".into()));
    }

    #[test]
    fn test_policy_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            balancer: BalancerPolicy,
        }
        let w: Wrapper = toml::from_str(r#"balancer = "random""#).unwrap();
        assert_eq!(w.balancer, BalancerPolicy::Random);
    }
}
