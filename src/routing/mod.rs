//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (host, path)
//!     → mappings.rs (load current table, ordered lookup)
//!     → matcher.rs (evaluate host / path prefix conditions)
//!     → Return: matched Mapping or None
//!
//! Mapping Compilation (startup and reload):
//!     MappingConfig[]
//!     → Compile matchers, destination pools, client tuning
//!     → Freeze as immutable MappingTable
//!     → Publish via atomic swap
//! ```
//!
//! # Design Decisions
//! - Tables are immutable; reload replaces the whole table
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same mapping
//! - First match wins (configuration order)

pub mod mappings;
pub mod matcher;

pub use mappings::{
    ClientTuning, InterceptorSettings, Mapping, MappingError, MappingTable, MappingsProvider,
};
