//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Every mapping has a unique name and at least one destination
//! - Destinations are absolute http(s) URLs
//! - Validate value ranges (timeouts > 0 and below the listener timeout, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::{GatewayConfig, MappingConfig};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid listener bind address `{0}`")]
    BindAddress(String),

    #[error("invalid metrics address `{0}`")]
    MetricsAddress(String),

    #[error("metrics names prefix must not be empty")]
    EmptyMetricsPrefix,

    #[error("mapping #{0} has an empty name")]
    EmptyName(usize),

    #[error("mapping name `{0}` is used more than once")]
    DuplicateName(String),

    #[error("mapping `{0}` has no destinations")]
    NoDestinations(String),

    #[error("mapping `{mapping}` destination `{destination}`: {reason}")]
    Destination {
        mapping: String,
        destination: String,
        reason: String,
    },

    #[error("mapping `{0}` path prefix must start with `/`")]
    PathPrefix(String),

    #[error("mapping `{0}` timeouts must be greater than zero")]
    Timeout(String),

    #[error("mapping `{mapping}` read timeout {read_ms}ms must be below {request_timeout_ms}ms")]
    ReadTimeoutTooLong {
        mapping: String,
        read_ms: u64,
        request_timeout_ms: u64,
    },
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }
    if config.metrics.enabled && config.metrics.address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::MetricsAddress(config.metrics.address.clone()));
    }
    if config.metrics.names_prefix.is_empty() {
        errors.push(ValidationError::EmptyMetricsPrefix);
    }

    let request_timeout_ms = config.listener.request_timeout_secs.saturating_mul(1000);
    let mut seen = HashSet::new();
    for (index, mapping) in config.mappings.iter().enumerate() {
        if mapping.name.is_empty() {
            errors.push(ValidationError::EmptyName(index));
        } else if !seen.insert(mapping.name.as_str()) {
            errors.push(ValidationError::DuplicateName(mapping.name.clone()));
        }
        validate_mapping(mapping, request_timeout_ms, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_mapping(
    mapping: &MappingConfig,
    request_timeout_ms: u64,
    errors: &mut Vec<ValidationError>,
) {
    if mapping.destinations.is_empty() {
        errors.push(ValidationError::NoDestinations(mapping.name.clone()));
    }

    for destination in &mapping.destinations {
        let reason = match Url::parse(destination) {
            Ok(url) if !matches!(url.scheme(), "http" | "https") => {
                Some(format!("unsupported scheme `{}`", url.scheme()))
            }
            Ok(url) if url.host().is_none() => Some("missing host".to_string()),
            Ok(_) => None,
            Err(e) => Some(e.to_string()),
        };
        if let Some(reason) = reason {
            errors.push(ValidationError::Destination {
                mapping: mapping.name.clone(),
                destination: destination.clone(),
                reason,
            });
        }
    }

    if let Some(path) = &mapping.path {
        if !path.starts_with('/') {
            errors.push(ValidationError::PathPrefix(mapping.name.clone()));
        }
    }

    if mapping.timeout.connect_ms == 0 || mapping.timeout.read_ms == 0 {
        errors.push(ValidationError::Timeout(mapping.name.clone()));
    }

    // The listener timeout must never fire while an attempt is still allowed to run.
    if mapping.timeout.read_ms >= request_timeout_ms {
        errors.push(ValidationError::ReadTimeoutTooLong {
            mapping: mapping.name.clone(),
            read_ms: mapping.timeout.read_ms,
            request_timeout_ms,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{InterceptorConfig, TimeoutConfig};

    fn mapping(name: &str, destinations: &[&str]) -> MappingConfig {
        MappingConfig {
            name: name.into(),
            host: None,
            path: Some("/".into()),
            destinations: destinations.iter().map(|d| d.to_string()).collect(),
            timeout: TimeoutConfig::default(),
            max_response_bytes: 1024,
            max_idle_per_host: 1,
            interceptors: InterceptorConfig::default(),
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = GatewayConfig::default();
        config.mappings.push(mapping("a", &[]));
        config.mappings.push(mapping("a", &["ftp://files"]));
        config.mappings.push(mapping("b", &["not a url"]));

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::NoDestinations("a".into())));
        assert!(errors.contains(&ValidationError::DuplicateName("a".into())));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::Destination { mapping, .. } if mapping == "b")));
        assert!(errors
            .iter()
            .any(|e| matches!(
                e,
                ValidationError::Destination { reason, .. } if reason.contains("ftp")
            )));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = GatewayConfig::default();
        let mut m = mapping("a", &["http://127.0.0.1:3000"]);
        m.timeout.read_ms = 0;
        config.mappings.push(m);

        assert_eq!(
            validate_config(&config).unwrap_err(),
            vec![ValidationError::Timeout("a".into())]
        );
    }

    #[test]
    fn test_read_timeout_must_fit_request_timeout() {
        let mut config = GatewayConfig::default();
        config.listener.request_timeout_secs = 1;
        let mut m = mapping("a", &["http://127.0.0.1:3000"]);
        m.timeout.read_ms = 5_000;
        config.mappings.push(m);

        assert_eq!(
            validate_config(&config).unwrap_err(),
            vec![ValidationError::ReadTimeoutTooLong {
                mapping: "a".into(),
                read_ms: 5_000,
                request_timeout_ms: 1_000,
            }]
        );

        config.mappings[0].timeout.read_ms = 1_000;
        assert_eq!(validate_config(&config).unwrap_err().len(), 1);

        config.mappings[0].timeout.read_ms = 999;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_https_destination_accepted() {
        let mut config = GatewayConfig::default();
        config.mappings.push(mapping("tls", &["https://backend.example.com:8443"]));
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_relative_path_prefix_rejected() {
        let mut config = GatewayConfig::default();
        let mut m = mapping("a", &["http://127.0.0.1:3000"]);
        m.path = Some("api".into());
        config.mappings.push(m);

        assert_eq!(
            validate_config(&config).unwrap_err(),
            vec![ValidationError::PathPrefix("a".into())]
        );
    }
}
