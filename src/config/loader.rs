//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<GatewayConfig, ConfigError> {
    let config: GatewayConfig = toml::from_str(content).map_err(ConfigError::Parse)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_balancer::BalancerPolicy;
    use std::io::Write;

    const SAMPLE: &str = r#"
balancer = "random"

[metrics]
names_prefix = "gw"
enabled = false

[[mappings]]
name = "svc-a"
host = "a.example.com"
path = "/api"
destinations = ["http://10.0.0.1:8080", "http://10.0.0.2:8080"]

[mappings.timeout]
connect_ms = 500
read_ms = 1500

[mappings.interceptors.response_headers]
"X-Served-By" = "edge"

[[mappings]]
name = "fallback"
destinations = ["http://10.0.0.9"]
"#;

    #[test]
    fn test_parse_sample() {
        let config = parse_config(SAMPLE).unwrap();
        assert_eq!(config.balancer, BalancerPolicy::Random);
        assert_eq!(config.metrics.names_prefix, "gw");
        assert_eq!(config.mappings.len(), 2);

        let a = &config.mappings[0];
        assert_eq!(a.host.as_deref(), Some("a.example.com"));
        assert_eq!(a.timeout.connect_ms, 500);
        assert_eq!(a.interceptors.response_headers["X-Served-By"], "edge");

        let fallback = &config.mappings[1];
        assert_eq!(fallback.path, None);
        assert_eq!(fallback.timeout.read_ms, 20_000);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.mappings[0].name, "svc-a");
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let err = parse_config(
            r#"
[[mappings]]
name = "empty"
destinations = []
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("`empty` has no destinations"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
