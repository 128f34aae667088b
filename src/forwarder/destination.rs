//! Forward destination resolution.

use std::str::FromStr;

use axum::http::Uri;

use crate::forwarder::error::{InvalidDestination, ResolutionError};
use crate::load_balancer::Destination;
use crate::routing::Mapping;

/// Where one forward attempt goes. Computed once per attempt.
#[derive(Debug, Clone)]
pub struct ForwardDestination {
    uri: Uri,
    mapping_name: String,
    metrics_name: String,
}

impl ForwardDestination {
    /// Join `base` and the inbound path+query verbatim.
    pub fn resolve(
        base: &Destination,
        request_uri: &str,
        mapping: &Mapping,
        metrics_prefix: &str,
    ) -> Result<Self, ResolutionError> {
        let raw = format!("{}{}", base, request_uri);
        let uri = parse_absolute(&raw).map_err(|cause| {
            ResolutionError::new(
                format!(
                    "Error creating destination URL from HTTP request URI `{}` using mapping `{}`",
                    request_uri,
                    mapping.name()
                ),
                cause,
            )
        })?;

        Ok(Self {
            uri,
            mapping_name: mapping.name().to_owned(),
            metrics_name: metrics_name(metrics_prefix, mapping.name()),
        })
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn mapping_name(&self) -> &str {
        &self.mapping_name
    }

    pub fn metrics_name(&self) -> &str {
        &self.metrics_name
    }
}

/// `<prefix>.<mapping name>`
pub fn metrics_name(prefix: &str, mapping_name: &str) -> String {
    format!("{}.{}", prefix, mapping_name)
}

fn parse_absolute(raw: &str) -> Result<Uri, InvalidDestination> {
    let uri = Uri::from_str(raw)?;
    if uri.scheme().is_none() || uri.authority().is_none() {
        return Err(InvalidDestination::NotAbsolute(raw.to_owned()));
    }
    Ok(uri)
}
