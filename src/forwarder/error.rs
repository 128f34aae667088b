//! Forwarding error taxonomy.
//!
//! An upstream answering with 4xx/5xx is not an error here; it is forwarded as
//! data. Only two things fail a forward attempt:
//! - `ResolutionError`: no valid upstream URI could be built, nothing was sent
//! - `TransportError`: the upstream call produced no valid HTTP response

use std::time::Duration;

use axum::http::uri::InvalidUri;
use thiserror::Error;

/// The upstream call could not produce a well-formed HTTP response.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("upstream did not answer within {0:?}")]
    Timeout(Duration),

    #[error("upstream connection failed: {0}")]
    Connect(String),

    #[error("upstream protocol error: {0}")]
    Protocol(String),

    #[error("upstream response body error: {0}")]
    Body(String),
}

impl TransportError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout(_))
    }
}

/// Why a destination URI was rejected.
#[derive(Debug, Error)]
pub enum InvalidDestination {
    #[error(transparent)]
    Syntax(#[from] InvalidUri),

    #[error("`{0}` is not an absolute URI")]
    NotAbsolute(String),
}

/// Building the upstream URI from a destination and the inbound path failed.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ResolutionError {
    message: String,
    #[source]
    cause: InvalidDestination,
}

impl ResolutionError {
    pub fn new(message: impl Into<String>, cause: InvalidDestination) -> Self {
        Self {
            message: message.into(),
            cause,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> &InvalidDestination {
        &self.cause
    }
}

/// Failure of `RequestForwarder::forward`.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_resolution_error_keeps_cause() {
        let err = ResolutionError::new(
            "bad destination",
            InvalidDestination::NotAbsolute("/relative".into()),
        );
        assert_eq!(err.to_string(), "bad destination");
        assert_eq!(
            err.source().unwrap().to_string(),
            "`/relative` is not an absolute URI"
        );
    }

    #[test]
    fn test_forward_error_is_transparent() {
        let err: ForwardError = TransportError::Connect("refused".into()).into();
        assert_eq!(err.to_string(), "upstream connection failed: refused");
    }
}
