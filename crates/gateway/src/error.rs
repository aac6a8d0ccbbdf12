//! Gateway failure outcomes.

use nexus_core::AppError;
use std::time::Duration;
use thiserror::Error;

/// Terminal outcome of a backend call that did not produce a result.
///
/// `Transport` is the only kind a gateway implementation produces itself. It
/// covers unreachable hosts, non-success statuses and malformed bodies alike.
/// `Timeout` and `Cancelled` are produced by the caller that enforces a
/// deadline or cancellation around the call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("request cancelled")]
    Cancelled,
}

/// Convenience type alias for gateway results.
pub type GatewayResult<T> = Result<T, GatewayError>;

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        AppError::Gateway(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_app_error() {
        let app: AppError = GatewayError::Transport("connection refused".to_string()).into();
        assert_eq!(
            app.to_string(),
            "Gateway error: transport failure: connection refused"
        );
    }

    #[test]
    fn test_timeout_display() {
        let err = GatewayError::Timeout(Duration::from_secs(3));
        assert_eq!(err.to_string(), "request timed out after 3s");
    }
}
