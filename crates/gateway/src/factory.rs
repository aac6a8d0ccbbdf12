//! Gateway factory.
//!
//! Builds the gateway the rest of the client uses from application
//! configuration, so the backend location is injected rather than baked in.

use crate::client::RagGateway;
use crate::providers::HttpGateway;
use nexus_core::{AppConfig, AppResult};
use std::sync::Arc;

/// Create a gateway for the configured backend.
///
/// # Errors
/// Returns a configuration error if the endpoint, timeout or query options
/// are invalid.
pub fn create_gateway(config: &AppConfig) -> AppResult<Arc<dyn RagGateway>> {
    config.validate()?;

    let endpoint = config.endpoint.trim();
    tracing::debug!("Creating HTTP gateway for {}", endpoint);

    Ok(Arc::new(HttpGateway::with_base_url(endpoint)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_default_gateway() {
        let gateway = create_gateway(&AppConfig::default()).unwrap();
        assert_eq!(gateway.endpoint(), "http://localhost:8000");
    }

    #[test]
    fn test_create_with_custom_endpoint() {
        let mut config = AppConfig::default();
        config.endpoint = " https://rag.example.com/ ".to_string();
        let gateway = create_gateway(&config).unwrap();
        assert_eq!(gateway.endpoint(), "https://rag.example.com");
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        let mut config = AppConfig::default();
        config.endpoint = "ftp://rag.example.com".to_string();
        match create_gateway(&config) {
            Err(err) => assert!(err.to_string().contains("Unsupported endpoint")),
            Ok(_) => panic!("Expected error for ftp endpoint"),
        }
    }
}
