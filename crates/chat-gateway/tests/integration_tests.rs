//! Integration tests for chat-gateway.
//!
//! These tests require either:
//! 1. Nothing (config and connection-failure tests)
//! 2. A running gateway daemon and DIGEST_TEST_PHONE (ignored tests)
//!
//! Run all integration tests:
//!   cargo test --test integration_tests
//!
//! Run ignored tests (require daemon):
//!   cargo test --test integration_tests -- --ignored

use chat_gateway::{BotConfig, GatewayClient, GatewayConfig, GatewayError, GatewaySessionFactory};
use digest_core::SessionFactory;
use futures::StreamExt;
use std::env;

/// Helper to get the test session phone from environment.
fn get_test_phone() -> Option<String> {
    env::var("DIGEST_TEST_PHONE").ok()
}

// ============================================================================
// Unit tests (no daemon required)
// ============================================================================

mod config_tests {
    use super::*;

    #[test]
    fn test_gateway_config_default() {
        let config = GatewayConfig::default();
        assert_eq!(config.base_url, "http://127.0.0.1:8090");
        assert_eq!(config.page_size, 100);
    }

    #[test]
    fn test_gateway_config_urls() {
        let config = GatewayConfig::new("http://localhost:9000");
        assert_eq!(config.rpc_url(), "http://localhost:9000/api/v1/rpc");
        assert_eq!(config.check_url(), "http://localhost:9000/api/v1/check");
    }

    #[test]
    fn test_gateway_config_page_size() {
        let config = GatewayConfig::default().with_page_size(20);
        assert_eq!(config.page_size, 20);
    }

    #[test]
    fn test_bot_config_default_url() {
        let config = BotConfig::new("token");
        assert_eq!(config.api_url, "https://api.telegram.org");
        assert_eq!(
            config.method_url("editMessageText"),
            "https://api.telegram.org/bottoken/editMessageText"
        );
    }
}

// ============================================================================
// Integration tests (require running daemon)
// ============================================================================

mod daemon_connection_tests {
    use super::*;

    /// Test connection failure to non-existent daemon.
    #[tokio::test]
    async fn test_connect_failure() {
        let config = GatewayConfig::new("http://127.0.0.1:59998");
        let result = GatewayClient::connect(config).await;
        assert!(result.is_err());
        match result.unwrap_err() {
            GatewayError::Http(_) => {} // Expected
            e => panic!("Unexpected error type: {:?}", e),
        }
    }

    /// Test health check against running daemon.
    #[tokio::test]
    #[ignore = "requires running daemon"]
    async fn test_health_check() {
        let client = GatewayClient::connect(GatewayConfig::from_env()).await.unwrap();
        assert!(client.health_check().await.unwrap());
        assert!(client.is_connected());
    }

    /// Test enumerating dialogs of a live session.
    #[tokio::test]
    #[ignore = "requires running daemon and DIGEST_TEST_PHONE"]
    async fn test_list_dialogs() {
        let phone = get_test_phone().expect("DIGEST_TEST_PHONE not set");
        let factory = GatewaySessionFactory::connect(GatewayConfig::from_env())
            .await
            .unwrap();
        let session = factory.open(&phone).await.unwrap();

        let dialogs: Vec<_> = session.dialogs().take(5).collect().await;
        assert!(!dialogs.is_empty());
        session.close().await.unwrap();
    }
}
