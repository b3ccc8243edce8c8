//! Configuration types for chat-gateway.

use std::env;

use crate::error::GatewayError;

/// Default gateway daemon URL.
pub const DEFAULT_GATEWAY_URL: &str = "http://127.0.0.1:8090";

/// Default bot API URL.
pub const DEFAULT_BOT_API_URL: &str = "https://api.telegram.org";

/// Configuration for connecting to the user-session gateway daemon.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of the daemon HTTP server (e.g., "http://localhost:8090").
    pub base_url: String,
    /// Page size used when walking dialogs and chat history.
    pub page_size: u32,
}

impl GatewayConfig {
    /// Create a new configuration with the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            page_size: 100,
        }
    }

    /// Create configuration from `CHAT_GATEWAY_URL` and `CHAT_GATEWAY_PAGE_SIZE`.
    pub fn from_env() -> Self {
        let mut config = Self::new(
            env::var("CHAT_GATEWAY_URL").unwrap_or_else(|_| DEFAULT_GATEWAY_URL.to_string()),
        );
        if let Some(page_size) = env::var("CHAT_GATEWAY_PAGE_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.page_size = page_size;
        }
        config
    }

    /// Set the page size.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Get the RPC endpoint URL.
    pub fn rpc_url(&self) -> String {
        format!("{}/api/v1/rpc", self.base_url)
    }

    /// Get the health check endpoint URL.
    pub fn check_url(&self) -> String {
        format!("{}/api/v1/check", self.base_url)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::new(DEFAULT_GATEWAY_URL)
    }
}

/// Configuration for the bot HTTP API.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Base URL of the bot API.
    pub api_url: String,
    /// Bot token.
    pub token: String,
}

impl BotConfig {
    /// Create a configuration for the default API URL.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            api_url: DEFAULT_BOT_API_URL.to_string(),
            token: token.into(),
        }
    }

    /// Create configuration from `BOT_TOKEN` (required) and `BOT_API_URL`.
    pub fn from_env() -> Result<Self, GatewayError> {
        let token = env::var("BOT_TOKEN")
            .map_err(|_| GatewayError::Config("BOT_TOKEN not set".to_string()))?;
        let api_url = env::var("BOT_API_URL").unwrap_or_else(|_| DEFAULT_BOT_API_URL.to_string());
        Ok(Self { api_url, token })
    }

    /// Set the API URL.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// URL for a bot API method.
    pub fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token, method)
    }
}
