//! [`Notifier`] implementation over the bot HTTP API.

use std::time::Duration;

use async_trait::async_trait;
use digest_core::{MessageHandle, Notifier, NotifyError};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::BotConfig;
use crate::error::GatewayError;
use crate::types::{BotMessage, BotResponse, EditMessageParams, SendMessageParams};

/// Sends and edits messages on behalf of the bot.
#[derive(Clone)]
pub struct BotNotifier {
    http: Client,
    config: BotConfig,
}

impl BotNotifier {
    /// Create a notifier for the given bot.
    pub fn new(config: BotConfig) -> Result<Self, GatewayError> {
        if config.token.is_empty() {
            return Err(GatewayError::Config("bot token is empty".to_string()));
        }
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(GatewayError::Http)?;
        Ok(Self { http, config })
    }

    /// Create a notifier from environment variables.
    ///
    /// See [`BotConfig::from_env`].
    pub fn from_env() -> Result<Self, GatewayError> {
        Self::new(BotConfig::from_env()?)
    }

    async fn call<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: &P,
    ) -> Result<R, GatewayError> {
        debug!("Bot API call: {}", method);

        let response = self
            .http
            .post(self.config.method_url(method))
            .json(params)
            .send()
            .await
            .map_err(GatewayError::Http)?;

        // Error responses carry a JSON body too, so decode regardless of status.
        let body = response.text().await.map_err(GatewayError::Http)?;
        let parsed: BotResponse<R> = serde_json::from_str(&body)?;

        if !parsed.ok {
            let code = parsed.error_code.unwrap_or_default();
            let description = parsed.description.unwrap_or_default();
            if let Some(retry_after) = parsed.parameters.and_then(|p| p.retry_after) {
                warn!("Bot API asked to retry after {}s on {}", retry_after, method);
            }
            return Err(GatewayError::Bot { code, description });
        }

        parsed.result.ok_or_else(|| GatewayError::Bot {
            code: -1,
            description: format!("{} returned no result", method),
        })
    }
}

#[async_trait]
impl Notifier for BotNotifier {
    async fn send(&self, recipient: i64, text: &str) -> Result<MessageHandle, NotifyError> {
        let params = SendMessageParams {
            chat_id: recipient,
            text: text.to_string(),
        };
        let message: BotMessage = self.call("sendMessage", &params).await?;
        Ok(MessageHandle {
            chat_id: message.chat.id,
            message_id: message.message_id,
        })
    }

    async fn edit(
        &self,
        recipient: i64,
        handle: &MessageHandle,
        text: &str,
    ) -> Result<(), NotifyError> {
        let params = EditMessageParams {
            chat_id: recipient,
            message_id: handle.message_id,
            text: text.to_string(),
        };
        // editMessageText returns the edited message, or `true` for inline messages.
        let _: Value = self.call("editMessageText", &params).await?;
        Ok(())
    }
}

impl std::fmt::Debug for BotNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotNotifier")
            .field("api_url", &self.config.api_url)
            .finish()
    }
}
