//! Types for the bot HTTP API.

use serde::{Deserialize, Serialize};

/// Parameters for `sendMessage`.
#[derive(Debug, Clone, Serialize)]
pub struct SendMessageParams {
    pub chat_id: i64,
    pub text: String,
}

/// Parameters for `editMessageText`.
#[derive(Debug, Clone, Serialize)]
pub struct EditMessageParams {
    pub chat_id: i64,
    pub message_id: i64,
    pub text: String,
}

/// Envelope of every bot API response.
#[derive(Debug, Clone, Deserialize)]
pub struct BotResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    #[serde(default)]
    pub error_code: Option<i32>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: Option<ResponseParameters>,
}

/// Extra error information.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseParameters {
    #[serde(default)]
    pub retry_after: Option<u64>,
}

/// A message returned by `sendMessage`.
#[derive(Debug, Clone, Deserialize)]
pub struct BotMessage {
    pub message_id: i64,
    pub chat: BotChat,
}

/// Chat reference inside a [`BotMessage`].
#[derive(Debug, Clone, Deserialize)]
pub struct BotChat {
    pub id: i64,
}
