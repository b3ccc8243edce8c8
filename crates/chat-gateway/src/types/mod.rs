//! Wire types exchanged with the gateway daemon and the bot API.

pub mod bot;
pub mod history;

pub use bot::{BotMessage, BotResponse, EditMessageParams, ResponseParameters, SendMessageParams};
pub use history::{DialogPage, HistoryPage, RawChat, RawDialog, RawMedia, RawMessage, RawUser};
