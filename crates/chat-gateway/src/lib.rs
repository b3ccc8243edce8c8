//! Messaging gateway client library.
//!
//! This crate provides Rust clients for the two external services the digest
//! pipeline talks to on the messaging side:
//!
//! - A user-session gateway daemon, spoken to over JSON-RPC, which holds
//!   logged-in user sessions and exposes their dialogs and chat history
//! - The bot HTTP API, used to send and edit messages to users
//!
//! # Example
//!
//! ```no_run
//! use chat_gateway::{GatewayConfig, GatewaySessionFactory};
//! use digest_core::SessionFactory;
//! use futures::StreamExt;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let factory = GatewaySessionFactory::connect(GatewayConfig::default()).await?;
//! let session = factory.open("+15551234567").await?;
//!
//! let mut dialogs = session.dialogs();
//! while let Some(dialog) = dialogs.next().await {
//!     println!("{:?}", dialog?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod bot;
pub mod client;
pub mod config;
pub mod error;
pub mod session;
pub mod types;

pub use bot::BotNotifier;
pub use client::GatewayClient;
pub use config::{BotConfig, GatewayConfig};
pub use error::GatewayError;
pub use session::{GatewaySession, GatewaySessionFactory};
pub use types::*;

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
