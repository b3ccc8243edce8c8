//! Simple health check example.
//!
//! Run with: cargo run --example health_check
//!
//! Set CHAT_GATEWAY_URL to point at a running gateway daemon, and optionally
//! DIGEST_TEST_PHONE to list the first dialogs of that session.
//!
//! Examples:
//!   cargo run --example health_check
//!   DIGEST_TEST_PHONE=+1234567890 cargo run --example health_check

use chat_gateway::{GatewayClient, GatewayConfig, GatewaySessionFactory};
use digest_core::SessionFactory;
use futures::StreamExt;
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    let config = GatewayConfig::from_env();
    println!("Connecting to {}...", config.base_url);

    let client = GatewayClient::connect(config).await?;
    println!("Connected!");

    let healthy = client.health_check().await?;
    println!("Health check: {}", if healthy { "OK" } else { "FAILED" });

    if let Ok(phone) = env::var("DIGEST_TEST_PHONE") {
        let factory = GatewaySessionFactory::from_client(client);
        let session = factory.open(&phone).await?;

        let mut dialogs = session.dialogs().take(10);
        while let Some(dialog) = dialogs.next().await {
            let dialog = dialog?;
            println!(
                "{}: {}",
                dialog.display_name().unwrap_or_else(|| "<unnamed>".to_string()),
                dialog.chat_id
            );
        }
        drop(dialogs);
        session.close().await?;
    }

    Ok(())
}
