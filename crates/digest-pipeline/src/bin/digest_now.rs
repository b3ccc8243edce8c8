//! Summarize a registered user's chats once and exit.
//!
//! Usage: digest-now <user_id> <hours>
//!
//! Configuration via .env file or environment variables:
//!   DIGEST_MODEL      - Summarization model (required)
//!   OPENAI_API_KEY    - Summarization API key (required)
//!   BOT_TOKEN         - Bot token used to report results (required)
//!   CHAT_GATEWAY_URL  - Messaging gateway (default: http://127.0.0.1:8090)
//!   DIGEST_STORE_FILE - Schedule store (default: users_config.json)
//!
//! Ctrl+C cancels every job still running.

use std::env;
use std::sync::Arc;

use chat_gateway::{BotNotifier, GatewayConfig, GatewaySessionFactory};
use digest_pipeline::{DigestConfig, DigestService, JobOutcome};
use openai_summarizer::OpenAiBackend;
use schedule_store::ScheduleStore;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = env::args().skip(1);
    let (Some(user_id), Some(hours)) = (args.next(), args.next()) else {
        eprintln!("Usage: digest-now <user_id> <hours>");
        std::process::exit(2);
    };
    let user_id: i64 = user_id.parse()?;

    let config = DigestConfig::from_env()?;
    let store = Arc::new(ScheduleStore::open(&config.store_file).await?);
    let sessions = Arc::new(GatewaySessionFactory::connect(GatewayConfig::from_env()).await?);
    let backend = Arc::new(OpenAiBackend::from_env()?);
    let notifier = Arc::new(BotNotifier::from_env()?);

    let service = DigestService::new(config, store, sessions, backend, notifier);

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Ctrl+C received, cancelling batch");
            shutdown.cancel();
        }
    });

    let report = service.summarize_now(user_id, &hours, cancel).await?;
    for job in &report.jobs {
        match &job.outcome {
            JobOutcome::Summary(_) => info!(chat_id = job.chat_id, "Summary delivered"),
            JobOutcome::NoMessages => info!(chat_id = job.chat_id, "No messages in window"),
            JobOutcome::Failed(e) => warn!(
                chat_id = job.chat_id,
                attempts = job.attempts,
                "Summary failed: {}",
                e
            ),
        }
    }

    Ok(())
}
