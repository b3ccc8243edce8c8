//! Pipeline configuration.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::PipelineError;

/// Default instruction sent ahead of every transcript.
pub const DEFAULT_PHRASE: &str =
    "Provide a concise summary of those messages in a language of original";

/// Default schedule store file.
pub const DEFAULT_STORE_FILE: &str = "users_config.json";

/// Default size of the global job permit pool.
pub const DEFAULT_MAX_CONCURRENT_JOBS: usize = 5;

/// Default wait before the summarizer retries.
pub const DEFAULT_SUMMARY_COOLDOWN: Duration = Duration::from_secs(60);

/// Default number of dialogs shown by the chat listing.
pub const DEFAULT_DIALOG_LIMIT: usize = 40;

/// Default pause between accepted dialogs.
pub const DEFAULT_DIALOG_PACING: Duration = Duration::from_secs(1);

/// Configuration for the digest pipeline.
#[derive(Debug, Clone)]
pub struct DigestConfig {
    /// Summarization model identifier.
    pub model: String,

    /// Instruction phrase placed before the transcript.
    pub phrase: String,

    /// Path of the schedule store file.
    pub store_file: PathBuf,

    /// Jobs allowed to run at once, across all batches.
    pub max_concurrent_jobs: usize,

    /// Wait before the summarizer's single retry.
    pub summary_cooldown: Duration,

    /// Maximum dialogs returned by a chat listing.
    pub dialog_limit: usize,

    /// Pause after each accepted dialog.
    pub dialog_pacing: Duration,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            model: String::new(),
            phrase: DEFAULT_PHRASE.to_string(),
            store_file: PathBuf::from(DEFAULT_STORE_FILE),
            max_concurrent_jobs: DEFAULT_MAX_CONCURRENT_JOBS,
            summary_cooldown: DEFAULT_SUMMARY_COOLDOWN,
            dialog_limit: DEFAULT_DIALOG_LIMIT,
            dialog_pacing: DEFAULT_DIALOG_PACING,
        }
    }
}

impl DigestConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `DIGEST_MODEL` | Summarization model | (required) |
    /// | `DIGEST_PHRASE` | Instruction phrase | see [`DEFAULT_PHRASE`] |
    /// | `DIGEST_STORE_FILE` | Schedule store path | `users_config.json` |
    /// | `DIGEST_MAX_CONCURRENT_JOBS` | Global permit pool size | `5` |
    /// | `DIGEST_SUMMARY_COOLDOWN_SECS` | Summarizer retry wait | `60` |
    /// | `DIGEST_DIALOG_LIMIT` | Dialogs per listing | `40` |
    /// | `DIGEST_DIALOG_PACING_MS` | Pause between dialogs | `1000` |
    pub fn from_env() -> Result<Self, PipelineError> {
        let model = env::var("DIGEST_MODEL")
            .map_err(|_| PipelineError::Configuration("DIGEST_MODEL not set".to_string()))?;

        let phrase = env::var("DIGEST_PHRASE").unwrap_or_else(|_| DEFAULT_PHRASE.to_string());

        let store_file = env::var("DIGEST_STORE_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_STORE_FILE));

        let max_concurrent_jobs = parse_var("DIGEST_MAX_CONCURRENT_JOBS")?
            .unwrap_or(DEFAULT_MAX_CONCURRENT_JOBS);
        check_jobs(max_concurrent_jobs)?;

        let summary_cooldown = parse_var("DIGEST_SUMMARY_COOLDOWN_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_SUMMARY_COOLDOWN);

        let dialog_limit = parse_var("DIGEST_DIALOG_LIMIT")?.unwrap_or(DEFAULT_DIALOG_LIMIT);

        let dialog_pacing = parse_var("DIGEST_DIALOG_PACING_MS")?
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_DIALOG_PACING);

        Ok(Self {
            model,
            phrase,
            store_file,
            max_concurrent_jobs,
            summary_cooldown,
            dialog_limit,
            dialog_pacing,
        })
    }

    /// Create a new config builder.
    pub fn builder() -> DigestConfigBuilder {
        DigestConfigBuilder::default()
    }
}

/// An empty permit pool would park every batch forever.
fn check_jobs(jobs: usize) -> Result<(), PipelineError> {
    if jobs == 0 {
        return Err(PipelineError::Configuration(
            "DIGEST_MAX_CONCURRENT_JOBS must be at least 1".to_string(),
        ));
    }
    Ok(())
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>, PipelineError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| PipelineError::Configuration(format!("{} has invalid value {:?}", name, raw))),
        Err(_) => Ok(None),
    }
}

/// Builder for DigestConfig.
#[derive(Debug, Default)]
pub struct DigestConfigBuilder {
    config: DigestConfig,
}

impl DigestConfigBuilder {
    /// Set the model.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the instruction phrase.
    pub fn phrase(mut self, phrase: impl Into<String>) -> Self {
        self.config.phrase = phrase.into();
        self
    }

    /// Set the store file.
    pub fn store_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.store_file = path.into();
        self
    }

    /// Set the permit pool size.
    pub fn max_concurrent_jobs(mut self, jobs: usize) -> Self {
        self.config.max_concurrent_jobs = jobs;
        self
    }

    /// Set the summarizer cooldown.
    pub fn summary_cooldown(mut self, cooldown: Duration) -> Self {
        self.config.summary_cooldown = cooldown;
        self
    }

    /// Set the dialog limit.
    pub fn dialog_limit(mut self, limit: usize) -> Self {
        self.config.dialog_limit = limit;
        self
    }

    /// Set the dialog pacing.
    pub fn dialog_pacing(mut self, pacing: Duration) -> Self {
        self.config.dialog_pacing = pacing;
        self
    }

    /// Build the configuration.
    ///
    /// Fails when the permit pool is empty.
    pub fn build(self) -> Result<DigestConfig, PipelineError> {
        check_jobs(self.config.max_concurrent_jobs)?;
        Ok(self.config)
    }
}
