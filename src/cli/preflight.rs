//! Pre-flight checks before expensive operations.
//!
//! Validates that required credentials are available before starting
//! operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{Result, TrendlensError};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Statistics only need the YouTube API key.
    Stats,
    /// Insights need both the YouTube and OpenAI keys.
    Insights,
    /// The server can answer both kinds of request.
    Serve,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    check_youtube_key(settings)?;
    match operation {
        Operation::Stats => {}
        Operation::Insights | Operation::Serve => check_openai_key()?,
    }
    Ok(())
}

/// Check if the YouTube API key is configured.
fn check_youtube_key(settings: &Settings) -> Result<()> {
    match settings.youtube.resolve_api_key() {
        Some(_) => Ok(()),
        None => Err(TrendlensError::Config(
            "YouTube API key not set. Add youtube.api_key to the config or export YOUTUBE_API_KEY"
                .to_string(),
        )),
    }
}

/// Check if OpenAI API key is configured.
fn check_openai_key() -> Result<()> {
    if crate::openai::is_api_key_configured() {
        Ok(())
    } else {
        Err(TrendlensError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        ))
    }
}
