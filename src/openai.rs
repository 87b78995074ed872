//! OpenAI client construction.

use crate::error::Result;
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Create an OpenAI client whose requests give up after `timeout`.
///
/// The API key is read from `OPENAI_API_KEY`. `api_base` points the client at
/// an OpenAI-compatible endpoint.
pub fn create_client_with_timeout(timeout: Duration, api_base: Option<&str>) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder().timeout(timeout).build()?;

    let mut config = OpenAIConfig::default();
    if let Some(base) = api_base {
        config = config.with_api_base(base.trim_end_matches('/'));
    }

    Ok(Client::with_config(config).with_http_client(http_client))
}

/// Check whether `OPENAI_API_KEY` is set and non-empty.
pub fn is_api_key_configured() -> bool {
    std::env::var("OPENAI_API_KEY").is_ok_and(|k| !k.is_empty())
}
