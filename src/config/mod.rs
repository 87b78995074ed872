//! Configuration module for Trendlens.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{InsightPrompts, Prompts};
pub use settings::{
    GeneralSettings, InsightSettings, PromptSettings, RetrySettings, ServerSettings, Settings,
    StatsSettings, YoutubeSettings,
};
