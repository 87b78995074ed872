//! CLI module for Trendlens.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use crate::platform::SearchMode;
use clap::{Args, Parser, Subcommand};

/// Trendlens - YouTube niche statistics and audience insights
///
/// Collects the top videos for a topic, channel, or single video, computes
/// engagement statistics, and asks an LLM what the transcripts and comments say.
#[derive(Parser, Debug)]
#[command(name = "trendlens")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Query arguments shared by `stats` and `insights`.
#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    /// Topic, channel (id, URL, @handle, or name), or video URL/ID
    pub query: String,

    /// How to interpret the query (topic, channel, video)
    #[arg(short, long, default_value = "topic")]
    pub mode: SearchMode,

    /// What to optimize for (e.g. views, watch time, subscribers)
    #[arg(short, long, default_value = "views")]
    pub goal: String,

    /// Number of videos to analyze (defaults to youtube.max_results)
    #[arg(short = 'n', long)]
    pub max_results: Option<u32>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute engagement statistics for the top videos
    Stats(QueryArgs),

    /// Ask the question battery over transcripts and comments
    Insights(QueryArgs),

    /// Start HTTP API server for integration with other systems
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
