//! Trendlens - YouTube niche statistics and audience insights
//!
//! Collects the top videos for a topic, a channel, or a single video,
//! computes descriptive statistics over them, and asks an LLM a fixed battery
//! of questions about their transcripts and comments.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration and prompt templates
//! - `platform` - Video platform abstraction (YouTube Data API)
//! - `duration` - Compact duration parsing
//! - `stats` - Descriptive statistics
//! - `chunking` - Character-budget text chunking
//! - `completion` - Chat completion clients
//! - `summarize` - Batch summarization of long text
//! - `insights` - Question battery over transcripts and comments
//! - `retry` - Exponential backoff for upstream calls
//! - `pipeline` - Request coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use trendlens::config::Settings;
//! use trendlens::pipeline::{Pipeline, QueryRequest};
//! use trendlens::platform::SearchMode;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let pipeline = Pipeline::new(settings)?;
//!
//!     let request = QueryRequest::new(SearchMode::Topic, "sourdough", "views");
//!     let report = pipeline.statistics(&request).await?;
//!     println!("{}", report.statistics.record()["average_views"]);
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod completion;
pub mod config;
pub mod duration;
pub mod error;
pub mod insights;
pub mod openai;
pub mod pipeline;
pub mod platform;
pub mod retry;
pub mod stats;
pub mod summarize;

pub use error::{Result, TrendlensError};
