//! Video platform abstraction for Trendlens.
//!
//! Provides a trait-based interface over the catalog service the pipeline
//! pulls videos, transcripts, and comments from.

mod models;
mod youtube;

pub use models::{
    CommentFetch, Transcript, TranscriptFetch, TranscriptSegment, VideoRecord,
};
pub use youtube::YoutubeClient;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// How the user's query should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Free-text topic search.
    #[default]
    Topic,
    /// A channel id, URL, handle, or name; returns that channel's videos.
    Channel,
    /// A single video URL or id.
    Video,
}

impl std::str::FromStr for SearchMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "topic" | "keyword" | "search" => Ok(SearchMode::Topic),
            "channel" => Ok(SearchMode::Channel),
            "video" => Ok(SearchMode::Video),
            _ => Err(format!("Unknown search mode: {}", s)),
        }
    }
}

impl std::fmt::Display for SearchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchMode::Topic => write!(f, "topic"),
            SearchMode::Channel => write!(f, "channel"),
            SearchMode::Video => write!(f, "video"),
        }
    }
}

/// Result ordering requested from the search endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum SearchOrder {
    #[default]
    ViewCount,
    Relevance,
    Date,
    Rating,
}

impl SearchOrder {
    /// Value of the `order` query parameter.
    pub fn as_param(&self) -> &'static str {
        match self {
            SearchOrder::ViewCount => "viewCount",
            SearchOrder::Relevance => "relevance",
            SearchOrder::Date => "date",
            SearchOrder::Rating => "rating",
        }
    }
}

impl std::str::FromStr for SearchOrder {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "viewcount" | "views" => Ok(SearchOrder::ViewCount),
            "relevance" => Ok(SearchOrder::Relevance),
            "date" => Ok(SearchOrder::Date),
            "rating" => Ok(SearchOrder::Rating),
            _ => Err(format!("Unknown search order: {}", s)),
        }
    }
}

/// Trait for video platform catalogs.
#[async_trait]
pub trait VideoPlatform: Send + Sync {
    /// Resolve a query into an ordered list of video ids.
    async fn search(
        &self,
        query: &str,
        mode: SearchMode,
        order: SearchOrder,
        max_results: u32,
    ) -> Result<Vec<String>>;

    /// Fetch full records for the given ids, in input order.
    async fn fetch_details(&self, ids: &[String]) -> Result<Vec<VideoRecord>>;

    /// Fetch the transcript of a video.
    ///
    /// A transcript the platform refuses to serve is `Unavailable`, not an error.
    async fn fetch_transcript(&self, id: &str) -> Result<TranscriptFetch>;

    /// Fetch up to `max_count` top-level comments of a video.
    async fn fetch_comments(&self, id: &str, max_count: u32) -> Result<CommentFetch>;
}
