//! Data models for fetched platform content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A video as reported by the platform.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VideoRecord {
    /// Video ID.
    pub id: String,
    pub title: String,
    pub description: String,
    pub channel_id: String,
    pub channel_title: String,
    /// Counts are `None` when the platform hides them.
    pub view_count: Option<u64>,
    pub like_count: Option<u64>,
    pub comment_count: Option<u64>,
    /// Subscriber count of the owning channel (if public).
    pub channel_subscribers: Option<u64>,
    pub published_at: Option<DateTime<Utc>>,
    /// Raw compact duration (e.g. "PT12M3S").
    pub duration: String,
    /// Parsed duration, 0 when the raw value was malformed.
    pub duration_seconds: u64,
    pub category_id: String,
    /// Hashtags and tags, lowercase, deduplicated, first-seen order.
    pub hashtags: Vec<String>,
}

impl VideoRecord {
    /// Watch URL for this video.
    pub fn url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.id)
    }
}

/// A single timed transcript line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptSegment {
    pub text: String,
    pub start_seconds: f64,
    pub duration_seconds: f64,
}

impl TranscriptSegment {
    pub fn new(start_seconds: f64, duration_seconds: f64, text: String) -> Self {
        Self {
            text,
            start_seconds,
            duration_seconds,
        }
    }
}

/// A video transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub video_id: String,
    pub segments: Vec<TranscriptSegment>,
}

impl Transcript {
    pub fn new(video_id: String, segments: Vec<TranscriptSegment>) -> Self {
        Self { video_id, segments }
    }

    /// Full text with segments joined by spaces.
    pub fn full_text(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// End of the last segment in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.segments
            .iter()
            .map(|s| s.start_seconds + s.duration_seconds)
            .fold(0.0f64, f64::max)
    }
}

/// Outcome of a transcript fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TranscriptFetch {
    Available(Transcript),
    Unavailable { reason: String },
}

impl TranscriptFetch {
    pub fn transcript(&self) -> Option<&Transcript> {
        match self {
            TranscriptFetch::Available(t) => Some(t),
            TranscriptFetch::Unavailable { .. } => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, TranscriptFetch::Available(_))
    }
}

/// Outcome of a comment fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", content = "comments", rename_all = "lowercase")]
pub enum CommentFetch {
    Available(Vec<String>),
    Unavailable { reason: String },
}

impl CommentFetch {
    pub fn comments(&self) -> &[String] {
        match self {
            CommentFetch::Available(c) => c,
            CommentFetch::Unavailable { .. } => &[],
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, CommentFetch::Available(_))
    }
}
