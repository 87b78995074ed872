//! Request pipeline for Trendlens.
//!
//! Coordinates one request from query to statistics or insights:
//! search, detail lookup, and (for insights) transcript and comment fetches
//! followed by the question battery.

use crate::completion::{CompletionClient, OpenAiCompletion};
use crate::config::{Prompts, Settings};
use crate::error::{Result, TrendlensError};
use crate::insights::{InsightOrchestrator, InsightReport};
use crate::platform::{CommentFetch, SearchMode, TranscriptFetch, VideoPlatform, VideoRecord, YoutubeClient};
use crate::retry::RetryPolicy;
use crate::stats::{compute_statistics, Statistics};
use crate::summarize::BatchSummarizer;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Per-request timeout for Data API and caption calls.
const PLATFORM_TIMEOUT: Duration = Duration::from_secs(30);

/// What the caller wants analyzed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub mode: SearchMode,
    pub query: String,
    #[serde(default = "default_goal")]
    pub goal: String,
    /// Overrides `youtube.max_results`.
    #[serde(default)]
    pub max_results: Option<u32>,
}

fn default_goal() -> String {
    "views".to_string()
}

impl QueryRequest {
    pub fn new(mode: SearchMode, query: &str, goal: &str) -> Self {
        Self {
            mode,
            query: query.to_string(),
            goal: goal.to_string(),
            max_results: None,
        }
    }
}

/// Result of the statistics path.
#[derive(Debug, Clone, Serialize)]
pub struct StatisticsReport {
    pub request_id: String,
    pub query: String,
    pub mode: SearchMode,
    pub statistics: Statistics,
    pub videos: Vec<VideoRecord>,
}

/// Result of the insights path.
#[derive(Debug, Clone, Serialize)]
pub struct InsightsResult {
    pub request_id: String,
    pub query: String,
    pub goal: String,
    pub statistics: Statistics,
    pub insights: InsightReport,
}

/// The main entry point for statistics and insight requests.
pub struct Pipeline {
    settings: Settings,
    platform: Arc<dyn VideoPlatform>,
    orchestrator: InsightOrchestrator,
}

impl Pipeline {
    /// Create a pipeline backed by the YouTube Data API and OpenAI.
    pub fn new(settings: Settings) -> Result<Self> {
        let retry = RetryPolicy::from(settings.retry.clone());

        let platform: Arc<dyn VideoPlatform> =
            Arc::new(YoutubeClient::new(&settings.youtube, retry, PLATFORM_TIMEOUT)?);

        let completion: Arc<dyn CompletionClient> =
            Arc::new(OpenAiCompletion::with_config(&settings.insights)?);

        info!(
            "Using {} for insights ({} concurrent requests)",
            settings.insights.model, settings.insights.max_concurrent
        );

        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        Ok(Self::with_components(settings, platform, completion, prompts))
    }

    /// Create a pipeline with custom components.
    pub fn with_components(
        settings: Settings,
        platform: Arc<dyn VideoPlatform>,
        completion: Arc<dyn CompletionClient>,
        prompts: Prompts,
    ) -> Self {
        let summarizer = BatchSummarizer::new(
            completion,
            settings.insights.chunk_budget,
            settings.insights.max_concurrent,
        )
        .with_fold(settings.insights.fold, &settings.insights.separator)
        .with_retry(RetryPolicy::from(settings.retry.clone()))
        .with_prompts(prompts);

        let orchestrator = InsightOrchestrator::new(summarizer).with_deadline(settings.insights.timeout());

        Self {
            settings,
            platform,
            orchestrator,
        }
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Search and fetch details for the request's videos.
    async fn collect_videos(&self, request: &QueryRequest) -> Result<Vec<VideoRecord>> {
        let query = request.query.trim();
        if query.is_empty() {
            return Err(TrendlensError::InvalidInput("Query must not be empty".to_string()));
        }

        let max_results = request.max_results.unwrap_or(self.settings.youtube.max_results);
        let ids = self
            .platform
            .search(query, request.mode, self.settings.youtube.order, max_results)
            .await?;

        if ids.is_empty() {
            warn!("No videos found for '{}'", query);
            return Ok(Vec::new());
        }

        info!("Fetching details for {} video(s)", ids.len());
        self.platform.fetch_details(&ids).await
    }

    /// Fetch videos and compute statistics.
    #[instrument(skip(self, request), fields(query = %request.query, mode = %request.mode, request_id))]
    pub async fn statistics(&self, request: &QueryRequest) -> Result<StatisticsReport> {
        let request_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("request_id", request_id.as_str());

        let videos = self.collect_videos(request).await?;
        let statistics = compute_statistics(&videos, self.settings.stats.top_hashtags);

        info!("Computed statistics over {} video(s)", videos.len());

        Ok(StatisticsReport {
            request_id,
            query: request.query.clone(),
            mode: request.mode,
            statistics,
            videos,
        })
    }

    /// Fetch videos with their transcripts and comments, then answer the
    /// question battery. Each question is bounded by `insights.timeout_seconds`;
    /// a question that runs out of time is reported under `failures` and the
    /// answers that finished are kept.
    #[instrument(skip(self, request), fields(query = %request.query, mode = %request.mode, request_id))]
    pub async fn insights(&self, request: &QueryRequest) -> Result<InsightsResult> {
        let request_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("request_id", request_id.as_str());

        let videos = self.collect_videos(request).await?;
        let statistics = compute_statistics(&videos, self.settings.stats.top_hashtags);

        let (transcripts, comments) = self.fetch_material(&videos).await;

        let insights = self
            .orchestrator
            .derive_insights(&transcripts, &comments, &videos, &request.query, &request.goal)
            .await;

        info!(
            "Insights complete: {} answered, {} failed, {} skipped",
            insights.answers.len(),
            insights.failures.len(),
            insights.skipped.len()
        );

        Ok(InsightsResult {
            request_id,
            query: request.query.clone(),
            goal: request.goal.clone(),
            statistics,
            insights,
        })
    }

    /// Fetch transcripts and comments for every video. Fetch errors are
    /// recorded as unavailable material rather than failing the request.
    async fn fetch_material(
        &self,
        videos: &[VideoRecord],
    ) -> (HashMap<String, TranscriptFetch>, HashMap<String, CommentFetch>) {
        let max_comments = self.settings.youtube.max_comments;
        let ids: Vec<String> = videos.iter().map(|v| v.id.clone()).collect();

        let fetched: Vec<(String, TranscriptFetch, CommentFetch)> = stream::iter(ids)
            .map(|id| {
                let platform = Arc::clone(&self.platform);
                async move {
                    let transcript = match platform.fetch_transcript(&id).await {
                        Ok(fetch) => fetch,
                        Err(e) => {
                            warn!("Transcript fetch failed for {}: {}", id, e);
                            TranscriptFetch::Unavailable { reason: e.to_string() }
                        }
                    };
                    let comments = match platform.fetch_comments(&id, max_comments).await {
                        Ok(fetch) => fetch,
                        Err(e) => {
                            warn!("Comment fetch failed for {}: {}", id, e);
                            CommentFetch::Unavailable { reason: e.to_string() }
                        }
                    };
                    (id, transcript, comments)
                }
            })
            .buffer_unordered(self.settings.youtube.max_concurrent.max(1))
            .collect()
            .await;

        let mut transcripts = HashMap::with_capacity(fetched.len());
        let mut comments = HashMap::with_capacity(fetched.len());
        for (id, transcript, comment) in fetched {
            transcripts.insert(id.clone(), transcript);
            comments.insert(id, comment);
        }
        (transcripts, comments)
    }
}
