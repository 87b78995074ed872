//! YouTube platform implementation.
//!
//! Search, video details, channel statistics, and comments come from the
//! YouTube Data API v3. Transcripts come from the public timed-text endpoint.

use super::{
    CommentFetch, SearchMode, SearchOrder, Transcript, TranscriptFetch, TranscriptSegment,
    VideoPlatform, VideoRecord,
};
use crate::config::YoutubeSettings;
use crate::duration::parse_duration;
use crate::error::{Result, TrendlensError};
use crate::retry::{with_backoff, RetryPolicy};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Page size limit of the Data API list endpoints.
const MAX_PAGE_SIZE: u32 = 50;
/// Page size limit of the commentThreads endpoint.
const MAX_COMMENT_PAGE_SIZE: u32 = 100;

static HASHTAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#([\p{L}\p{N}_]+)").expect("Invalid regex"));

/// YouTube Data API client.
pub struct YoutubeClient {
    http: reqwest::Client,
    api_key: String,
    api_base_url: String,
    transcript_base_url: String,
    transcript_language: String,
    retry: RetryPolicy,
    video_id_regex: Regex,
    channel_id_regex: Regex,
    handle_regex: Regex,
}

impl YoutubeClient {
    /// Create a client from settings. Fails when no API key is configured.
    pub fn new(settings: &YoutubeSettings, retry: RetryPolicy, timeout: Duration) -> Result<Self> {
        let api_key = settings.resolve_api_key().ok_or_else(|| {
            TrendlensError::Config(
                "YouTube API key not set. Set youtube.api_key or YOUTUBE_API_KEY".to_string(),
            )
        })?;

        let http = reqwest::Client::builder().timeout(timeout).build()?;

        // Matches various YouTube URL formats and bare video IDs
        let video_id_regex = Regex::new(
            r"(?x)
            (?:
                (?:https?://)?
                (?:www\.|m\.)?
                (?:youtube\.com/watch\?(?:.*&)?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/shorts/|youtube\.com/v/)
                ([a-zA-Z0-9_-]{11})
            )
            |
            ^([a-zA-Z0-9_-]{11})$
        ",
        )
        .expect("Invalid regex");

        let channel_id_regex = Regex::new(r"(?:youtube\.com/channel/|^)(UC[a-zA-Z0-9_-]{22})(?:[/?]|$)")
            .expect("Invalid regex");

        let handle_regex =
            Regex::new(r"(?:youtube\.com/|^)(@[a-zA-Z0-9._-]+)").expect("Invalid regex");

        Ok(Self {
            http,
            api_key,
            api_base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            transcript_base_url: settings.transcript_base_url.clone(),
            transcript_language: settings.transcript_language.clone(),
            retry,
            video_id_regex,
            channel_id_regex,
            handle_regex,
        })
    }

    /// Extract video ID from a YouTube URL or bare ID.
    pub fn extract_video_id(&self, input: &str) -> Option<String> {
        let caps = self.video_id_regex.captures(input.trim())?;

        caps.get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().to_string())
    }

    /// Extract a channel ID (`UC...`) from a channel URL or bare ID.
    fn extract_channel_id(&self, input: &str) -> Option<String> {
        self.channel_id_regex
            .captures(input.trim())
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// Extract an `@handle` from a channel URL or bare handle.
    fn extract_handle(&self, input: &str) -> Option<String> {
        self.handle_regex
            .captures(input.trim())
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// Issue a Data API GET, retrying outages. 4xx replies other than 429
    /// come back as `ApiReply::Rejected` so callers can decide what they mean.
    async fn call<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<ApiReply<T>> {
        let mut query: Vec<(&str, String)> = params.to_vec();
        query.push(("key", self.api_key.clone()));

        let url = url::Url::parse_with_params(&format!("{}/{}", self.api_base_url, endpoint), &query)
            .map_err(|e| TrendlensError::InvalidInput(format!("Bad API URL: {}", e)))?;

        let label = format!("YouTube {}", endpoint);
        with_backoff(&self.retry, &label, || {
            let url = url.clone();
            async move {
                let response = self.http.get(url).send().await?;
                let status = response.status();

                if status.is_success() {
                    return Ok(ApiReply::Ok(response.json::<T>().await?));
                }

                let body = response.text().await.unwrap_or_default();
                let reason = error_reason(&body);

                if status.is_server_error() || status.as_u16() == 429 {
                    Err(TrendlensError::Platform(format!(
                        "{} returned {}: {}",
                        endpoint, status, reason
                    )))
                } else {
                    Ok(ApiReply::Rejected {
                        status: status.as_u16(),
                        reason,
                    })
                }
            }
        })
        .await
    }

    /// Like `call`, but a rejection is an error.
    async fn get<T: DeserializeOwned>(&self, endpoint: &str, params: &[(&str, String)]) -> Result<T> {
        match self.call(endpoint, params).await? {
            ApiReply::Ok(value) => Ok(value),
            ApiReply::Rejected { status, reason } => Err(TrendlensError::PlatformRejected(format!(
                "{} returned {}: {}",
                endpoint, status, reason
            ))),
        }
    }

    /// Page through `search` until `max_results` video ids are collected.
    async fn search_videos(
        &self,
        filter: (&str, String),
        order: SearchOrder,
        max_results: u32,
    ) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        let mut page_token: Option<String> = None;

        while (ids.len() as u32) < max_results {
            let remaining = max_results - ids.len() as u32;
            let mut params = vec![
                ("part", "id".to_string()),
                ("type", "video".to_string()),
                ("order", order.as_param().to_string()),
                ("maxResults", remaining.min(MAX_PAGE_SIZE).to_string()),
                filter.clone(),
            ];
            if let Some(token) = &page_token {
                params.push(("pageToken", token.clone()));
            }

            let page: ListResponse<SearchItem> = self.get("search", &params).await?;
            ids.extend(page.items.into_iter().filter_map(|item| item.id.video_id));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        ids.truncate(max_results as usize);
        Ok(ids)
    }

    /// Turn a channel id, URL, handle, or name into a channel id.
    async fn resolve_channel_id(&self, query: &str) -> Result<String> {
        if let Some(id) = self.extract_channel_id(query) {
            return Ok(id);
        }

        let not_found = || TrendlensError::InvalidInput(format!("Channel not found: {}", query));

        if let Some(handle) = self.extract_handle(query) {
            debug!("Resolving channel handle {}", handle);
            let page: ListResponse<ChannelItem> = self
                .get("channels", &[("part", "id".to_string()), ("forHandle", handle)])
                .await?;
            return page.items.into_iter().next().map(|c| c.id).ok_or_else(not_found);
        }

        debug!("Searching for channel named {}", query);
        let page: ListResponse<SearchItem> = self
            .get(
                "search",
                &[
                    ("part", "id".to_string()),
                    ("type", "channel".to_string()),
                    ("maxResults", "1".to_string()),
                    ("q", query.to_string()),
                ],
            )
            .await?;
        page.items
            .into_iter()
            .find_map(|item| item.id.channel_id)
            .ok_or_else(not_found)
    }

    /// Subscriber counts for the given channels; hidden counts are omitted.
    async fn fetch_subscribers(&self, channel_ids: &[String]) -> Result<HashMap<String, u64>> {
        let mut subscribers = HashMap::new();

        for batch in channel_ids.chunks(MAX_PAGE_SIZE as usize) {
            let page: ListResponse<ChannelItem> = self
                .get(
                    "channels",
                    &[("part", "statistics".to_string()), ("id", batch.join(","))],
                )
                .await?;

            for channel in page.items {
                if channel.statistics.hidden_subscriber_count {
                    continue;
                }
                if let Some(count) = parse_count(channel.statistics.subscriber_count.as_deref()) {
                    subscribers.insert(channel.id, count);
                }
            }
        }

        Ok(subscribers)
    }
}

#[async_trait]
impl VideoPlatform for YoutubeClient {
    #[instrument(skip(self), fields(query = %query, mode = %mode))]
    async fn search(
        &self,
        query: &str,
        mode: SearchMode,
        order: SearchOrder,
        max_results: u32,
    ) -> Result<Vec<String>> {
        if query.trim().is_empty() {
            return Err(TrendlensError::InvalidInput("Query is empty".to_string()));
        }

        let ids = match mode {
            SearchMode::Topic => {
                self.search_videos(("q", query.trim().to_string()), order, max_results)
                    .await?
            }
            SearchMode::Channel => {
                let channel_id = self.resolve_channel_id(query).await?;
                info!("Resolved channel {} to {}", query, channel_id);
                self.search_videos(("channelId", channel_id), order, max_results)
                    .await?
            }
            SearchMode::Video => {
                let mut seen = HashSet::new();
                let ids: Vec<String> = query
                    .split(|c: char| c.is_whitespace() || c == ',')
                    .filter_map(|part| self.extract_video_id(part))
                    .filter(|id| seen.insert(id.clone()))
                    .take(max_results.max(1) as usize)
                    .collect();
                if ids.is_empty() {
                    return Err(TrendlensError::InvalidInput(format!(
                        "Invalid YouTube video ID or URL: {}",
                        query
                    )));
                }
                ids
            }
        };

        info!("Search returned {} videos", ids.len());
        Ok(ids)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn fetch_details(&self, ids: &[String]) -> Result<Vec<VideoRecord>> {
        let mut by_id: HashMap<String, VideoRecord> = HashMap::new();

        for batch in ids.chunks(MAX_PAGE_SIZE as usize) {
            let page: ListResponse<VideoItem> = self
                .get(
                    "videos",
                    &[
                        ("part", "snippet,statistics,contentDetails".to_string()),
                        ("id", batch.join(",")),
                    ],
                )
                .await?;

            for item in page.items {
                let record = item.into_record();
                by_id.insert(record.id.clone(), record);
            }
        }

        let mut channel_ids: Vec<String> = Vec::new();
        for record in by_id.values() {
            if !record.channel_id.is_empty() && !channel_ids.contains(&record.channel_id) {
                channel_ids.push(record.channel_id.clone());
            }
        }
        let subscribers = self.fetch_subscribers(&channel_ids).await?;

        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            match by_id.remove(id) {
                Some(mut record) => {
                    record.channel_subscribers = subscribers.get(&record.channel_id).copied();
                    records.push(record);
                }
                None => warn!("Video {} not returned by the platform, skipping", id),
            }
        }

        debug!("Fetched details for {} videos", records.len());
        Ok(records)
    }

    #[instrument(skip(self))]
    async fn fetch_transcript(&self, id: &str) -> Result<TranscriptFetch> {
        let url = url::Url::parse_with_params(
            &self.transcript_base_url,
            &[
                ("v", id),
                ("lang", self.transcript_language.as_str()),
                ("fmt", "json3"),
            ],
        )
        .map_err(|e| TrendlensError::InvalidInput(format!("Bad transcript URL: {}", e)))?;

        let body = with_backoff(&self.retry, "YouTube transcript", || {
            let url = url.clone();
            async move {
                let response = self.http.get(url).send().await?;
                let status = response.status();
                if status.is_server_error() || status.as_u16() == 429 {
                    return Err(TrendlensError::Platform(format!(
                        "transcript endpoint returned {}",
                        status
                    )));
                }
                if !status.is_success() {
                    return Ok(None);
                }
                Ok(Some(response.text().await?))
            }
        })
        .await?;

        let Some(body) = body.filter(|b| !b.trim().is_empty()) else {
            debug!("No captions served for {}", id);
            return Ok(TranscriptFetch::Unavailable {
                reason: "no captions available".to_string(),
            });
        };

        let captions: TimedText = match serde_json::from_str(&body) {
            Ok(captions) => captions,
            Err(e) => {
                warn!("Unreadable captions for {}: {}", id, e);
                return Ok(TranscriptFetch::Unavailable {
                    reason: format!("unreadable captions: {}", e),
                });
            }
        };

        let segments = captions.into_segments();
        if segments.is_empty() {
            return Ok(TranscriptFetch::Unavailable {
                reason: "captions contain no text".to_string(),
            });
        }

        Ok(TranscriptFetch::Available(Transcript::new(id.to_string(), segments)))
    }

    #[instrument(skip(self))]
    async fn fetch_comments(&self, id: &str, max_count: u32) -> Result<CommentFetch> {
        let mut comments = Vec::new();
        let mut page_token: Option<String> = None;

        while (comments.len() as u32) < max_count {
            let remaining = max_count - comments.len() as u32;
            let mut params = vec![
                ("part", "snippet".to_string()),
                ("videoId", id.to_string()),
                ("textFormat", "plainText".to_string()),
                ("order", "relevance".to_string()),
                ("maxResults", remaining.min(MAX_COMMENT_PAGE_SIZE).to_string()),
            ];
            if let Some(token) = &page_token {
                params.push(("pageToken", token.clone()));
            }

            let page: ListResponse<CommentThreadItem> = match self.call("commentThreads", &params).await? {
                ApiReply::Ok(page) => page,
                ApiReply::Rejected { status, reason } if status == 403 || status == 404 => {
                    debug!("Comments unavailable for {}: {}", id, reason);
                    return Ok(CommentFetch::Unavailable { reason });
                }
                ApiReply::Rejected { status, reason } => {
                    return Err(TrendlensError::PlatformRejected(format!(
                        "commentThreads returned {}: {}",
                        status, reason
                    )));
                }
            };

            comments.extend(page.items.into_iter().map(|item| {
                let snippet = item.snippet.top_level_comment.snippet;
                snippet.text_original.unwrap_or(snippet.text_display)
            }));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        comments.truncate(max_count as usize);
        Ok(CommentFetch::Available(comments))
    }
}

/// Merge `#hashtags` from title and description with the uploader's tags.
///
/// Lowercased, deduplicated, first-seen order.
pub fn collect_hashtags(title: &str, description: &str, tags: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut hashtags = Vec::new();

    let from_text = HASHTAG_REGEX
        .captures_iter(title)
        .chain(HASHTAG_REGEX.captures_iter(description))
        .map(|c| c[1].to_string());

    for tag in from_text.chain(tags.iter().cloned()) {
        let tag = tag.trim().trim_start_matches('#').to_lowercase();
        if !tag.is_empty() && seen.insert(tag.clone()) {
            hashtags.push(tag);
        }
    }

    hashtags
}

fn parse_count(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|s| s.parse().ok())
}

/// Pull the `reason` (or message) out of a Data API error body.
fn error_reason(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed
            .error
            .errors
            .into_iter()
            .next()
            .map(|e| e.reason)
            .filter(|r| !r.is_empty())
            .unwrap_or(parsed.error.message),
        Err(_) => body.chars().take(200).collect(),
    }
}

enum ApiReply<T> {
    Ok(T),
    Rejected { status: u16, reason: String },
}

// === Wire types ===

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchId {
    video_id: Option<String>,
    channel_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: String,
    #[serde(default)]
    snippet: VideoSnippet,
    #[serde(default)]
    statistics: VideoStatistics,
    #[serde(default)]
    content_details: ContentDetails,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct VideoSnippet {
    published_at: Option<String>,
    channel_id: String,
    title: String,
    description: String,
    channel_title: String,
    tags: Vec<String>,
    category_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct VideoStatistics {
    view_count: Option<String>,
    like_count: Option<String>,
    comment_count: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ContentDetails {
    duration: String,
}

impl VideoItem {
    fn into_record(self) -> VideoRecord {
        let snippet = self.snippet;
        let published_at = snippet
            .published_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|d| d.with_timezone(&Utc));
        let hashtags = collect_hashtags(&snippet.title, &snippet.description, &snippet.tags);

        VideoRecord {
            id: self.id,
            title: snippet.title,
            description: snippet.description,
            channel_id: snippet.channel_id,
            channel_title: snippet.channel_title,
            view_count: parse_count(self.statistics.view_count.as_deref()),
            like_count: parse_count(self.statistics.like_count.as_deref()),
            comment_count: parse_count(self.statistics.comment_count.as_deref()),
            channel_subscribers: None,
            published_at,
            duration_seconds: parse_duration(&self.content_details.duration),
            duration: self.content_details.duration,
            category_id: snippet.category_id,
            hashtags,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChannelItem {
    id: String,
    #[serde(default)]
    statistics: ChannelStatistics,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ChannelStatistics {
    subscriber_count: Option<String>,
    hidden_subscriber_count: bool,
}

#[derive(Debug, Deserialize)]
struct CommentThreadItem {
    snippet: CommentThreadSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentThreadSnippet {
    top_level_comment: TopLevelComment,
}

#[derive(Debug, Deserialize)]
struct TopLevelComment {
    snippet: CommentSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentSnippet {
    #[serde(default)]
    text_display: String,
    text_original: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ErrorReason>,
}

#[derive(Debug, Deserialize)]
struct ErrorReason {
    #[serde(default)]
    reason: String,
}

/// Timed-text `json3` payload.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TimedText {
    events: Vec<TimedTextEvent>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct TimedTextEvent {
    t_start_ms: u64,
    d_duration_ms: u64,
    segs: Vec<TimedTextSeg>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TimedTextSeg {
    utf8: String,
}

impl TimedText {
    fn into_segments(self) -> Vec<TranscriptSegment> {
        self.events
            .into_iter()
            .filter_map(|event| {
                let text: String = event.segs.iter().map(|s| s.utf8.as_str()).collect();
                let text = text.replace('\n', " ").trim().to_string();
                if text.is_empty() {
                    return None;
                }
                Some(TranscriptSegment::new(
                    event.t_start_ms as f64 / 1000.0,
                    event.d_duration_ms as f64 / 1000.0,
                    text,
                ))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings_for(server_uri: &str) -> YoutubeSettings {
        YoutubeSettings {
            api_key: Some("test-key".to_string()),
            api_base_url: server_uri.to_string(),
            transcript_base_url: format!("{}/timedtext", server_uri),
            ..YoutubeSettings::default()
        }
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        }
    }

    fn client_for(server: &MockServer) -> YoutubeClient {
        YoutubeClient::new(&settings_for(&server.uri()), fast_retry(), Duration::from_secs(5)).unwrap()
    }

    fn offline_client() -> YoutubeClient {
        client_for_uri("http://127.0.0.1:9")
    }

    fn client_for_uri(uri: &str) -> YoutubeClient {
        YoutubeClient::new(&settings_for(uri), RetryPolicy::none(), Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_extract_video_id() {
        let client = offline_client();

        assert_eq!(
            client.extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            client.extract_video_id("https://youtu.be/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            client.extract_video_id("https://www.youtube.com/shorts/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            client.extract_video_id("https://www.youtube.com/watch?list=PL1&v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(client.extract_video_id("dQw4w9WgXcQ"), Some("dQw4w9WgXcQ".to_string()));

        assert_eq!(client.extract_video_id("not-a-video-id"), None);
        assert_eq!(client.extract_video_id(""), None);
    }

    #[test]
    fn test_extract_channel_refs() {
        let client = offline_client();
        let id = "UC_x5XG1OV2P6uZZ5FSM9Ttw";

        assert_eq!(client.extract_channel_id(id), Some(id.to_string()));
        assert_eq!(
            client.extract_channel_id(&format!("https://www.youtube.com/channel/{}/videos", id)),
            Some(id.to_string())
        );
        assert_eq!(client.extract_channel_id("@GoogleDevelopers"), None);

        assert_eq!(
            client.extract_handle("https://www.youtube.com/@GoogleDevelopers"),
            Some("@GoogleDevelopers".to_string())
        );
        assert_eq!(client.extract_handle("@veritasium"), Some("@veritasium".to_string()));
        assert_eq!(client.extract_handle("cooking channel"), None);
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let settings = YoutubeSettings {
            api_key: Some(String::new()),
            ..YoutubeSettings::default()
        };
        if std::env::var("YOUTUBE_API_KEY").is_err() {
            let result = YoutubeClient::new(&settings, RetryPolicy::none(), Duration::from_secs(1));
            assert!(matches!(result, Err(TrendlensError::Config(_))));
        }
    }

    #[test]
    fn test_collect_hashtags() {
        let tags = vec!["Sourdough".to_string(), "baking".to_string()];
        let hashtags = collect_hashtags(
            "Open crumb #sourdough",
            "Recipe below #Bread #baking\n#sourdough",
            &tags,
        );
        assert_eq!(hashtags, vec!["sourdough", "bread", "baking"]);
    }

    #[test]
    fn test_error_reason() {
        let body = r#"{"error":{"code":403,"message":"Comments disabled","errors":[{"reason":"commentsDisabled"}]}}"#;
        assert_eq!(error_reason(body), "commentsDisabled");
        assert_eq!(error_reason("plain failure"), "plain failure");
    }

    #[tokio::test]
    async fn test_topic_search_returns_ids_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "sourdough"))
            .and(query_param("order", "viewCount"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    {"id": {"kind": "youtube#video", "videoId": "aaaaaaaaaaa"}},
                    {"id": {"kind": "youtube#video", "videoId": "bbbbbbbbbbb"}}
                ]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let ids = client
            .search("sourdough", SearchMode::Topic, SearchOrder::ViewCount, 10)
            .await
            .unwrap();
        assert_eq!(ids, vec!["aaaaaaaaaaa", "bbbbbbbbbbb"]);
    }

    #[tokio::test]
    async fn test_channel_search_resolves_handle() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/channels"))
            .and(query_param("forHandle", "@bakers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{"id": "UCaaaaaaaaaaaaaaaaaaaaaa"}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("channelId", "UCaaaaaaaaaaaaaaaaaaaaaa"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{"id": {"videoId": "ccccccccccc"}}]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let ids = client
            .search("https://www.youtube.com/@bakers", SearchMode::Channel, SearchOrder::Date, 5)
            .await
            .unwrap();
        assert_eq!(ids, vec!["ccccccccccc"]);
    }

    #[tokio::test]
    async fn test_video_mode_needs_no_network() {
        let client = offline_client();
        let ids = client
            .search(
                "https://youtu.be/dQw4w9WgXcQ, dQw4w9WgXcQ 9bZkp7q19f0",
                SearchMode::Video,
                SearchOrder::ViewCount,
                10,
            )
            .await
            .unwrap();
        assert_eq!(ids, vec!["dQw4w9WgXcQ", "9bZkp7q19f0"]);

        let err = client
            .search("nothing here", SearchMode::Video, SearchOrder::ViewCount, 10)
            .await;
        assert!(matches!(err, Err(TrendlensError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_fetch_details_parses_records() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/videos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    {
                        "id": "bbbbbbbbbbb",
                        "snippet": {
                            "publishedAt": "2023-05-01T12:00:00Z",
                            "channelId": "UCchan",
                            "title": "Second #bread",
                            "description": "",
                            "channelTitle": "Bakers",
                            "categoryId": "26"
                        },
                        "statistics": {"viewCount": "200", "commentCount": "4"},
                        "contentDetails": {"duration": "PT10M"}
                    },
                    {
                        "id": "aaaaaaaaaaa",
                        "snippet": {
                            "publishedAt": "2022-01-01T00:00:00Z",
                            "channelId": "UCchan",
                            "title": "First",
                            "description": "hello",
                            "channelTitle": "Bakers",
                            "tags": ["Bread"],
                            "categoryId": "26"
                        },
                        "statistics": {"viewCount": "100", "likeCount": "10", "commentCount": "2"},
                        "contentDetails": {"duration": "PT1H2M3S"}
                    }
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/channels"))
            .and(query_param("part", "statistics"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{"id": "UCchan", "statistics": {"subscriberCount": "5000", "hiddenSubscriberCount": false}}]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let ids = vec![
            "aaaaaaaaaaa".to_string(),
            "bbbbbbbbbbb".to_string(),
            "missingvid1".to_string(),
        ];
        let records = client.fetch_details(&ids).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "aaaaaaaaaaa");
        assert_eq!(records[0].like_count, Some(10));
        assert_eq!(records[0].duration_seconds, 3723);
        assert_eq!(records[0].hashtags, vec!["bread"]);
        assert_eq!(records[1].like_count, None);
        assert_eq!(records[1].view_count, Some(200));
        assert_eq!(records[1].channel_subscribers, Some(5000));
        assert_eq!(
            records[1].published_at.map(|d| d.format("%Y-%m-%d").to_string()),
            Some("2023-05-01".to_string())
        );
    }

    #[tokio::test]
    async fn test_comments_disabled_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/commentThreads"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": {"code": 403, "message": "disabled", "errors": [{"reason": "commentsDisabled"}]}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let fetch = client.fetch_comments("aaaaaaaaaaa", 20).await.unwrap();
        match fetch {
            CommentFetch::Unavailable { reason } => assert_eq!(reason, "commentsDisabled"),
            other => panic!("expected unavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_comments_respect_max_count() {
        let server = MockServer::start().await;
        let thread = |text: &str| {
            json!({"snippet": {"topLevelComment": {"snippet": {"textDisplay": text, "textOriginal": text}}}})
        };
        Mock::given(method("GET"))
            .and(path("/commentThreads"))
            .and(query_param("maxResults", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [thread("great video"), thread("more please"), thread("extra")]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let fetch = client.fetch_comments("aaaaaaaaaaa", 2).await.unwrap();
        assert_eq!(fetch.comments(), &["great video".to_string(), "more please".to_string()]);
    }

    #[tokio::test]
    async fn test_server_errors_are_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{"id": {"videoId": "aaaaaaaaaaa"}}]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let ids = client
            .search("retry me", SearchMode::Topic, SearchOrder::ViewCount, 1)
            .await
            .unwrap();
        assert_eq!(ids, vec!["aaaaaaaaaaa"]);
    }

    #[tokio::test]
    async fn test_quota_rejection_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": {"code": 403, "message": "quota", "errors": [{"reason": "quotaExceeded"}]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result = client
            .search("anything", SearchMode::Topic, SearchOrder::ViewCount, 5)
            .await;
        assert!(matches!(result, Err(TrendlensError::PlatformRejected(_))));
    }

    #[tokio::test]
    async fn test_transcript_parsing_and_absence() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/timedtext"))
            .and(query_param("v", "aaaaaaaaaaa"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "events": [
                    {"tStartMs": 0, "dDurationMs": 1500, "segs": [{"utf8": "hello "}, {"utf8": "there"}]},
                    {"tStartMs": 1500, "dDurationMs": 500, "segs": [{"utf8": "\n"}]},
                    {"tStartMs": 2000, "dDurationMs": 1000, "segs": [{"utf8": "bakers"}]}
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/timedtext"))
            .and(query_param("v", "bbbbbbbbbbb"))
            .respond_with(ResponseTemplate::new(200).set_body_string(""))
            .mount(&server)
            .await;

        let client = client_for(&server);

        let fetch = client.fetch_transcript("aaaaaaaaaaa").await.unwrap();
        let transcript = fetch.transcript().expect("transcript should be available");
        assert_eq!(transcript.segments.len(), 2);
        assert_eq!(transcript.full_text(), "hello there bakers");
        assert!((transcript.segments[1].start_seconds - 2.0).abs() < f64::EPSILON);

        let missing = client.fetch_transcript("bbbbbbbbbbb").await.unwrap();
        assert!(!missing.is_available());
    }
}
