//! One-line descriptions of the analyzed videos, fed to every prompt.

use crate::platform::VideoRecord;

/// Describe each video in one sentence, sentences joined by a space.
pub fn format_metadata(videos: &[VideoRecord]) -> String {
    videos.iter().map(describe).collect::<Vec<_>>().join(" ")
}

fn describe(video: &VideoRecord) -> String {
    let views = video
        .view_count
        .map(|v| v.to_string())
        .unwrap_or_else(|| "an unknown number of".to_string());

    let subscribers = video
        .channel_subscribers
        .map(|s| format!(", {} subscribers", s))
        .unwrap_or_default();

    let published = video
        .published_at
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "an unknown date".to_string());

    format!(
        "Video titled {} by {} has {} views{}. Published on {}.",
        video.title, video.channel_title, views, subscribers, published
    )
}
