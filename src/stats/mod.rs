//! Descriptive statistics over fetched videos.
//!
//! Every metric is computed over the videos that report it; a metric nobody
//! reports yields `Measure::NoData` instead of a division by zero.

use crate::platform::VideoRecord;
use chrono::Datelike;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::Hash;

/// Text used for an empty sample.
pub const NO_DATA: &str = "no data";

/// A computed value, or the explicit absence of one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measure {
    Value(f64),
    NoData,
}

impl Measure {
    pub fn value(&self) -> Option<f64> {
        match self {
            Measure::Value(v) => Some(*v),
            Measure::NoData => None,
        }
    }
}

impl Serialize for Measure {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Measure::Value(v) => serializer.serialize_f64(*v),
            Measure::NoData => serializer.serialize_str(NO_DATA),
        }
    }
}

impl std::fmt::Display for Measure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Measure::Value(v) if v.fract() == 0.0 => write!(f, "{:.0}", v),
            Measure::Value(v) => write!(f, "{:.2}", v),
            Measure::NoData => write!(f, "{}", NO_DATA),
        }
    }
}

/// Numeric fields tracked per video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Views,
    Likes,
    Comments,
    Subscribers,
    DurationSeconds,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::Views,
        Metric::Likes,
        Metric::Comments,
        Metric::Subscribers,
        Metric::DurationSeconds,
    ];

    /// Name used in flattened records (`average_{key}`).
    pub fn key(&self) -> &'static str {
        match self {
            Metric::Views => "views",
            Metric::Likes => "likes",
            Metric::Comments => "comments",
            Metric::Subscribers => "subscribers",
            Metric::DurationSeconds => "duration_seconds",
        }
    }

    fn extract(&self, video: &VideoRecord) -> Option<f64> {
        match self {
            Metric::Views => video.view_count.map(|v| v as f64),
            Metric::Likes => video.like_count.map(|v| v as f64),
            Metric::Comments => video.comment_count.map(|v| v as f64),
            Metric::Subscribers => video.channel_subscribers.map(|v| v as f64),
            // Malformed durations parse to 0 and are kept; only a missing field is skipped
            Metric::DurationSeconds => {
                (!video.duration.is_empty()).then_some(video.duration_seconds as f64)
            }
        }
    }
}

/// Average and median of one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricSummary {
    /// Number of videos that reported the metric.
    pub samples: usize,
    pub average: Measure,
    pub median: Measure,
}

impl MetricSummary {
    fn from_values(values: &[f64]) -> Self {
        Self {
            samples: values.len(),
            average: mean(values),
            median: median(values),
        }
    }
}

/// A hashtag and how many videos used it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HashtagCount {
    pub tag: String,
    pub count: usize,
}

/// Statistics for one request.
#[derive(Debug, Clone, Serialize)]
pub struct Statistics {
    pub video_count: usize,
    pub metrics: BTreeMap<Metric, MetricSummary>,
    /// Distinct channel names.
    pub total_channels: usize,
    /// Distinct category ids, first-encountered order.
    pub categories: Vec<String>,
    pub top_hashtags: Vec<HashtagCount>,
    pub most_common_year: Option<i32>,
}

impl Statistics {
    pub fn metric(&self, metric: Metric) -> Option<&MetricSummary> {
        self.metrics.get(&metric)
    }

    /// Flatten into `{"average_views": .., "median_views": .., ..}`.
    pub fn record(&self) -> BTreeMap<String, Measure> {
        let mut record = BTreeMap::new();
        for (metric, summary) in &self.metrics {
            record.insert(format!("average_{}", metric.key()), summary.average);
            record.insert(format!("median_{}", metric.key()), summary.median);
        }
        record.insert("video_count".to_string(), Measure::Value(self.video_count as f64));
        record.insert("total_channels".to_string(), Measure::Value(self.total_channels as f64));
        record.insert(
            "most_common_year".to_string(),
            self.most_common_year
                .map(|y| Measure::Value(y as f64))
                .unwrap_or(Measure::NoData),
        );
        record
    }
}

/// Compute statistics over the given videos.
pub fn compute_statistics(videos: &[VideoRecord], top_hashtags: usize) -> Statistics {
    let metrics = Metric::ALL
        .iter()
        .map(|metric| {
            let values: Vec<f64> = videos.iter().filter_map(|v| metric.extract(v)).collect();
            (*metric, MetricSummary::from_values(&values))
        })
        .collect();

    let channels: HashSet<&str> = videos
        .iter()
        .map(|v| {
            if v.channel_title.is_empty() {
                v.channel_id.as_str()
            } else {
                v.channel_title.as_str()
            }
        })
        .filter(|c| !c.is_empty())
        .collect();

    let mut categories: Vec<String> = Vec::new();
    for video in videos {
        if !video.category_id.is_empty() && !categories.contains(&video.category_id) {
            categories.push(video.category_id.clone());
        }
    }

    let top_hashtags = rank_by_frequency(videos.iter().flat_map(|v| v.hashtags.iter().cloned()))
        .into_iter()
        .take(top_hashtags)
        .map(|(tag, count)| HashtagCount { tag, count })
        .collect();

    let most_common_year = rank_by_frequency(
        videos
            .iter()
            .filter_map(|v| v.published_at.map(|d| d.year())),
    )
    .into_iter()
    .next()
    .map(|(year, _)| year);

    Statistics {
        video_count: videos.len(),
        metrics,
        total_channels: channels.len(),
        categories,
        top_hashtags,
        most_common_year,
    }
}

/// Arithmetic mean, `NoData` for an empty sample.
pub fn mean(values: &[f64]) -> Measure {
    if values.is_empty() {
        return Measure::NoData;
    }
    Measure::Value(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median (mean of the middle pair for even counts), `NoData` for an empty sample.
pub fn median(values: &[f64]) -> Measure {
    if values.is_empty() {
        return Measure::NoData;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Measure::Value((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Measure::Value(sorted[mid])
    }
}

/// Count occurrences, most frequent first; ties keep first-seen order.
pub fn rank_by_frequency<T, I>(items: I) -> Vec<(T, usize)>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = T>,
{
    let mut counts: HashMap<T, (usize, usize)> = HashMap::new();
    for (position, item) in items.into_iter().enumerate() {
        counts.entry(item).or_insert((0, position)).0 += 1;
    }

    let mut ranked: Vec<(T, usize, usize)> = counts
        .into_iter()
        .map(|(item, (count, first))| (item, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked.into_iter().map(|(item, count, _)| (item, count)).collect()
}
