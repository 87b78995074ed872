//! CLI output formatting utilities.

use crate::duration::format_seconds;
use crate::insights::InsightReport;
use crate::stats::{Measure, Metric, Statistics};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(msg: &str) {
        println!("  {} {}", style("*").cyan(), msg);
    }

    /// Print a statistics table.
    pub fn statistics(stats: &Statistics) {
        Output::kv("Videos", &stats.video_count.to_string());
        Output::kv("Channels", &stats.total_channels.to_string());
        Output::kv(
            "Most common year",
            &stats
                .most_common_year
                .map(|y| y.to_string())
                .unwrap_or_else(|| crate::stats::NO_DATA.to_string()),
        );
        if !stats.categories.is_empty() {
            Output::kv("Categories", &stats.categories.join(", "));
        }

        println!();
        for (metric, summary) in &stats.metrics {
            let (average, median) = match metric {
                Metric::DurationSeconds => (as_duration(summary.average), as_duration(summary.median)),
                _ => (summary.average.to_string(), summary.median.to_string()),
            };
            println!(
                "  {:<18} avg {:<14} median {:<14} {}",
                style(metric.key()).bold(),
                average,
                median,
                style(format!("({} samples)", summary.samples)).dim()
            );
        }

        if !stats.top_hashtags.is_empty() {
            Output::header("Top hashtags");
            for tag in &stats.top_hashtags {
                Output::list_item(&format!("#{} ({})", tag.tag, tag.count));
            }
        }
    }

    /// Print an insight report.
    pub fn insights(report: &InsightReport) {
        let coverage = &report.coverage;
        Output::kv(
            "Transcripts",
            &format!("{}/{}", coverage.with_transcripts.len(), coverage.videos),
        );
        Output::kv(
            "Comments",
            &format!("{}/{}", coverage.with_comments.len(), coverage.videos),
        );

        for (key, answer) in &report.answers {
            Output::header(&key.replace('_', " "));
            println!("{}", answer.trim());
        }

        for key in &report.skipped {
            Output::warning(&format!("Skipped {}: no material", key));
        }
        for (key, error) in &report.failures {
            Output::error(&format!("{} failed: {}", key, error));
        }
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(spinner_style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

fn as_duration(measure: Measure) -> String {
    match measure.value() {
        Some(seconds) => format_seconds(seconds.round() as u64),
        None => measure.to_string(),
    }
}
