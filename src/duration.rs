//! Compact duration parsing (`PT1H2M3S`).

use regex::Regex;
use std::sync::LazyLock;

static UNIT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)([DHMS])").expect("Invalid regex"));

/// Convert a compact duration such as `PT1H2M3S` into whole seconds.
///
/// Missing units count as zero. Input without any unit marker yields 0 rather
/// than an error, so callers should treat 0 as "unknown or empty".
pub fn parse_duration(input: &str) -> u64 {
    let upper = input.trim().to_ascii_uppercase();

    UNIT_REGEX
        .captures_iter(&upper)
        .map(|caps| {
            let value: u64 = caps[1].parse().unwrap_or(0);
            let unit = match &caps[2] {
                "D" => 86_400,
                "H" => 3_600,
                "M" => 60,
                _ => 1,
            };
            value.saturating_mul(unit)
        })
        .fold(0u64, |acc, secs| acc.saturating_add(secs))
}

/// Format seconds as MM:SS or HH:MM:SS.
pub fn format_seconds(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}
