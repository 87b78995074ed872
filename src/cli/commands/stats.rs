//! Stats command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::{Output, QueryArgs};
use crate::config::Settings;
use crate::pipeline::{Pipeline, QueryRequest};
use anyhow::Result;

/// Run the stats command.
pub async fn run_stats(args: &QueryArgs, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Stats, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let pipeline = Pipeline::new(settings)?;
    let request = QueryRequest {
        mode: args.mode,
        query: args.query.clone(),
        goal: args.goal.clone(),
        max_results: args.max_results,
    };

    let spinner = Output::spinner("Fetching videos...");
    let report = match pipeline.statistics(&request).await {
        Ok(report) => {
            spinner.finish_and_clear();
            report
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to compute statistics: {}", e));
            return Err(e.into());
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if report.videos.is_empty() {
        Output::warning(&format!("No videos found for '{}'", args.query));
        return Ok(());
    }

    Output::header(&format!("Statistics for '{}' ({})", report.query, report.mode));
    Output::statistics(&report.statistics);

    Output::header("Videos");
    for video in &report.videos {
        Output::list_item(&format!("{} - {} ({})", video.title, video.channel_title, video.url()));
    }

    Ok(())
}
