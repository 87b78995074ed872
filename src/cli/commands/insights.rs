//! Insights command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::{Output, QueryArgs};
use crate::config::Settings;
use crate::pipeline::{Pipeline, QueryRequest};
use anyhow::Result;

/// Run the insights command.
pub async fn run_insights(args: &QueryArgs, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Insights, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let timeout = settings.insights.timeout_seconds;
    let pipeline = Pipeline::new(settings)?;
    let request = QueryRequest {
        mode: args.mode,
        query: args.query.clone(),
        goal: args.goal.clone(),
        max_results: args.max_results,
    };

    let spinner = Output::spinner(&format!(
        "Reading transcripts and comments ({}s per question)...",
        timeout
    ));
    let result = match pipeline.insights(&request).await {
        Ok(result) => {
            spinner.finish_and_clear();
            result
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to derive insights: {}", e));
            return Err(e.into());
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if result.statistics.video_count == 0 {
        Output::warning(&format!("No videos found for '{}'", args.query));
        return Ok(());
    }

    Output::header(&format!("Insights for '{}' (goal: {})", result.query, result.goal));
    Output::insights(&result.insights);

    if result.insights.failures.is_empty() {
        Output::success(&format!("{} question(s) answered", result.insights.answers.len()));
    }

    Ok(())
}
