//! CLI command implementations.

mod config;
mod insights;
mod serve;
mod stats;

pub use config::run_config;
pub use insights::run_insights;
pub use serve::{router, run_serve};
pub use stats::run_stats;
