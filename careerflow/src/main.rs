//! Runs the career-builder pipeline.
//!
//! Usage: `careerflow [CONFIG.json]`. The config path may also be given in
//! `CAREERFLOW_CONFIG`; `CAREERFLOW_*` variables override file values.

use anyhow::Context;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};

use careerflow::career;
use careerflow::config::FlowConfig;
use careerflow::events::{EventSink, LoggingEventSink};
use careerflow::logging;
use careerflow::tools::{CannedSearchTool, SearchTool};

fn load_config() -> anyhow::Result<FlowConfig> {
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("CAREERFLOW_CONFIG").ok());

    let mut config = match path {
        Some(path) => FlowConfig::from_json_file(&path)
            .with_context(|| format!("loading configuration from {path}"))?,
        None => FlowConfig::default(),
    };
    config
        .apply_env_overrides()
        .context("applying CAREERFLOW_* overrides")?;
    Ok(config)
}

#[cfg(feature = "websearch")]
fn search_tool(config: &FlowConfig) -> anyhow::Result<Arc<dyn SearchTool>> {
    if config.search.endpoint.is_some() {
        let tool = careerflow::tools::HttpSearchTool::new(config.search.clone())
            .context("building the HTTP search tool")?;
        return Ok(Arc::new(tool));
    }
    warn!("No search endpoint configured, using canned results");
    Ok(Arc::new(CannedSearchTool::education_samples()))
}

#[cfg(not(feature = "websearch"))]
fn search_tool(config: &FlowConfig) -> anyhow::Result<Arc<dyn SearchTool>> {
    if config.search.endpoint.is_some() {
        warn!("Built without the websearch feature, ignoring search endpoint");
    }
    Ok(Arc::new(CannedSearchTool::education_samples()))
}

async fn run() -> anyhow::Result<Option<String>> {
    let config = load_config()?;
    logging::init(&config.logging).context("initialising logging")?;

    let sink: Arc<dyn EventSink> = Arc::new(LoggingEventSink::default());
    let pipeline = career::build_pipeline(&config, search_tool(&config)?, sink)?;

    info!(pipeline = pipeline.name(), steps = pipeline.len(), "Starting career builder");
    let outcome = pipeline.run().await;
    info!(
        run_id = %outcome.run_id,
        status = %outcome.status,
        duration_ms = outcome.duration_ms(),
        "Career builder finished"
    );
    Ok(outcome.summary().map(str::to_string))
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(Some(summary)) => {
            println!("{summary}");
            ExitCode::SUCCESS
        }
        Ok(None) => {
            println!("\nFlow aborted. Check logs for details.");
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("careerflow: {err:#}");
            println!("\nFlow aborted. Check logs for details.");
            ExitCode::FAILURE
        }
    }
}
