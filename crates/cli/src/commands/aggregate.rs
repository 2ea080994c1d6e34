use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use qrbench_core::model::{CorpusMetrics, ItemResult, Verdict};
use qrbench_core::report::EvaluationReport;
use qrbench_core::services::metrics::aggregate;

use crate::commands::print_metrics;

/// Recompute corpus metrics from saved verdicts.
///
/// Accepts a JSON array of verdicts, an array of item results, or a full
/// evaluation report.
pub fn aggregate_command(results: &Path, json: bool) -> Result<CorpusMetrics> {
    let body = fs::read_to_string(results)
        .with_context(|| format!("Failed to read results at {}", results.display()))?;
    let verdicts = parse_verdicts(&body)
        .with_context(|| format!("Failed to parse results at {}", results.display()))?;
    let metrics = aggregate(&verdicts).context("Results contain an invalid verdict")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
    } else {
        print_metrics(&metrics);
    }
    Ok(metrics)
}

pub fn parse_verdicts(body: &str) -> Result<Vec<Verdict>> {
    if let Ok(verdicts) = serde_json::from_str::<Vec<Verdict>>(body) {
        return Ok(verdicts);
    }
    if let Ok(results) = serde_json::from_str::<Vec<ItemResult>>(body) {
        return Ok(results.into_iter().map(|r| r.verdict).collect());
    }
    if let Ok(report) = serde_json::from_str::<EvaluationReport>(body) {
        return Ok(report.results.into_iter().map(|r| r.verdict).collect());
    }
    Err(anyhow!(
        "Expected a JSON array of verdicts, an array of item results, or an evaluation report"
    ))
}
