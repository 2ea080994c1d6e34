use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use qrbench_core::model::{CorpusMetrics, Verdict};
use serde::Serialize;

/// Make sure `dir` exists and holds none of the `artifacts` a previous run wrote.
///
/// Existing artifacts are an error unless `force` is set, in which case only
/// those entries are removed. Anything else in `dir` is left alone.
pub fn prepare_output_dir(dir: &Path, artifacts: &[&str], force: bool) -> Result<()> {
    let existing: Vec<PathBuf> =
        artifacts.iter().map(|name| dir.join(name)).filter(|path| path.exists()).collect();
    if !existing.is_empty() {
        if !force {
            return Err(anyhow!(
                "Output directory {} already holds results (rerun with --force to overwrite)",
                dir.display()
            ));
        }
        for path in &existing {
            let removed =
                if path.is_dir() { fs::remove_dir_all(path) } else { fs::remove_file(path) };
            removed.with_context(|| format!("Failed to remove old artifact {}", path.display()))?;
        }
    }
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output dir {}", dir.display()))?;
    Ok(())
}

/// Serialize `value` as pretty JSON into `path`.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize JSON")?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

/// Print the metrics block shared by `evaluate` and `aggregate`.
pub fn print_metrics(metrics: &CorpusMetrics) {
    let total = metrics.total_items;
    println!("Total items: {}", total);
    println!(
        "Valid SVGs: {}/{} ({:.2}%)",
        metrics.valid_svg_count,
        total,
        metrics.svg_validity_rate * 100.0
    );
    println!("Decodable: {}/{}", metrics.decodable_count, total);
    println!(
        "Correct QR codes: {}/{} ({:.2}%)",
        metrics.correct_count,
        total,
        metrics.qrcode_accuracy_rate * 100.0
    );
}

/// One-line human summary of a verdict.
pub fn describe_verdict(verdict: &Verdict) -> String {
    if verdict.is_correct {
        return format!("correct ('{}')", verdict.decoded_text.as_deref().unwrap_or_default());
    }
    if let Some(decoded) = &verdict.decoded_text {
        return format!("mismatch (decoded '{}')", decoded);
    }
    match verdict.failure {
        Some(kind) => kind.as_str().replace('_', " "),
        None => "failed".to_string(),
    }
}
