use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use qrbench_core::config::{load_eval_config, EvalConfig};
use qrbench_core::model::{EvaluationItem, ItemResult};
use qrbench_core::report::{artifact_file_name, EvaluationReport};
use qrbench_core::services::runner::EvaluationRunner;
use qrbench_core::services::validator::{ExtractionPolicy, SvgValidator};
use tracing::{debug, info};

use crate::commands::{
    describe_verdict, load_samples, prepare_output_dir, print_metrics, write_json,
};
use crate::{canonicalize_or_current, infer_run_name, sha256_file};

pub const RESULTS_FILE_NAME: &str = "qr_evaluation_results.json";
pub const REPORT_FILE_NAME: &str = "qr_evaluation_report.md";
pub const SVG_DIR_NAME: &str = "qr_outputs";
pub const DEFAULT_OUTPUT_DIR: &str = "qr_eval_output";

/// Entries `evaluate` owns inside the output directory.
const OUTPUT_ARTIFACTS: [&str; 3] = [RESULTS_FILE_NAME, REPORT_FILE_NAME, SVG_DIR_NAME];

/// Arguments for `evaluate`, mirroring the CLI flags.
#[derive(Debug, Clone)]
pub struct EvaluateOptions {
    pub samples: PathBuf,
    pub config: Option<PathBuf>,
    pub output_dir: String,
    pub model: Option<String>,
    pub workers: Option<usize>,
    pub strict: bool,
    pub no_svgs: bool,
    pub force: bool,
    pub json: bool,
}

impl EvaluateOptions {
    pub fn new(samples: impl Into<PathBuf>) -> Self {
        Self {
            samples: samples.into(),
            config: None,
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
            model: None,
            workers: None,
            strict: false,
            no_svgs: false,
            force: false,
            json: false,
        }
    }

    /// Config file (or defaults) with CLI flags applied on top.
    pub fn effective_config(&self) -> Result<EvalConfig> {
        let mut config = match &self.config {
            Some(path) => load_eval_config(path)?,
            None => EvalConfig::default(),
        };
        if self.strict {
            config.extraction = ExtractionPolicy::Strict;
        }
        if self.workers.is_some() {
            config.workers = self.workers;
        }
        if self.no_svgs {
            config.save_svgs = false;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Evaluate collected samples and write JSON + Markdown reports.
pub fn evaluate_command(opts: &EvaluateOptions) -> Result<EvaluationReport> {
    let config = opts.effective_config()?;
    let items = load_samples(&opts.samples)?;
    let samples_hash = sha256_file(&opts.samples)?;

    let output_dir = canonicalize_or_current(&opts.output_dir)?;
    prepare_output_dir(&output_dir, &OUTPUT_ARTIFACTS, opts.force)?;

    let classifier = config.classifier();
    let mut runner = EvaluationRunner::new(&classifier);
    runner.workers = config.workers;
    let run = runner.run_with_progress(&items, |progress| {
        debug!(
            completed = progress.completed,
            total = progress.total,
            correct = progress.metrics.correct_count,
            "item classified"
        );
    })?;

    for result in &run.results {
        info!(
            item = result.index + 1,
            target = %result.target_text,
            outcome = %describe_verdict(&result.verdict),
            "classified"
        );
    }

    if config.save_svgs {
        let saved = save_valid_svgs(&output_dir, &items, &run.results, config.extraction)?;
        info!(saved, dir = %output_dir.join(SVG_DIR_NAME).display(), "saved SVG artifacts");
    }

    let report = EvaluationReport {
        model: Some(opts.model.clone().unwrap_or_else(|| infer_run_name(&opts.samples))),
        timestamp: Utc::now().to_rfc3339(),
        samples_hash: Some(samples_hash),
        tool_version: qrbench_core::version().to_string(),
        config,
        metrics: run.metrics.clone(),
        cancelled: run.cancelled,
        results: run.results,
    };

    let results_path = output_dir.join(RESULTS_FILE_NAME);
    write_json(&results_path, &report)?;
    let report_path = output_dir.join(REPORT_FILE_NAME);
    fs::write(&report_path, report.to_markdown())
        .with_context(|| format!("Failed to write {}", report_path.display()))?;

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("QR Code Generation Evaluation");
        println!("Model: {}", report.model.as_deref().unwrap_or("-"));
        print_metrics(&report.metrics);
        println!("Results: {}", results_path.display());
        println!("Report: {}", report_path.display());
    }

    Ok(report)
}

/// Write the SVG text each valid item was judged on into `qr_outputs/`.
fn save_valid_svgs(
    output_dir: &Path,
    items: &[EvaluationItem],
    results: &[ItemResult],
    policy: ExtractionPolicy,
) -> Result<usize> {
    let svg_dir = output_dir.join(SVG_DIR_NAME);
    fs::create_dir_all(&svg_dir)
        .with_context(|| format!("Failed to create {}", svg_dir.display()))?;

    let validator = SvgValidator::new(policy);
    let mut saved = 0;
    for result in results.iter().filter(|r| r.verdict.is_valid_svg) {
        let Ok(doc) = validator.validate(&items[result.index].model_output) else {
            continue;
        };
        let path = svg_dir.join(artifact_file_name(result.index, &result.target_text));
        fs::write(&path, doc.source())
            .with_context(|| format!("Failed to write SVG artifact {}", path.display()))?;
        saved += 1;
    }
    Ok(saved)
}
