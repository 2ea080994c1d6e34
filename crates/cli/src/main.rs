use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use qrbench::commands::{
    aggregate_command, classify_command, evaluate_command, list_targets_command, EvaluateOptions,
    DEFAULT_OUTPUT_DIR,
};
use tracing::error;
use tracing_subscriber::EnvFilter;

/// SVG QR-code generation benchmark CLI.
///
/// This CLI is a thin wrapper around `qrbench-core` (exposed in code as `qrbench_core`).
/// It consumes model outputs that were already collected; it never calls a model.
#[derive(Parser, Debug)]
#[command(
    name = "qrbench",
    version,
    about = "Score model-generated SVG QR codes",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate a file of collected samples and write reports.
    ///
    /// This will:
    /// - Classify every sample (validate, rasterize, decode, compare).
    /// - Write `qr_evaluation_results.json` and `qr_evaluation_report.md`.
    /// - Save the SVG of each valid sample under `qr_outputs/`.
    Evaluate {
        /// Samples file (JSON array, JSON Lines, or YAML).
        #[arg(long)]
        samples: PathBuf,

        /// Optional eval config (YAML or JSON).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory for reports and SVG artifacts.
        #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
        output_dir: String,

        /// Model label recorded in the report. Defaults to the samples file stem.
        #[arg(long)]
        model: Option<String>,

        /// Worker threads (defaults to all cores).
        #[arg(long)]
        workers: Option<usize>,

        /// Require the whole output to be an SVG document.
        #[arg(long, default_value_t = false)]
        strict: bool,

        /// Do not save SVG artifacts.
        #[arg(long, default_value_t = false)]
        no_svgs: bool,

        /// Replace results an earlier run left in the output directory.
        #[arg(long, default_value_t = false)]
        force: bool,

        /// Emit the JSON report on stdout instead of a summary.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Classify one model output against a target string.
    Classify {
        /// Text the QR code must encode.
        #[arg(long)]
        target: String,

        /// File holding the model output; `-` or omitted reads stdin.
        #[arg(long)]
        file: Option<String>,

        /// Require the whole output to be an SVG document.
        #[arg(long, default_value_t = false)]
        strict: bool,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Recompute corpus metrics from saved verdicts or a saved report.
    Aggregate {
        /// JSON file with verdicts, item results, or an evaluation report.
        #[arg(long)]
        results: PathBuf,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// List the built-in benchmark target strings.
    Targets {
        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() {
    init_tracing();

    if let Err(err) = run() {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Evaluate {
            samples,
            config,
            output_dir,
            model,
            workers,
            strict,
            no_svgs,
            force,
            json,
        } => {
            let opts = EvaluateOptions {
                samples,
                config,
                output_dir,
                model,
                workers,
                strict,
                no_svgs,
                force,
                json,
            };
            evaluate_command(&opts)?;
        }
        Command::Classify { target, file, strict, json } => {
            classify_command(&target, file.as_deref(), strict, json)?;
        }
        Command::Aggregate { results, json } => {
            aggregate_command(&results, json)?;
        }
        Command::Targets { json } => list_targets_command(json)?,
    }

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
