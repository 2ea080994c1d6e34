use std::fs;
use std::io::Read;

use anyhow::{Context, Result};
use qrbench_core::model::{EvaluationItem, Verdict};
use qrbench_core::services::classifier::OutcomeClassifier;
use qrbench_core::services::validator::ExtractionPolicy;

use crate::commands::describe_verdict;

/// Classify a single model output read from `file` (or stdin for `None`/`-`).
pub fn classify_command(
    target: &str,
    file: Option<&str>,
    strict: bool,
    json: bool,
) -> Result<Verdict> {
    let model_output = read_model_output(file)?;
    let policy = if strict { ExtractionPolicy::Strict } else { ExtractionPolicy::Permissive };
    let classifier = OutcomeClassifier::new(policy);
    let verdict = classifier.classify(&EvaluationItem::new(target, model_output));

    if json {
        println!("{}", serde_json::to_string_pretty(&verdict)?);
    } else {
        println!("Target: {}", target);
        println!("Valid SVG: {}", verdict.is_valid_svg);
        println!("Decodable: {}", verdict.is_decodable);
        println!("Decoded: {}", verdict.decoded_text.as_deref().unwrap_or("N/A"));
        println!("Correct: {}", verdict.is_correct);
        println!("Outcome: {}", describe_verdict(&verdict));
    }

    Ok(verdict)
}

fn read_model_output(file: Option<&str>) -> Result<String> {
    match file {
        Some(path) if path != "-" => fs::read_to_string(path)
            .with_context(|| format!("Failed to read model output at {}", path)),
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read model output from stdin")?;
            Ok(buf)
        }
    }
}
