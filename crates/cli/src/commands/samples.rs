use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use qrbench_core::model::EvaluationItem;
use serde::{Deserialize, Serialize};

/// One collected model response, as logged by the generation harness.
///
/// Accepts flat records (`target_text`/`model_output` and common aliases) and
/// lm-eval style sample logs, where the target sits in `doc.input_text` and the
/// response in `prediction`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SampleRecord {
    #[serde(default, alias = "input_text", alias = "input")]
    pub target_text: Option<String>,
    /// Missing or null output is evaluated as an empty output.
    #[serde(default, alias = "prediction", alias = "svg_output", alias = "output")]
    pub model_output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<SampleDoc>,
}

/// The benchmark document a logged sample was generated from.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SampleDoc {
    #[serde(default, alias = "input_text", alias = "input")]
    pub target_text: Option<String>,
}

impl SampleRecord {
    /// Target string, preferring the top-level field over `doc`.
    pub fn target(&self) -> Option<&str> {
        self.target_text
            .as_deref()
            .or_else(|| self.doc.as_ref().and_then(|d| d.target_text.as_deref()))
    }

    /// Convert into an item; `None` when the record names no target.
    pub fn into_item(self) -> Option<EvaluationItem> {
        let target = self.target_text.or_else(|| self.doc.and_then(|d| d.target_text))?;
        Some(EvaluationItem::new(target, self.model_output.unwrap_or_default()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplesFormat {
    Json,
    JsonLines,
    Yaml,
}

impl SamplesFormat {
    /// Pick the format from the file extension; anything unknown is read as a JSON array.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("jsonl") | Some("ndjson") => SamplesFormat::JsonLines,
            Some("yaml") | Some("yml") => SamplesFormat::Yaml,
            _ => SamplesFormat::Json,
        }
    }
}

/// Load evaluation items from a JSON array, JSON Lines, or YAML file.
pub fn load_samples(path: &Path) -> Result<Vec<EvaluationItem>> {
    let body = fs::read_to_string(path)
        .with_context(|| format!("Failed to read samples at {}", path.display()))?;
    let records = parse_samples(&body, SamplesFormat::from_path(path))
        .with_context(|| format!("Failed to parse samples at {}", path.display()))?;

    records
        .into_iter()
        .enumerate()
        .map(|(i, record)| match record.into_item() {
            Some(item) if item.target_text.is_empty() => {
                Err(anyhow!("Sample #{} has an empty target_text", i + 1))
            }
            Some(item) => Ok(item),
            None => Err(anyhow!("Sample #{} has no target_text or doc.input_text", i + 1)),
        })
        .collect()
}

pub fn parse_samples(body: &str, format: SamplesFormat) -> Result<Vec<SampleRecord>> {
    match format {
        SamplesFormat::Json => Ok(serde_json::from_str(body).context("Invalid samples JSON")?),
        SamplesFormat::Yaml => Ok(serde_yaml::from_str(body).context("Invalid samples YAML")?),
        SamplesFormat::JsonLines => body
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(n, line)| {
                serde_json::from_str(line)
                    .with_context(|| format!("Invalid JSON on samples line {}", n + 1))
            })
            .collect(),
    }
}
