//! Evaluation reports: the JSON record written after a run and its Markdown rendering.

use serde::{Deserialize, Serialize};

use crate::config::EvalConfig;
use crate::model::{CorpusMetrics, ItemResult};

/// Longest slice of the target text kept in artifact file names.
const ARTIFACT_STEM_LIMIT: usize = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// RFC 3339 timestamp of when the run finished.
    pub timestamp: String,
    /// SHA-256 of the samples file the run was fed from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub samples_hash: Option<String>,
    pub tool_version: String,
    pub config: EvalConfig,
    pub metrics: CorpusMetrics,
    #[serde(default)]
    pub cancelled: bool,
    pub results: Vec<ItemResult>,
}

impl EvaluationReport {
    /// Human-readable summary: header, metrics block, and per-item table.
    pub fn to_markdown(&self) -> String {
        let m = &self.metrics;
        let mut out = String::new();
        out.push_str("# QR Code Generation Evaluation Report\n\n");
        out.push_str(&format!(
            "**Model:** {}  \n",
            self.model.as_deref().unwrap_or("(unspecified)")
        ));
        out.push_str(&format!("**Date:** {}  \n", self.timestamp));
        out.push_str(&format!("**Extraction policy:** {}  \n", self.config.extraction.as_str()));
        if self.cancelled {
            out.push_str("**Note:** run was cancelled; metrics cover classified items only.  \n");
        }
        out.push('\n');

        out.push_str("## Metrics\n\n");
        out.push_str(&format!(
            "- **SVG Validity Rate:** {}/{} ({})\n",
            m.valid_svg_count,
            m.total_items,
            percent(m.svg_validity_rate)
        ));
        out.push_str(&format!(
            "- **QR Code Accuracy:** {}/{} ({})\n",
            m.correct_count,
            m.total_items,
            percent(m.qrcode_accuracy_rate)
        ));
        out.push_str(&format!("- **Decodable:** {}/{}\n\n", m.decodable_count, m.total_items));

        out.push_str("## Results\n\n");
        out.push_str("| # | Target | Valid SVG | Decoded | Match | Failure |\n");
        out.push_str("|---|--------|-----------|---------|-------|---------|\n");
        for result in &self.results {
            let v = &result.verdict;
            out.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} |\n",
                result.index + 1,
                escape_cell(&result.target_text),
                mark(v.is_valid_svg),
                v.decoded_text.as_deref().map(escape_cell).unwrap_or_else(|| "N/A".to_string()),
                mark(v.is_correct),
                v.failure.map(|f| f.as_str()).unwrap_or("-"),
            ));
        }
        out
    }
}

/// File name for the saved SVG of item `index` (zero-based).
///
/// `qr_{NN}_{stem}.svg`, where the stem is the target text with spaces and
/// URL separators flattened to `_`, cut to 30 characters.
pub fn artifact_file_name(index: usize, target_text: &str) -> String {
    let flattened = target_text.replace(' ', "_").replace("://", "_").replace('/', "_");
    let stem: String = flattened
        .chars()
        .take(ARTIFACT_STEM_LIMIT)
        .map(|c| if c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '@' | '+') { c } else { '_' })
        .collect();
    format!("qr_{:02}_{}.svg", index + 1, stem)
}

fn percent(rate: f64) -> String {
    format!("{:.2}%", rate * 100.0)
}

fn mark(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
