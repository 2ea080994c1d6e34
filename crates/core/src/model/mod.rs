//! Core data model shared by the pipeline stages, the runner, and reports.
//!
//! - `EvaluationItem`: one (target text, model output) pair.
//! - `Verdict`: the per-item outcome of validate -> rasterize -> decode -> compare.
//! - `FailureKind`: why an item stopped short of a correct decode.
//! - `CorpusMetrics`: corpus-level rates derived from a verdict sequence.
//! - `ItemResult`: a verdict keyed back to its input position for reporting.

use serde::{Deserialize, Serialize};

/// Target strings used by the reference benchmark.
pub const DEFAULT_TARGETS: [&str; 10] = [
    "Hello World",
    "https://example.com",
    "12345",
    "Lorem ipsum dolor sit amet",
    "https://github.com/EleutherAI/lm-evaluation-harness",
    "QR Code Test",
    "OpenAI GPT-4",
    "Cascade AI Assistant",
    "user@example.com",
    "Tel: +1-123-456-7890",
];

/// Immutable input for a single benchmark example.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationItem {
    /// String the QR code must encode.
    pub target_text: String,
    /// Raw text produced by the model; expected to be or contain an SVG document.
    pub model_output: String,
}

impl EvaluationItem {
    pub fn new(target_text: impl Into<String>, model_output: impl Into<String>) -> Self {
        Self { target_text: target_text.into(), model_output: model_output.into() }
    }
}

/// Reason an item did not reach a decoded payload.
///
/// A content mismatch is not a failure kind: the item decoded fine, it just
/// decoded to the wrong text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    EmptyOutput,
    NoSvgFound,
    MalformedSvg,
    UnsupportedSvgFeature,
    RasterizationError,
    RasterizationTimeout,
    NoCodeFound,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::EmptyOutput => "empty_output",
            FailureKind::NoSvgFound => "no_svg_found",
            FailureKind::MalformedSvg => "malformed_svg",
            FailureKind::UnsupportedSvgFeature => "unsupported_svg_feature",
            FailureKind::RasterizationError => "rasterization_error",
            FailureKind::RasterizationTimeout => "rasterization_timeout",
            FailureKind::NoCodeFound => "no_code_found",
        }
    }

    /// True for the kinds produced by the validation step.
    pub fn is_validation_failure(self) -> bool {
        matches!(self, FailureKind::EmptyOutput | FailureKind::NoSvgFound | FailureKind::MalformedSvg)
    }
}

/// Per-item outcome record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub is_valid_svg: bool,
    pub is_decodable: bool,
    pub decoded_text: Option<String>,
    pub is_correct: bool,
    /// Number of QR symbols decoded from the rendered image (only the first is compared).
    #[serde(default)]
    pub codes_found: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
}

impl Verdict {
    /// Verdict for an output that never produced a decoded payload.
    ///
    /// Validation kinds mark the SVG invalid; every later kind keeps it valid.
    pub fn failed(kind: FailureKind) -> Self {
        Self {
            is_valid_svg: !kind.is_validation_failure(),
            is_decodable: false,
            decoded_text: None,
            is_correct: false,
            codes_found: 0,
            failure: Some(kind),
        }
    }

    /// Verdict for an image that decoded; `is_correct` uses exact string equality.
    pub fn decoded(target_text: &str, decoded_text: String, codes_found: usize) -> Self {
        let is_correct = decoded_text == target_text;
        Self {
            is_valid_svg: true,
            is_decodable: true,
            decoded_text: Some(decoded_text),
            is_correct,
            codes_found,
            failure: None,
        }
    }

    /// Checks `is_correct => is_decodable => is_valid_svg` and that a decodable
    /// verdict carries its decoded text.
    pub fn is_consistent(&self) -> bool {
        if self.is_correct && !self.is_decodable {
            return false;
        }
        if self.is_decodable && !self.is_valid_svg {
            return false;
        }
        self.is_decodable == self.decoded_text.is_some()
    }
}

/// Corpus-level scores.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CorpusMetrics {
    pub svg_validity_rate: f64,
    pub qrcode_accuracy_rate: f64,
    pub total_items: usize,
    #[serde(default)]
    pub valid_svg_count: usize,
    #[serde(default)]
    pub decodable_count: usize,
    #[serde(default)]
    pub correct_count: usize,
}

/// A verdict tied back to the input item it was produced for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemResult {
    /// Zero-based position of the item in the evaluated sequence.
    pub index: usize,
    pub target_text: String,
    pub verdict: Verdict,
}

