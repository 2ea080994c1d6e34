use thiserror::Error;

use crate::model::{CorpusMetrics, Verdict};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MetricsError {
    /// The verdict breaks `is_correct => is_decodable => is_valid_svg`. Verdicts
    /// built by the classifier never do, so this points at the caller.
    #[error("verdict #{index} is inconsistent (correct/decodable/valid flags disagree)")]
    InconsistentVerdict { index: usize },
}

/// Fold a full verdict sequence into corpus metrics.
///
/// Rates are 0.0 for an empty sequence. Order does not matter.
pub fn aggregate(verdicts: &[Verdict]) -> Result<CorpusMetrics, MetricsError> {
    let mut acc = MetricsAccumulator::new();
    for verdict in verdicts {
        acc.push(verdict)?;
    }
    Ok(acc.snapshot())
}

/// Incremental counterpart of [`aggregate`] for progress reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsAccumulator {
    total: usize,
    valid_svg: usize,
    decodable: usize,
    correct: usize,
}

impl MetricsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, verdict: &Verdict) -> Result<(), MetricsError> {
        if !verdict.is_consistent() {
            return Err(MetricsError::InconsistentVerdict { index: self.total });
        }
        self.total += 1;
        self.valid_svg += usize::from(verdict.is_valid_svg);
        self.decodable += usize::from(verdict.is_decodable);
        self.correct += usize::from(verdict.is_correct);
        Ok(())
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn snapshot(&self) -> CorpusMetrics {
        CorpusMetrics {
            svg_validity_rate: rate(self.valid_svg, self.total),
            qrcode_accuracy_rate: rate(self.correct, self.total),
            total_items: self.total,
            valid_svg_count: self.valid_svg,
            decodable_count: self.decodable,
            correct_count: self.correct,
        }
    }
}

fn rate(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}
