use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::model::{CorpusMetrics, EvaluationItem, ItemResult, Verdict};
use crate::services::classifier::OutcomeClassifier;
use crate::services::metrics::{aggregate, MetricsAccumulator, MetricsError};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error(transparent)]
    Metrics(#[from] MetricsError),
}

/// Snapshot passed to progress callbacks after each finished item.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    pub metrics: CorpusMetrics,
}

/// Outcome of running the classifier over a sequence of items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRun {
    /// One entry per classified item, in input order. Items skipped after
    /// cancellation are absent.
    pub results: Vec<ItemResult>,
    pub metrics: CorpusMetrics,
    pub cancelled: bool,
}

impl EvaluationRun {
    pub fn verdicts(&self) -> Vec<Verdict> {
        self.results.iter().map(|r| r.verdict.clone()).collect()
    }
}

/// Classifies items in parallel on a dedicated rayon pool.
pub struct EvaluationRunner<'a> {
    pub classifier: &'a OutcomeClassifier,
    /// Worker thread count; `None` uses every available core.
    pub workers: Option<usize>,
    /// Once set, no further items are dispatched.
    pub cancel: Option<Arc<AtomicBool>>,
}

impl<'a> EvaluationRunner<'a> {
    pub fn new(classifier: &'a OutcomeClassifier) -> Self {
        Self { classifier, workers: None, cancel: None }
    }

    pub fn run(&self, items: &[EvaluationItem]) -> Result<EvaluationRun, RunError> {
        self.run_with_progress(items, |_| {})
    }

    pub fn run_with_progress<F>(
        &self,
        items: &[EvaluationItem],
        on_progress: F,
    ) -> Result<EvaluationRun, RunError>
    where
        F: Fn(&Progress) + Sync,
    {
        let mut builder = rayon::ThreadPoolBuilder::new()
            .thread_name(|i| format!("qrbench-worker-{i}"));
        if let Some(workers) = self.workers {
            builder = builder.num_threads(workers);
        }
        let pool = builder.build()?;

        let total = items.len();
        let started = Instant::now();
        info!(
            items = total,
            workers = pool.current_num_threads(),
            policy = self.classifier.policy().as_str(),
            "starting evaluation"
        );

        let completed = AtomicUsize::new(0);
        let running = Mutex::new(MetricsAccumulator::new());
        let outcomes: Vec<Option<ItemResult>> = pool.install(|| {
            items
                .par_iter()
                .enumerate()
                .map(|(index, item)| {
                    if self.is_cancelled() {
                        return None;
                    }
                    let verdict = self.classifier.classify(item);

                    let metrics = {
                        let mut acc = running.lock().unwrap_or_else(|e| e.into_inner());
                        if let Err(err) = acc.push(&verdict) {
                            warn!(index, error = %err, "classifier produced an inconsistent verdict");
                        }
                        acc.snapshot()
                    };
                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    on_progress(&Progress { completed: done, total, metrics });

                    Some(ItemResult { index, target_text: item.target_text.clone(), verdict })
                })
                .collect()
        });

        let results: Vec<ItemResult> = outcomes.into_iter().flatten().collect();
        let verdicts: Vec<Verdict> = results.iter().map(|r| r.verdict.clone()).collect();
        let metrics = aggregate(&verdicts)?;
        let cancelled = results.len() < total;

        info!(
            classified = results.len(),
            skipped = total - results.len(),
            valid = metrics.valid_svg_count,
            correct = metrics.correct_count,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "evaluation finished"
        );
        Ok(EvaluationRun { results, metrics, cancelled })
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|flag| flag.load(Ordering::SeqCst))
    }
}
