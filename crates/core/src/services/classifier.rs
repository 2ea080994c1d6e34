use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::model::{EvaluationItem, FailureKind, Verdict};
use crate::services::decoder::{DecodedPayload, QrDecoder, RqrrDecoder};
use crate::services::raster::{RasterError, RasterSize, Rasterizer, ResvgRasterizer};
use crate::services::validator::{ExtractionPolicy, ParsedSvg, SvgValidator};

/// Default per-item budget for rasterization plus decoding.
pub const DEFAULT_ITEM_TIMEOUT: Duration = Duration::from_secs(10);

/// Default limit on render workers still running after their item timed out.
pub const DEFAULT_MAX_STALLED_WORKERS: usize = 8;

const JOB_RUNNING: u8 = 0;
const JOB_FINISHED: u8 = 1;
const JOB_ABANDONED: u8 = 2;

/// Drives validate -> rasterize -> decode -> compare for one item.
///
/// Every failure is folded into the returned `Verdict`; nothing propagates.
#[derive(Clone)]
pub struct OutcomeClassifier {
    validator: SvgValidator,
    rasterizer: Arc<dyn Rasterizer>,
    decoder: Arc<dyn QrDecoder>,
    raster_size: RasterSize,
    timeout: Option<Duration>,
    max_stalled_workers: usize,
    /// Timed-out workers that have not finished yet; shared between clones.
    stalled_workers: Arc<AtomicUsize>,
}

impl Default for OutcomeClassifier {
    fn default() -> Self {
        Self::new(ExtractionPolicy::default())
    }
}

impl OutcomeClassifier {
    /// Classifier with the resvg renderer, the rqrr decoder, 512x512 output,
    /// and the default item timeout.
    pub fn new(policy: ExtractionPolicy) -> Self {
        Self {
            validator: SvgValidator::new(policy),
            rasterizer: Arc::new(ResvgRasterizer::default()),
            decoder: Arc::new(RqrrDecoder),
            raster_size: RasterSize::default(),
            timeout: Some(DEFAULT_ITEM_TIMEOUT),
            max_stalled_workers: DEFAULT_MAX_STALLED_WORKERS,
            stalled_workers: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_rasterizer(mut self, rasterizer: Arc<dyn Rasterizer>) -> Self {
        self.rasterizer = rasterizer;
        self
    }

    pub fn with_decoder(mut self, decoder: Arc<dyn QrDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn with_raster_size(mut self, size: RasterSize) -> Self {
        self.raster_size = size;
        self
    }

    /// `None` runs rasterize + decode inline on the calling thread.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Once this many timed-out workers are still running, further items fail
    /// with a rasterization error instead of starting another worker.
    pub fn with_max_stalled_workers(mut self, limit: usize) -> Self {
        self.max_stalled_workers = limit;
        self
    }

    pub fn max_stalled_workers(&self) -> usize {
        self.max_stalled_workers
    }

    /// Render workers abandoned after a timeout that are still running.
    pub fn stalled_workers(&self) -> usize {
        self.stalled_workers.load(Ordering::SeqCst)
    }

    pub fn policy(&self) -> ExtractionPolicy {
        self.validator.policy()
    }

    pub fn raster_size(&self) -> RasterSize {
        self.raster_size
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn rasterizer_name(&self) -> &'static str {
        self.rasterizer.name()
    }

    pub fn decoder_name(&self) -> &'static str {
        self.decoder.name()
    }

    pub fn classify(&self, item: &EvaluationItem) -> Verdict {
        let doc = match self.validator.validate(&item.model_output) {
            Ok(doc) => doc,
            Err(err) => {
                debug!(error = %err, "validation failed");
                return Verdict::failed(err.kind());
            }
        };

        let payloads = match self.render_and_decode(doc) {
            Ok(payloads) => payloads,
            Err(err) => {
                debug!(error = %err, "rasterization failed");
                return Verdict::failed(err.kind());
            }
        };

        let codes_found = payloads.len();
        match payloads.into_iter().next() {
            // Only the first symbol in detection order is compared.
            Some(first) => Verdict::decoded(&item.target_text, first.text, codes_found),
            None => Verdict::failed(FailureKind::NoCodeFound),
        }
    }

    fn render_and_decode(&self, doc: ParsedSvg) -> Result<Vec<DecodedPayload>, RasterError> {
        let Some(limit) = self.timeout else {
            return guarded_render_and_decode(
                self.rasterizer.as_ref(),
                self.decoder.as_ref(),
                &doc,
                self.raster_size,
            );
        };

        let stalled = self.stalled_workers();
        if stalled >= self.max_stalled_workers {
            warn!(stalled, limit = self.max_stalled_workers, "too many stalled render workers");
            return Err(RasterError::Rasterization(format!(
                "{stalled} render workers are still running past their timeout"
            )));
        }

        let (tx, rx) = mpsc::channel();
        let state = Arc::new(AtomicU8::new(JOB_RUNNING));
        let worker_state = Arc::clone(&state);
        let stalled_workers = Arc::clone(&self.stalled_workers);
        let rasterizer = Arc::clone(&self.rasterizer);
        let decoder = Arc::clone(&self.decoder);
        let size = self.raster_size;
        thread::Builder::new()
            .name("qrbench-render".into())
            .spawn(move || {
                let outcome =
                    guarded_render_and_decode(rasterizer.as_ref(), decoder.as_ref(), &doc, size);
                // The receiver is gone if the item already timed out.
                let _ = tx.send(outcome);
                let finished = worker_state.compare_exchange(
                    JOB_RUNNING,
                    JOB_FINISHED,
                    Ordering::SeqCst,
                    Ordering::SeqCst,
                );
                if finished.is_err() {
                    stalled_workers.fetch_sub(1, Ordering::SeqCst);
                    debug!("stalled render worker finished");
                }
            })
            .map_err(|e| RasterError::Rasterization(format!("failed to start render worker: {e}")))?;

        match rx.recv_timeout(limit) {
            Ok(outcome) => outcome,
            Err(RecvTimeoutError::Timeout) => {
                // Counted before the handoff so the worker never decrements first.
                self.stalled_workers.fetch_add(1, Ordering::SeqCst);
                let abandoned = state.compare_exchange(
                    JOB_RUNNING,
                    JOB_ABANDONED,
                    Ordering::SeqCst,
                    Ordering::SeqCst,
                );
                if abandoned.is_err() {
                    // Finished right at the deadline; its result is already sent.
                    self.stalled_workers.fetch_sub(1, Ordering::SeqCst);
                    return rx.recv().unwrap_or_else(|_| {
                        Err(RasterError::Rasterization(
                            "render worker exited without a result".into(),
                        ))
                    });
                }
                // The worker cannot be interrupted; it finishes in the background
                // and its result is dropped.
                warn!(
                    timeout_ms = limit.as_millis() as u64,
                    stalled = self.stalled_workers(),
                    "render worker exceeded item timeout"
                );
                Err(RasterError::Timeout(limit))
            }
            Err(RecvTimeoutError::Disconnected) => {
                Err(RasterError::Rasterization("render worker exited without a result".into()))
            }
        }
    }
}

fn guarded_render_and_decode(
    rasterizer: &dyn Rasterizer,
    decoder: &dyn QrDecoder,
    doc: &ParsedSvg,
    size: RasterSize,
) -> Result<Vec<DecodedPayload>, RasterError> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let image = rasterizer.rasterize(doc, size)?;
        Ok(decoder.decode(&image))
    }));
    outcome.unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        warn!(
            rasterizer = rasterizer.name(),
            decoder = decoder.name(),
            panic = %message,
            "render pipeline panicked"
        );
        Err(RasterError::Rasterization(format!("renderer panicked: {message}")))
    })
}
