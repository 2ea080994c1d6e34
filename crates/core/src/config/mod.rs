//! Evaluation configuration.
//!
//! Every field has a default, so an empty YAML/JSON file (or no file at all)
//! yields the reference setup: permissive extraction, 512x512 rendering with
//! a 16 px white margin, and a 10 s per-item budget.

use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::services::classifier::{
    OutcomeClassifier, DEFAULT_ITEM_TIMEOUT, DEFAULT_MAX_STALLED_WORKERS,
};
use crate::services::raster::{RasterSize, ResvgRasterizer, DEFAULT_MARGIN, DEFAULT_RASTER_SIZE};
use crate::services::validator::ExtractionPolicy;

fn default_raster_edge() -> u32 {
    DEFAULT_RASTER_SIZE
}

fn default_margin() -> u32 {
    DEFAULT_MARGIN
}

fn default_timeout_ms() -> Option<u64> {
    Some(DEFAULT_ITEM_TIMEOUT.as_millis() as u64)
}

fn default_max_stalled_workers() -> usize {
    DEFAULT_MAX_STALLED_WORKERS
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalConfig {
    #[serde(default)]
    pub extraction: ExtractionPolicy,
    #[serde(default = "default_raster_edge")]
    pub raster_width: u32,
    #[serde(default = "default_raster_edge")]
    pub raster_height: u32,
    /// White border around the rendered document, in pixels.
    #[serde(default = "default_margin")]
    pub margin: u32,
    /// Per-item rasterize + decode budget; `null` disables the timeout.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: Option<u64>,
    /// Timed-out renders still running before new items fail fast.
    #[serde(default = "default_max_stalled_workers")]
    pub max_stalled_workers: usize,
    /// Worker threads; `null` uses every available core.
    #[serde(default)]
    pub workers: Option<usize>,
    /// Save the extracted SVG of each valid item next to the report.
    #[serde(default = "default_true")]
    pub save_svgs: bool,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            extraction: ExtractionPolicy::default(),
            raster_width: DEFAULT_RASTER_SIZE,
            raster_height: DEFAULT_RASTER_SIZE,
            margin: DEFAULT_MARGIN,
            timeout_ms: default_timeout_ms(),
            max_stalled_workers: DEFAULT_MAX_STALLED_WORKERS,
            workers: None,
            save_svgs: true,
        }
    }
}

impl EvalConfig {
    pub fn validate(&self) -> Result<()> {
        if self.raster_width == 0 || self.raster_height == 0 {
            return Err(anyhow!(
                "Raster size must be positive (got {}x{})",
                self.raster_width,
                self.raster_height
            ));
        }
        if self.workers == Some(0) {
            return Err(anyhow!("'workers' must be at least 1 when set"));
        }
        if self.max_stalled_workers == 0 {
            return Err(anyhow!("'max_stalled_workers' must be at least 1"));
        }
        if self.timeout_ms == Some(0) {
            return Err(anyhow!("'timeout_ms' must be positive; use null to disable it"));
        }
        Ok(())
    }

    pub fn raster_size(&self) -> RasterSize {
        RasterSize::new(self.raster_width, self.raster_height)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Build a classifier wired with the default backends and these settings.
    pub fn classifier(&self) -> OutcomeClassifier {
        let rasterizer = ResvgRasterizer::new().with_margin(self.margin);
        OutcomeClassifier::new(self.extraction)
            .with_rasterizer(std::sync::Arc::new(rasterizer))
            .with_raster_size(self.raster_size())
            .with_timeout(self.timeout())
            .with_max_stalled_workers(self.max_stalled_workers)
    }
}

/// Load an `EvalConfig` from YAML or JSON (chosen by extension) and validate it.
pub fn load_eval_config(path: &Path) -> Result<EvalConfig> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read eval config at {}", path.display()))?;
    let config: EvalConfig = if path.extension().and_then(|e| e.to_str()) == Some("json") {
        serde_json::from_slice(&bytes).context("Failed to parse eval config JSON")?
    } else if bytes.iter().all(u8::is_ascii_whitespace) {
        EvalConfig::default()
    } else {
        serde_yaml::from_slice(&bytes).context("Failed to parse eval config YAML")?
    };
    config.validate()?;
    Ok(config)
}
