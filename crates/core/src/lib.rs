//! qrbench-core
//!
//! Verification pipeline for benchmarks that ask a text-generation model to emit
//! an SVG image containing a QR code for a given string.
//!
//! Each (target text, model output) pair flows through validation, rasterization,
//! QR decoding, and an exact comparison; the resulting verdicts are folded into
//! corpus-level metrics. No stage ever aborts a run: a bad model output only
//! lowers that item's score.
//!
//! All substantive logic lives here so frontends (the `qrbench` CLI, or any other
//! harness that already holds model outputs) stay thin.

pub mod config;
pub mod model;
pub mod report;
pub mod services;

/// Returns the library version as encoded at compile time.
///
/// Useful for tests and for frontends to report consistent version info.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
