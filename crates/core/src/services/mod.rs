//! Pipeline stages and the services that drive them.
//!
//! Leaves first: `validator` -> `raster` -> `decoder` -> `classifier`, then
//! `metrics` over the resulting verdicts and `runner` to fan items out.

pub mod classifier;
pub mod decoder;
pub mod metrics;
pub mod raster;
pub mod runner;
pub mod validator;
