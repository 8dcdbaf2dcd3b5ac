//! Screen text reading with multiple OCR engines
//!
//! A captured (or uploaded) image goes through preprocessing, one or two OCR
//! engine adapters, and a reconciler that merges their results into one.

pub mod capture;
pub mod cli;
pub mod config;
pub mod engine;
pub mod engines;
pub mod error;
pub mod pipeline;
pub mod preprocessing;
pub mod reconcile;
pub mod server;

pub use engine::{BoundingBox, EngineId, EngineResult, ReconciledResult, Region};
pub use error::OcrError;
pub use pipeline::{CaptureResult, Pipeline, ReadOutcome, ScreenReader};
