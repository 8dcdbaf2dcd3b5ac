//! Image preprocessing for the structured-output engine
//!
//! Turns a captured screen image into a clean binary image: grayscale,
//! smoothing, local-mean thresholding and a morphological close.

pub mod pipeline;
pub mod steps;

pub use pipeline::{PreprocessingResult, Preprocessor, StepTiming};
