use crate::error::OcrError;
use image::DynamicImage;
use serde::Serialize;
use std::time::Instant;

use super::steps;

/// Timing information for a single preprocessing step
#[derive(Debug, Clone, Serialize)]
pub struct StepTiming {
    pub name: String,
    pub time_ms: u64,
}

/// Result of preprocessing including timing stats
#[derive(Debug, Clone, Serialize)]
pub struct PreprocessingResult {
    /// Preprocessed image (not serialized)
    #[serde(skip)]
    pub image: DynamicImage,
    /// Total preprocessing time in milliseconds
    pub total_time_ms: u64,
    /// Individual step timings
    pub steps: Vec<StepTiming>,
}

/// Fixed preprocessing sequence for screen captures.
///
/// Steps, in order: grayscale, 3x3 Gaussian blur, adaptive mean threshold,
/// morphological close. The function is pure: the same input always yields
/// the same output.
#[derive(Debug, Clone, Copy, Default)]
pub struct Preprocessor;

impl Preprocessor {
    pub fn new() -> Self {
        Self
    }

    /// Process an image, leaving the caller's copy untouched.
    ///
    /// An image with no pixels (e.g. a region entirely off-screen) is rejected.
    pub fn process(&self, image: &DynamicImage) -> Result<PreprocessingResult, OcrError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(OcrError::Preprocessing(format!(
                "image has no pixels ({}x{})",
                image.width(),
                image.height()
            )));
        }

        let start = Instant::now();
        let mut steps_timing = Vec::new();

        let mut img = image.clone();
        img = self.run_step("grayscale", img, &mut steps_timing, steps::grayscale::apply)?;
        img = self.run_step("blur", img, &mut steps_timing, steps::blur::apply)?;
        img = self.run_step("threshold", img, &mut steps_timing, steps::threshold::apply)?;
        img = self.run_step("close", img, &mut steps_timing, steps::close::apply)?;

        Ok(PreprocessingResult {
            image: img,
            total_time_ms: start.elapsed().as_millis() as u64,
            steps: steps_timing,
        })
    }

    fn run_step<F>(
        &self,
        name: &str,
        img: DynamicImage,
        timings: &mut Vec<StepTiming>,
        step_fn: F,
    ) -> Result<DynamicImage, OcrError>
    where
        F: FnOnce(DynamicImage) -> Result<DynamicImage, OcrError>,
    {
        let step_start = Instant::now();
        let result = step_fn(img)?;
        timings.push(StepTiming {
            name: name.to_string(),
            time_ms: step_start.elapsed().as_millis() as u64,
        });
        Ok(result)
    }
}
