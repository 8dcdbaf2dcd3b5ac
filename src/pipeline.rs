//! Capture-to-result orchestration
//!
//! One request runs synchronously through
//! `Capturing -> Preprocessing -> Extracting -> Reconciling -> Done`.
//! Engines run one after another in registry order (structured-output first).

use crate::capture::{decode_upload, CaptureSource, CapturedImage, ScreenSource, ScrotCapture};
use crate::config::{Config, EngineConfig};
use crate::engine::{BoundingBox, EngineInput, EngineResult, ReconciledResult, Region};
use crate::engines::EngineRegistry;
use crate::error::OcrError;
use crate::preprocessing::Preprocessor;
use crate::reconcile::reconcile;
use image::DynamicImage;
use serde::Serialize;
use std::fmt;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Capturing,
    Preprocessing,
    Extracting,
    Reconciling,
    Done,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Capturing => "capturing",
            Self::Preprocessing => "preprocessing",
            Self::Extracting => "extracting",
            Self::Reconciling => "reconciling",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result when no engine ran
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EmptyResult {
    pub text: String,
    pub confidence: f32,
    pub bounding_boxes: Vec<BoundingBox>,
}

/// Outcome of running the enabled engines on one image
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReadOutcome {
    Empty(EmptyResult),
    Single(EngineResult),
    Combined(ReconciledResult),
}

impl ReadOutcome {
    pub fn text(&self) -> &str {
        match self {
            Self::Empty(r) => &r.text,
            Self::Single(r) => &r.text,
            Self::Combined(r) => &r.text,
        }
    }

    pub fn confidence(&self) -> f32 {
        match self {
            Self::Empty(r) => r.confidence,
            Self::Single(r) => r.confidence,
            Self::Combined(r) => r.confidence,
        }
    }

    pub fn bounding_boxes(&self) -> &[BoundingBox] {
        match self {
            Self::Empty(r) => &r.bounding_boxes,
            Self::Single(r) => &r.bounding_boxes,
            Self::Combined(r) => &r.bounding_boxes,
        }
    }
}

/// Final payload handed to callers
#[derive(Debug, Clone, Serialize)]
pub struct CaptureResult {
    #[serde(flatten)]
    pub outcome: ReadOutcome,
    /// Wall-clock seconds from capture start to reconciliation end
    pub processing_time: f64,
    /// `[height, width, channels]` of the raw image
    pub image_shape: [u32; 3],
    pub region: Option<Region>,
    /// Capture start, seconds since the Unix epoch
    pub timestamp: f64,
    pub source: CaptureSource,
}

/// Preprocessing, extraction and reconciliation for already-acquired images
pub struct Pipeline {
    preprocessor: Preprocessor,
    registry: EngineRegistry,
}

impl Pipeline {
    pub fn new(registry: EngineRegistry) -> Self {
        Self {
            preprocessor: Preprocessor::new(),
            registry,
        }
    }

    pub fn registry(&self) -> &EngineRegistry {
        &self.registry
    }

    /// Run every enabled engine on `raw` and merge the results
    pub fn read_image(&self, raw: &DynamicImage) -> Result<ReadOutcome, OcrError> {
        enter(Stage::Preprocessing);
        let preprocessed = self.preprocessor.process(raw)?;
        tracing::debug!(
            "Preprocessed {}x{} image in {}ms",
            raw.width(),
            raw.height(),
            preprocessed.total_time_ms
        );

        enter(Stage::Extracting);
        let mut results = Vec::new();
        for engine in self.registry.engines().iter().filter(|e| e.is_enabled()) {
            let input = match engine.input() {
                EngineInput::Preprocessed => &preprocessed.image,
                EngineInput::Raw => raw,
            };
            tracing::info!("Extracting text with {}...", engine.id());
            results.push(engine.extract(input)?);
        }

        let outcome = match results.as_slice() {
            [] => ReadOutcome::Empty(EmptyResult::default()),
            [only] => ReadOutcome::Single(only.clone()),
            [first, second] => {
                enter(Stage::Reconciling);
                ReadOutcome::Combined(reconcile(first, second))
            }
            more => {
                return Err(OcrError::Internal(format!(
                    "reconciliation supports two engines, {} ran",
                    more.len()
                )))
            }
        };

        enter(Stage::Done);
        Ok(outcome)
    }
}

fn enter(stage: Stage) {
    tracing::debug!(stage = stage.as_str(), "pipeline stage");
}

fn epoch_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

/// Screen reader: acquisition plus the OCR pipeline.
///
/// Holds no per-request state; engines are built once at construction. To
/// change engines, build a new reader.
pub struct ScreenReader {
    source: Box<dyn ScreenSource>,
    pipeline: Pipeline,
}

impl ScreenReader {
    pub fn new(source: Box<dyn ScreenSource>, pipeline: Pipeline) -> Self {
        Self { source, pipeline }
    }

    /// Live-screen reader with engines built from `requested`
    pub fn with_engines(requested: &EngineConfig, config: &Config) -> Self {
        let registry = EngineRegistry::new(requested, config);
        Self::new(Box::new(ScrotCapture::new()), Pipeline::new(registry))
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Capture and read the screen, or one region of it
    pub fn read_screen(&self, region: Option<Region>) -> Result<CaptureResult, OcrError> {
        let start = Instant::now();
        let timestamp = epoch_seconds();

        enter(Stage::Capturing);
        let captured = self.source.capture(region);
        self.finish(start, timestamp, captured, region)
    }

    pub fn read_region(
        &self,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    ) -> Result<CaptureResult, OcrError> {
        self.read_screen(Some(Region::new(x, y, width, height)))
    }

    /// Read an uploaded image file. Undecodable bytes are an error.
    pub fn read_upload(&self, bytes: &[u8]) -> Result<CaptureResult, OcrError> {
        let start = Instant::now();
        let timestamp = epoch_seconds();

        enter(Stage::Capturing);
        let image = decode_upload(bytes)?;
        let captured = CapturedImage {
            image,
            source: CaptureSource::Upload,
        };
        self.finish(start, timestamp, captured, None)
    }

    fn finish(
        &self,
        start: Instant,
        timestamp: f64,
        captured: CapturedImage,
        region: Option<Region>,
    ) -> Result<CaptureResult, OcrError> {
        let image = &captured.image;
        let image_shape = [
            image.height(),
            image.width(),
            image.color().channel_count() as u32,
        ];

        let outcome = self.pipeline.read_image(image)?;
        let processing_time = start.elapsed().as_secs_f64();

        tracing::info!(
            "Screen reading completed in {:.2}s, confidence: {:.2}, text length: {}",
            processing_time,
            outcome.confidence(),
            outcome.text().len()
        );

        Ok(CaptureResult {
            outcome,
            processing_time,
            image_shape,
            region,
            timestamp,
            source: captured.source,
        })
    }
}
