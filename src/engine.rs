use crate::error::OcrError;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an OCR backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineId {
    /// Token-level structured output (Tesseract)
    Tesseract,
    /// Deep-learning scene text detector/recognizer (ocrs)
    Ocrs,
}

impl EngineId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tesseract => "tesseract",
            Self::Ocrs => "ocrs",
        }
    }
}

impl fmt::Display for EngineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which image an engine wants to see
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineInput {
    /// Binarized output of the preprocessor
    Preprocessed,
    /// The captured color image, untouched
    Raw,
}

/// Axis-aligned text region in image pixel coordinates.
///
/// Confidence is always on the 0-100 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub text: String,
    pub confidence: f32,
}

impl BoundingBox {
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn right(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    pub fn bottom(&self) -> i64 {
        self.y as i64 + self.height as i64
    }
}

/// Normalized output of one engine for one image
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineResult {
    pub text: String,
    pub confidence: f32,
    pub bounding_boxes: Vec<BoundingBox>,
    pub engine: EngineId,
}

impl EngineResult {
    /// Result of an engine that found nothing or did not run
    pub fn empty(engine: EngineId) -> Self {
        Self {
            text: String::new(),
            confidence: 0.0,
            bounding_boxes: Vec::new(),
            engine,
        }
    }

    /// Build a result from accepted boxes, in the engine's native order.
    ///
    /// Text is the box texts joined by single spaces and confidence is the
    /// mean of the box confidences (0 when there are no boxes).
    pub fn from_boxes(engine: EngineId, bounding_boxes: Vec<BoundingBox>) -> Self {
        if bounding_boxes.is_empty() {
            return Self::empty(engine);
        }

        let text = bounding_boxes
            .iter()
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let total: f32 = bounding_boxes.iter().map(|b| b.confidence).sum();
        let confidence = total / bounding_boxes.len() as f32;

        Self {
            text,
            confidence,
            bounding_boxes,
            engine,
        }
    }
}

/// Consensus of two engine results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciledResult {
    pub text: String,
    pub confidence: f32,
    pub bounding_boxes: Vec<BoundingBox>,
    pub primary_engine: EngineId,
    pub secondary_engine: EngineId,
    pub combined: bool,
}

/// Capture rectangle `(x, y, width, height)` in source pixel space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "(i32, i32, u32, u32)")]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

impl From<Region> for (i32, i32, u32, u32) {
    fn from(r: Region) -> Self {
        (r.x, r.y, r.width, r.height)
    }
}

impl std::str::FromStr for Region {
    type Err = String;

    /// Parse `x,y,width,height`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(format!("expected x,y,width,height but got '{}'", s));
        }
        let x = parts[0].parse().map_err(|e| format!("invalid x: {}", e))?;
        let y = parts[1].parse().map_err(|e| format!("invalid y: {}", e))?;
        let width = parts[2].parse().map_err(|e| format!("invalid width: {}", e))?;
        let height = parts[3].parse().map_err(|e| format!("invalid height: {}", e))?;
        Ok(Self::new(x, y, width, height))
    }
}

/// Trait that all OCR engine adapters must implement
pub trait OcrEngine: Send + Sync {
    /// Returns the engine identifier
    fn id(&self) -> EngineId;

    /// Returns a human-readable description of the engine
    fn description(&self) -> &'static str;

    /// Which image the orchestrator must hand to `extract`
    fn input(&self) -> EngineInput;

    /// Whether the backend is configured and loaded
    fn is_enabled(&self) -> bool;

    /// Run the backend on an image and normalize its output.
    ///
    /// A disabled adapter returns `EngineResult::empty` without touching the
    /// backend.
    fn extract(&self, image: &DynamicImage) -> Result<EngineResult, OcrError>;
}
