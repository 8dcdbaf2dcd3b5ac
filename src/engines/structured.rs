//! Structured-output adapter
//!
//! Wraps a token-level OCR backend (one record per word with a box and an
//! integer confidence) into an `EngineResult`.

use crate::engine::{BoundingBox, EngineId, EngineInput, EngineResult, OcrEngine};
use crate::error::OcrError;
use image::DynamicImage;

/// Tokens at or below this confidence (0-100) are discarded
pub const MIN_TOKEN_CONFIDENCE: i32 = 30;

/// One token as reported by the backend
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
    /// Integer confidence 0-100, negative for non-word rows
    pub conf: i32,
    pub text: String,
}

/// Backend producing word-level tokens in reading order
pub trait TokenBackend: Send + Sync {
    fn recognize_tokens(&self, image: &DynamicImage) -> anyhow::Result<Vec<Token>>;
}

pub struct StructuredAdapter {
    backend: Option<Box<dyn TokenBackend>>,
}

impl StructuredAdapter {
    pub fn new(backend: Box<dyn TokenBackend>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    /// Adapter that never calls a backend and always yields an empty result
    pub fn disabled() -> Self {
        Self { backend: None }
    }
}

/// Keep confident, non-blank tokens in backend order
fn accept_tokens(tokens: Vec<Token>) -> Vec<BoundingBox> {
    tokens
        .into_iter()
        .filter(|t| t.conf > MIN_TOKEN_CONFIDENCE)
        .filter_map(|t| {
            let text = t.text.trim();
            if text.is_empty() {
                return None;
            }
            Some(BoundingBox {
                x: t.left,
                y: t.top,
                width: t.width,
                height: t.height,
                text: text.to_string(),
                confidence: t.conf as f32,
            })
        })
        .collect()
}

impl OcrEngine for StructuredAdapter {
    fn id(&self) -> EngineId {
        EngineId::Tesseract
    }

    fn description(&self) -> &'static str {
        "Tesseract OCR engine - word-level boxes on the binarized capture"
    }

    fn input(&self) -> EngineInput {
        EngineInput::Preprocessed
    }

    fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    fn extract(&self, image: &DynamicImage) -> Result<EngineResult, OcrError> {
        let Some(backend) = &self.backend else {
            return Ok(EngineResult::empty(self.id()));
        };

        let tokens = backend
            .recognize_tokens(image)
            .map_err(|e| OcrError::EngineFailure {
                engine: self.id(),
                reason: format!("{:#}", e),
            })?;

        let total = tokens.len();
        let boxes = accept_tokens(tokens);
        tracing::debug!("tesseract accepted {} of {} tokens", boxes.len(), total);

        Ok(EngineResult::from_boxes(self.id(), boxes))
    }
}
