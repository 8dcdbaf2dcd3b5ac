//! Deep-learning adapter
//!
//! Wraps a scene-text detector/recognizer that reports quadrilaterals and
//! confidences in [0, 1].

use crate::engine::{BoundingBox, EngineId, EngineInput, EngineResult, OcrEngine};
use crate::error::OcrError;
use image::DynamicImage;

/// Detections at or below this confidence (0-1 scale) are discarded
pub const MIN_DETECTION_CONFIDENCE: f32 = 0.3;

/// One detection as reported by the backend
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Corner points, any winding
    pub corners: [(f32, f32); 4],
    pub text: String,
    /// Confidence in [0, 1]
    pub confidence: f32,
}

/// Backend detecting and recognizing text on a color image
pub trait SceneTextBackend: Send + Sync {
    fn detect(&self, image: &DynamicImage) -> anyhow::Result<Vec<Detection>>;
}

pub struct SceneTextAdapter {
    backend: Option<Box<dyn SceneTextBackend>>,
}

impl SceneTextAdapter {
    pub fn new(backend: Box<dyn SceneTextBackend>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    /// Adapter that never calls a backend and always yields an empty result
    pub fn disabled() -> Self {
        Self { backend: None }
    }
}

/// Axis-aligned rectangle enclosing a quadrilateral, as (x, y, width, height)
pub fn enclosing_rect(corners: &[(f32, f32); 4]) -> (i32, i32, u32, u32) {
    let min_x = corners.iter().map(|p| p.0).fold(f32::INFINITY, f32::min);
    let min_y = corners.iter().map(|p| p.1).fold(f32::INFINITY, f32::min);
    let max_x = corners.iter().map(|p| p.0).fold(f32::NEG_INFINITY, f32::max);
    let max_y = corners.iter().map(|p| p.1).fold(f32::NEG_INFINITY, f32::max);

    (
        min_x as i32,
        min_y as i32,
        (max_x - min_x) as u32,
        (max_y - min_y) as u32,
    )
}

fn accept_detections(detections: Vec<Detection>) -> Vec<BoundingBox> {
    detections
        .into_iter()
        .filter(|d| d.confidence > MIN_DETECTION_CONFIDENCE)
        .map(|d| {
            let (x, y, width, height) = enclosing_rect(&d.corners);
            BoundingBox {
                x,
                y,
                width,
                height,
                text: d.text,
                confidence: d.confidence * 100.0,
            }
        })
        .collect()
}

impl OcrEngine for SceneTextAdapter {
    fn id(&self) -> EngineId {
        EngineId::Ocrs
    }

    fn description(&self) -> &'static str {
        "Pure Rust neural OCR engine - reads the raw color capture"
    }

    fn input(&self) -> EngineInput {
        EngineInput::Raw
    }

    fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    fn extract(&self, image: &DynamicImage) -> Result<EngineResult, OcrError> {
        let Some(backend) = &self.backend else {
            return Ok(EngineResult::empty(self.id()));
        };

        let detections = backend.detect(image).map_err(|e| OcrError::EngineFailure {
            engine: self.id(),
            reason: format!("{:#}", e),
        })?;

        let total = detections.len();
        let boxes = accept_detections(detections);
        tracing::debug!("ocrs accepted {} of {} detections", boxes.len(), total);

        Ok(EngineResult::from_boxes(self.id(), boxes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    struct FixedDetections(Vec<Detection>);

    impl SceneTextBackend for FixedDetections {
        fn detect(&self, _image: &DynamicImage) -> anyhow::Result<Vec<Detection>> {
            Ok(self.0.clone())
        }
    }

    fn detection(text: &str, confidence: f32) -> Detection {
        Detection {
            corners: [(10.0, 20.0), (110.0, 20.0), (110.0, 45.0), (10.0, 45.0)],
            text: text.to_string(),
            confidence,
        }
    }

    fn canvas() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::new(8, 8))
    }

    #[test]
    fn test_enclosing_rect_of_rotated_quad() {
        let corners = [(12.7, 30.0), (80.2, 22.4), (84.9, 41.0), (15.0, 49.6)];
        assert_eq!(enclosing_rect(&corners), (12, 22, 72, 27));
    }

    #[test]
    fn test_filters_and_rescales_confidence() {
        let adapter = SceneTextAdapter::new(Box::new(FixedDetections(vec![
            detection("Screen Reader", 0.9),
            detection("smudge", 0.3),
            detection("Model", 0.5),
        ])));

        let result = adapter.extract(&canvas()).unwrap();

        assert_eq!(result.text, "Screen Reader Model");
        assert_eq!(result.bounding_boxes.len(), 2);
        assert!((result.bounding_boxes[0].confidence - 90.0).abs() < 1e-3);
        assert!((result.confidence - 70.0).abs() < 1e-3);
        assert_eq!(
            (
                result.bounding_boxes[0].x,
                result.bounding_boxes[0].y,
                result.bounding_boxes[0].width,
                result.bounding_boxes[0].height
            ),
            (10, 20, 100, 25)
        );
    }

    #[test]
    fn test_rotated_line_gets_enclosing_box() {
        // Line tilted by a few degrees, corners in clockwise order from top-left
        let adapter = SceneTextAdapter::new(Box::new(FixedDetections(vec![Detection {
            corners: [(40.5, 60.0), (240.0, 48.3), (241.8, 74.0), (42.0, 86.9)],
            text: "tilted heading".to_string(),
            confidence: 0.8,
        }])));

        let result = adapter.extract(&canvas()).unwrap();

        let b = &result.bounding_boxes[0];
        assert_eq!((b.x, b.y, b.width, b.height), (40, 48, 201, 38));
        assert_eq!(result.text, "tilted heading");
    }

    #[test]
    fn test_disabled_adapter_returns_empty() {
        let adapter = SceneTextAdapter::disabled();
        let result = adapter.extract(&canvas()).unwrap();
        assert_eq!(result, EngineResult::empty(EngineId::Ocrs));
    }

    #[test]
    fn test_no_detections_is_zero_confidence() {
        let adapter = SceneTextAdapter::new(Box::new(FixedDetections(Vec::new())));
        let result = adapter.extract(&canvas()).unwrap();
        assert_eq!(result.confidence, 0.0);
        assert!(result.text.is_empty());
    }

    #[test]
    fn test_wants_raw_image() {
        assert_eq!(SceneTextAdapter::disabled().input(), EngineInput::Raw);
    }
}
