use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use screen_reader::capture::{CaptureSource, StaticImageSource};
use screen_reader::engine::{EngineId, OcrEngine};
use screen_reader::engines::scene::{Detection, SceneTextAdapter, SceneTextBackend};
use screen_reader::engines::structured::{StructuredAdapter, Token, TokenBackend};
use screen_reader::engines::EngineRegistry;
use screen_reader::reconcile::iou;
use screen_reader::{OcrError, Pipeline, ReadOutcome, ScreenReader};
use std::io::Cursor;

/// Bounds of the pixels darker than mid-gray, as (x, y, width, height)
fn ink_bounds(image: &DynamicImage) -> Option<(u32, u32, u32, u32)> {
    let gray = image.to_luma8();
    let mut bounds: Option<(u32, u32, u32, u32)> = None;

    for (x, y, pixel) in gray.enumerate_pixels() {
        if pixel.0[0] >= 128 {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }

    bounds.map(|(x0, y0, x1, y1)| (x0, y0, x1 - x0 + 1, y1 - y0 + 1))
}

/// Tesseract stand-in: reports the ink on the binarized image as one word
struct InkTokens;

impl TokenBackend for InkTokens {
    fn recognize_tokens(&self, image: &DynamicImage) -> anyhow::Result<Vec<Token>> {
        Ok(ink_bounds(image)
            .map(|(left, top, width, height)| Token {
                left: left as i32,
                top: top as i32,
                width,
                height,
                conf: 85,
                text: "BLOCK".to_string(),
            })
            .into_iter()
            .collect())
    }
}

/// ocrs stand-in: reports the ink on the color image as one line
struct InkDetections;

impl SceneTextBackend for InkDetections {
    fn detect(&self, image: &DynamicImage) -> anyhow::Result<Vec<Detection>> {
        Ok(ink_bounds(image)
            .map(|(x, y, w, h)| {
                let (left, top) = (x as f32, y as f32);
                let (right, bottom) = (left + w as f32, top + h as f32);
                Detection {
                    corners: [(left, top), (right, top), (right, bottom), (left, bottom)],
                    text: "BL0CK".to_string(),
                    confidence: 0.6,
                }
            })
            .into_iter()
            .collect())
    }
}

struct BrokenModel;

impl SceneTextBackend for BrokenModel {
    fn detect(&self, _image: &DynamicImage) -> anyhow::Result<Vec<Detection>> {
        anyhow::bail!("tensor shape mismatch")
    }
}

fn white_screen() -> RgbImage {
    RgbImage::from_pixel(160, 90, Rgb([255, 255, 255]))
}

fn screen_with_block() -> RgbImage {
    let mut img = white_screen();
    for y in 30..50 {
        for x in 40..100 {
            img.put_pixel(x, y, Rgb([20, 20, 20]));
        }
    }
    img
}

fn both_engines() -> Vec<Box<dyn OcrEngine>> {
    vec![
        Box::new(StructuredAdapter::new(Box::new(InkTokens))),
        Box::new(SceneTextAdapter::new(Box::new(InkDetections))),
    ]
}

fn reader_for(image: RgbImage, engines: Vec<Box<dyn OcrEngine>>) -> ScreenReader {
    ScreenReader::new(
        Box::new(StaticImageSource::new(DynamicImage::ImageRgb8(image))),
        Pipeline::new(EngineRegistry::from_engines(engines)),
    )
}

#[test]
fn test_blank_screen_reads_as_empty_text() {
    let reader = reader_for(white_screen(), both_engines());

    let result = reader.read_screen(None).unwrap();

    match &result.outcome {
        ReadOutcome::Combined(r) => {
            assert!(r.text.is_empty());
            assert_eq!(r.confidence, 0.0);
            assert!(r.bounding_boxes.is_empty());
            assert!(r.combined);
        }
        other => panic!("expected combined result, got {:?}", other),
    }
    assert_eq!(result.image_shape, [90, 160, 3]);
}

#[test]
fn test_block_is_found_once_by_both_engines() {
    let reader = reader_for(screen_with_block(), both_engines());

    let result = reader.read_screen(None).unwrap();

    let ReadOutcome::Combined(merged) = &result.outcome else {
        panic!("expected combined result, got {:?}", result.outcome);
    };

    // Tesseract stand-in is more confident (85 vs 60)
    assert_eq!(merged.primary_engine, EngineId::Tesseract);
    assert_eq!(merged.secondary_engine, EngineId::Ocrs);
    assert_eq!(merged.text, "BLOCK");
    assert_eq!(merged.confidence, 85.0);

    // Binarization only keeps the block's edges, which still span the block
    assert_eq!(merged.bounding_boxes.len(), 1);
    let kept = &merged.bounding_boxes[0];
    assert_eq!(kept.text, "BLOCK");

    let truth = screen_reader::BoundingBox {
        x: 40,
        y: 30,
        width: 60,
        height: 20,
        text: String::new(),
        confidence: 0.0,
    };
    assert!(iou(kept, &truth) > 0.7, "box {:?} drifted from the block", kept);
}

#[test]
fn test_region_crop_excludes_block() {
    let reader = reader_for(screen_with_block(), both_engines());

    let result = reader.read_region(0, 60, 160, 30).unwrap();

    assert_eq!(result.outcome.text(), "");
    assert_eq!(result.image_shape, [30, 160, 3]);
    assert_eq!(
        result.region,
        Some(screen_reader::Region::new(0, 60, 160, 30))
    );
}

#[test]
fn test_region_off_screen_fails_in_preprocessing() {
    let reader = reader_for(screen_with_block(), both_engines());

    let err = reader.read_region(500, 500, 40, 40).unwrap_err();

    assert!(matches!(err, OcrError::Preprocessing(_)));
    assert_eq!(err.stage(), "preprocessing");
}

#[test]
fn test_upload_matches_screen_read_of_same_image() {
    let image = screen_with_block();
    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .unwrap();

    let reader = reader_for(image, both_engines());
    let from_screen = reader.read_screen(None).unwrap();
    let from_upload = reader.read_upload(&png).unwrap();

    assert_eq!(from_upload.source, CaptureSource::Upload);
    assert_eq!(from_screen.source, CaptureSource::Screen);
    assert_eq!(from_upload.outcome, from_screen.outcome);
    assert!(from_upload.region.is_none());
}

#[test]
fn test_engine_failure_names_engine_and_stage() {
    let reader = reader_for(
        screen_with_block(),
        vec![
            Box::new(StructuredAdapter::new(Box::new(InkTokens))),
            Box::new(SceneTextAdapter::new(Box::new(BrokenModel))),
        ],
    );

    let err = reader.read_screen(None).unwrap_err();

    assert!(matches!(err, OcrError::EngineFailure { engine: EngineId::Ocrs, .. }));
    assert_eq!(err.stage(), "extracting");
    assert!(err.to_string().contains("tensor shape mismatch"));
}

#[test]
fn test_upload_decode_error_is_not_masked() {
    let reader = reader_for(white_screen(), both_engines());

    let err = reader.read_upload(b"GIF89a but not really").unwrap_err();
    assert!(matches!(err, OcrError::Decode(_)));
    assert_eq!(err.stage(), "capturing");
}

#[test]
fn test_combined_result_json_shape() {
    let reader = reader_for(screen_with_block(), both_engines());
    let result = reader.read_region(10, 10, 120, 60).unwrap();

    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["primary_engine"], "tesseract");
    assert_eq!(json["secondary_engine"], "ocrs");
    assert_eq!(json["combined"], true);
    assert_eq!(json["region"], serde_json::json!([10, 10, 120, 60]));
    assert_eq!(json["image_shape"], serde_json::json!([60, 120, 3]));
    assert_eq!(json["source"], "screen");
    assert!(json["bounding_boxes"][0]["confidence"].as_f64().unwrap() > 30.0);
    assert!(json.get("outcome").is_none());
}

#[test]
fn test_single_engine_result_has_engine_field() {
    let reader = reader_for(
        screen_with_block(),
        vec![
            Box::new(StructuredAdapter::disabled()),
            Box::new(SceneTextAdapter::new(Box::new(InkDetections))),
        ],
    );

    let result = reader.read_screen(None).unwrap();
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["engine"], "ocrs");
    assert_eq!(json["text"], "BL0CK");
    assert!(json.get("combined").is_none());
    // Raw color input, so the box is the block itself
    let bbox = &result.outcome.bounding_boxes()[0];
    assert_eq!((bbox.x, bbox.y, bbox.width, bbox.height), (40, 30, 60, 20));
}
