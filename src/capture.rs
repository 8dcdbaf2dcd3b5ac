//! Image acquisition
//!
//! Live screen capture never fails: any problem is logged and a fallback image
//! is substituted. Uploaded bytes, on the other hand, are user input and a
//! decode failure is reported to the caller.

use crate::engine::Region;
use crate::error::OcrError;
use ab_glyph::{FontVec, PxScale};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_text_mut;
use serde::Serialize;
use std::path::Path;
use std::process::Command;
use std::sync::OnceLock;

/// Size of the substitute image used when the screen cannot be captured
pub const FALLBACK_WIDTH: u32 = 800;
pub const FALLBACK_HEIGHT: u32 = 400;

/// Lines drawn on the fallback image: (text, baseline y, pixel height)
pub const FALLBACK_LINES: [(&str, i32, f32); 5] = [
    ("Screen Reading Computer Vision Model", 50, 38.0),
    ("This is a test image for OCR testing", 100, 26.0),
    ("The quick brown fox jumps over the lazy dog", 150, 20.0),
    ("1234567890 !@#$%^&*()", 200, 17.0),
    ("Testing different font sizes and styles", 250, 23.0),
];

/// Regular sans fonts shipped by common desktop installs
const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Where the pipeline's input image came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureSource {
    Screen,
    /// Capture failed and the fallback image was used instead
    Fallback,
    Upload,
}

#[derive(Debug, Clone)]
pub struct CapturedImage {
    pub image: DynamicImage,
    pub source: CaptureSource,
}

impl CapturedImage {
    pub fn fallback() -> Self {
        Self {
            image: fallback_image(),
            source: CaptureSource::Fallback,
        }
    }
}

/// Supplies raw images of the screen, or of a region of it
pub trait ScreenSource: Send + Sync {
    fn capture(&self, region: Option<Region>) -> CapturedImage;
}

/// First loadable font from `FONT_CANDIDATES`, looked up once per process
pub fn sample_font() -> Option<&'static FontVec> {
    static FONT: OnceLock<Option<FontVec>> = OnceLock::new();
    FONT.get_or_init(|| {
        let font = FONT_CANDIDATES.iter().find_map(|path| {
            let data = std::fs::read(path).ok()?;
            let font = FontVec::try_from_vec(data).ok()?;
            tracing::debug!("Loaded fallback font from {}", path);
            Some(font)
        });
        if font.is_none() {
            tracing::warn!("No system font found; fallback image will be blank");
        }
        font
    })
    .as_ref()
}

/// White RGB canvas with `FALLBACK_LINES` in black.
///
/// Without a usable system font the canvas stays blank.
pub fn fallback_image() -> DynamicImage {
    let mut img = RgbImage::from_pixel(FALLBACK_WIDTH, FALLBACK_HEIGHT, Rgb([255, 255, 255]));

    if let Some(font) = sample_font() {
        let black = Rgb([0, 0, 0]);
        for (text, baseline, height) in FALLBACK_LINES {
            let scale = PxScale::from(height);
            let top = baseline - (height * 0.8) as i32;
            // Two passes one pixel apart for a heavier stroke
            draw_text_mut(&mut img, black, 20, top, scale, font, text);
            draw_text_mut(&mut img, black, 21, top, scale, font, text);
        }
    }

    DynamicImage::ImageRgb8(img)
}

/// Screen capture through the `scrot` command-line utility
#[derive(Debug, Clone)]
pub struct ScrotCapture {
    program: String,
}

impl Default for ScrotCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl ScrotCapture {
    pub fn new() -> Self {
        Self::with_program("scrot")
    }

    /// Use a different scrot-compatible executable
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn try_capture(&self, region: Option<Region>) -> Result<DynamicImage, OcrError> {
        let dir = tempfile::Builder::new()
            .prefix("screen-reader-")
            .tempdir()
            .map_err(|e| OcrError::Capture(format!("Failed to create temp dir: {}", e)))?;
        let path = dir.path().join("capture.png");

        let mut cmd = Command::new(&self.program);
        if let Some(r) = region {
            cmd.arg("-a")
                .arg(format!("{},{},{},{}", r.x, r.y, r.width, r.height));
        }
        cmd.arg(&path);

        tracing::debug!("Running {:?}", cmd);
        let output = cmd
            .output()
            .map_err(|e| OcrError::Capture(format!("Failed to run {}: {}", self.program, e)))?;

        if !output.status.success() {
            return Err(OcrError::Capture(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        load_capture(&path)
    }
}

fn load_capture(path: &Path) -> Result<DynamicImage, OcrError> {
    image::open(path).map_err(|e| OcrError::Capture(format!("Could not load screenshot: {}", e)))
}

impl ScreenSource for ScrotCapture {
    fn capture(&self, region: Option<Region>) -> CapturedImage {
        match self.try_capture(region) {
            Ok(image) => CapturedImage {
                image,
                source: CaptureSource::Screen,
            },
            Err(e) => {
                tracing::warn!("{}; using fallback image", e);
                CapturedImage::fallback()
            }
        }
    }
}

/// Serves a fixed image, cropped to the requested region
#[derive(Debug, Clone)]
pub struct StaticImageSource {
    image: DynamicImage,
}

impl StaticImageSource {
    pub fn new(image: DynamicImage) -> Self {
        Self { image }
    }
}

impl ScreenSource for StaticImageSource {
    fn capture(&self, region: Option<Region>) -> CapturedImage {
        let image = match region {
            Some(r) => self.image.crop_imm(
                r.x.max(0) as u32,
                r.y.max(0) as u32,
                r.width,
                r.height,
            ),
            None => self.image.clone(),
        };
        CapturedImage {
            image,
            source: CaptureSource::Screen,
        }
    }
}

/// Decode an uploaded image file
pub fn decode_upload(bytes: &[u8]) -> Result<DynamicImage, OcrError> {
    if bytes.is_empty() {
        return Err(OcrError::Decode("uploaded file is empty".to_string()));
    }
    image::load_from_memory(bytes).map_err(|e| OcrError::Decode(e.to_string()))
}
