//! Tesseract backend
//!
//! Runs Tesseract (statically linked through tesseract-static) in single
//! uniform block mode and reads its word-level TSV report. Downloads tessdata
//! (training data) automatically on first use unless a path is configured.

use super::structured::Token;

/// Page segmentation mode 6: assume a single uniform block of text
#[cfg_attr(not(feature = "engine-tesseract"), allow(dead_code))]
const PAGE_SEG_MODE: &str = "6";

/// Parse Tesseract's TSV output into tokens.
///
/// Columns: level, page, block, paragraph, line, word, left, top, width,
/// height, conf, text. A header row, if present, is skipped, as are rows
/// that do not have the expected shape. Fractional confidences are truncated.
pub fn parse_tsv(tsv: &str) -> Vec<Token> {
    tsv.lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.splitn(12, '\t').collect();
            if fields.len() < 11 {
                return None;
            }
            // Header row or garbage
            fields[0].parse::<u32>().ok()?;

            let left = fields[6].trim().parse::<i32>().ok()?;
            let top = fields[7].trim().parse::<i32>().ok()?;
            let width = fields[8].trim().parse::<u32>().ok()?;
            let height = fields[9].trim().parse::<u32>().ok()?;
            let conf = fields[10].trim().parse::<f32>().ok()? as i32;
            let text = fields.get(11).copied().unwrap_or_default().to_string();

            Some(Token {
                left,
                top,
                width,
                height,
                conf,
                text,
            })
        })
        .collect()
}

#[cfg(feature = "engine-tesseract")]
pub use backend::TesseractBackend;

#[cfg(feature = "engine-tesseract")]
mod backend {
    use super::{parse_tsv, PAGE_SEG_MODE};
    use crate::config::Config;
    use crate::engine::EngineId;
    use crate::engines::download;
    use crate::engines::structured::{Token, TokenBackend};
    use crate::error::OcrError;
    use anyhow::Context;
    use image::DynamicImage;
    use tesseract_static::tesseract::Tesseract;

    /// Tesseract OCR backend
    pub struct TesseractBackend {
        /// Path to tessdata directory
        tessdata_path: String,
        /// Language for OCR
        language: String,
    }

    impl TesseractBackend {
        /// Create a new Tesseract backend, fetching traineddata if needed
        pub fn new(config: &Config) -> Result<Self, OcrError> {
            let language = config.language.clone();

            let tessdata_path = match &config.tessdata_path {
                Some(path) => path.clone(),
                None => ensure_tessdata_available(&language)?,
            };

            // Validate that tessdata is accessible by doing a test initialization
            let test_tess = Tesseract::new(Some(&tessdata_path), Some(&language)).map_err(|e| {
                OcrError::EngineUnavailable {
                    engine: EngineId::Tesseract,
                    reason: format!("Failed to initialize Tesseract: {}", e),
                }
            })?;
            drop(test_tess);

            tracing::info!(
                "Tesseract engine initialized (tessdata: {}, language: {})",
                tessdata_path,
                language
            );

            Ok(Self {
                tessdata_path,
                language,
            })
        }
    }

    impl TokenBackend for TesseractBackend {
        fn recognize_tokens(&self, image: &DynamicImage) -> anyhow::Result<Vec<Token>> {
            // Convert to RGB8 BMP in memory (BMP is always supported by leptonica)
            let rgb_img = image.to_rgb8();
            let (width, height) = rgb_img.dimensions();
            let mut bmp_data = Vec::new();
            rgb_img
                .write_to(&mut std::io::Cursor::new(&mut bmp_data), image::ImageFormat::Bmp)
                .context("Failed to convert to BMP")?;

            tracing::debug!(
                "Running tesseract on {}x{} image ({} bytes)",
                width,
                height,
                bmp_data.len()
            );

            let mut tess = Tesseract::new(Some(&self.tessdata_path), Some(&self.language))
                .context("Failed to create Tesseract")?
                .set_variable("tessedit_pageseg_mode", PAGE_SEG_MODE)
                .context("Failed to set page segmentation mode")?
                .set_image_from_mem(&bmp_data)
                .with_context(|| format!("Failed to set image ({}x{})", width, height))?
                .recognize()
                .context("Failed to recognize text")?;

            let tsv = tess.get_tsv_text(0).context("Failed to read TSV output")?;
            Ok(parse_tsv(&tsv))
        }
    }

    /// Ensure tessdata is available, downloading if needed
    fn ensure_tessdata_available(language: &str) -> Result<String, OcrError> {
        let url = format!(
            "https://github.com/tesseract-ocr/tessdata_fast/raw/main/{}.traineddata",
            language
        );
        let file = download::ensure_cached(&url, "tessdata", &format!("{}.traineddata", language))
            .map_err(|reason| OcrError::EngineUnavailable {
                engine: EngineId::Tesseract,
                reason,
            })?;

        // Tesseract expects the directory, not the file
        file.parent()
            .and_then(|dir| dir.to_str())
            .map(|s| s.to_string())
            .ok_or_else(|| OcrError::EngineUnavailable {
                engine: EngineId::Tesseract,
                reason: "Invalid tessdata path".to_string(),
            })
    }
}
