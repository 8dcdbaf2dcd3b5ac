//! OCRS backend
//!
//! Pure Rust OCR engine using the ocrs library. No system dependencies required.
//! Downloads neural network models automatically on first use.

// ============================================================================
// Confidence scoring heuristics
// ============================================================================

/// Score recognized text quality in [0, 1].
///
/// ocrs does not expose recognition scores, so each detected line is scored
/// by analyzing the text for patterns that indicate OCR quality.
pub fn text_quality(text: &str) -> f32 {
    if text.is_empty() {
        return 0.0;
    }
    if text.len() < 5 {
        return 0.5; // Too short to judge accurately
    }

    let char_score = analyze_char_frequency(text);
    let word_score = analyze_word_lengths(text);
    let whitespace_score = analyze_whitespace(text);
    let repetition_score = detect_repetition(text);

    let confidence =
        0.40 * char_score + 0.30 * word_score + 0.15 * whitespace_score + 0.15 * repetition_score;

    confidence.clamp(0.0, 1.0)
}

/// Penalizes text with too many special/control characters or too few letters.
fn analyze_char_frequency(text: &str) -> f32 {
    let total = text.chars().count();
    if total == 0 {
        return 0.0;
    }

    let letters = text.chars().filter(|c| c.is_alphabetic()).count();
    let special = text
        .chars()
        .filter(|c| !c.is_alphanumeric() && !c.is_whitespace() && !c.is_ascii_punctuation())
        .count();

    let special_ratio = special as f32 / total as f32;
    let special_penalty = 1.0 - (special_ratio * 10.0).min(1.0);

    let letter_ratio = letters as f32 / total as f32;
    let letter_score = (letter_ratio * 1.5).min(1.0);

    special_penalty * 0.6 + letter_score * 0.4
}

/// Garbled OCR often produces single-character "words" or very long sequences.
fn analyze_word_lengths(text: &str) -> f32 {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return 0.5;
    }

    let total_len: usize = words.iter().map(|w| w.len()).sum();
    let avg_len = total_len as f32 / words.len() as f32;

    // Ideal average word length: 4-8 chars
    let avg_score = match avg_len as usize {
        0..=1 => 0.3,
        2..=3 => 0.7,
        4..=8 => 1.0,
        9..=12 => 0.8,
        _ => 0.4,
    };

    let single_count = words.iter().filter(|w| w.len() == 1).count();
    let single_ratio = single_count as f32 / words.len() as f32;
    let single_penalty = 1.0 - (single_ratio * 1.5).min(0.5);

    avg_score * single_penalty
}

/// Normal text has ~10-25% whitespace.
fn analyze_whitespace(text: &str) -> f32 {
    let total = text.chars().count();
    if total == 0 {
        return 0.0;
    }

    let whitespace = text.chars().filter(|c| c.is_whitespace()).count();
    let ratio = (whitespace as f32 / total as f32) * 100.0;

    match ratio as usize {
        0..=5 => 0.5,
        6..=10 => 0.8,
        11..=25 => 1.0,
        26..=40 => 0.7,
        _ => 0.3,
    }
}

/// Runs like "aaaa" or "####" often indicate OCR confusion.
fn detect_repetition(text: &str) -> f32 {
    let mut max_repeat = 1;
    let mut current = 1;
    let mut prev: Option<char> = None;

    for c in text.chars() {
        if Some(c) == prev && !c.is_whitespace() {
            current += 1;
            max_repeat = max_repeat.max(current);
        } else {
            current = 1;
        }
        prev = Some(c);
    }

    match max_repeat {
        1..=3 => 1.0,
        4..=5 => 0.8,
        6..=10 => 0.5,
        _ => 0.2,
    }
}

#[cfg(feature = "engine-ocrs")]
pub use backend::OcrsBackend;

#[cfg(feature = "engine-ocrs")]
mod backend {
    use super::text_quality;
    use crate::config::Config;
    use crate::engine::EngineId;
    use crate::engines::download;
    use crate::engines::scene::{Detection, SceneTextBackend};
    use crate::error::OcrError;
    use anyhow::Context;
    use image::DynamicImage;
    use ocrs::{DecodeMethod, ImageSource, OcrEngine as OcrsOcrEngine, OcrEngineParams, TextItem};
    use rten::Model;
    use std::path::PathBuf;

    /// Default model URLs from the ocrs project
    const DETECTION_MODEL_URL: &str =
        "https://ocrs-models.s3-accelerate.amazonaws.com/text-detection.rten";
    const RECOGNITION_MODEL_URL: &str =
        "https://ocrs-models.s3-accelerate.amazonaws.com/text-recognition.rten";

    const DETECTION_MODEL_FILE: &str = "text-detection.rten";
    const RECOGNITION_MODEL_FILE: &str = "text-recognition.rten";

    /// Scene text backend wrapping the ocrs library.
    ///
    /// The loaded engine is only read during inference, so one instance can
    /// serve concurrent requests.
    pub struct OcrsBackend {
        engine: OcrsOcrEngine,
    }

    fn unavailable(reason: String) -> OcrError {
        OcrError::EngineUnavailable {
            engine: EngineId::Ocrs,
            reason,
        }
    }

    impl OcrsBackend {
        /// Load models from the configured directory or the download cache
        pub fn new(config: &Config) -> Result<Self, OcrError> {
            tracing::info!("Initializing ocrs OCR engine...");

            let (detection_path, recognition_path) = model_paths(config)?;

            tracing::debug!("Loading detection model from {:?}", detection_path);
            let detection_model = Model::load_file(&detection_path)
                .map_err(|e| unavailable(format!("Failed to load detection model: {}", e)))?;
            tracing::debug!("Loading recognition model from {:?}", recognition_path);
            let recognition_model = Model::load_file(&recognition_path)
                .map_err(|e| unavailable(format!("Failed to load recognition model: {}", e)))?;

            let engine = OcrsOcrEngine::new(OcrEngineParams {
                detection_model: Some(detection_model),
                recognition_model: Some(recognition_model),
                decode_method: DecodeMethod::Greedy,
                ..Default::default()
            })
            .map_err(|e| unavailable(format!("Failed to create OCR engine: {}", e)))?;

            tracing::info!("ocrs engine initialized successfully");

            Ok(Self { engine })
        }
    }

    fn model_paths(config: &Config) -> Result<(PathBuf, PathBuf), OcrError> {
        if let Some(dir) = &config.models_dir {
            return Ok((dir.join(DETECTION_MODEL_FILE), dir.join(RECOGNITION_MODEL_FILE)));
        }

        let detection = download::ensure_cached(DETECTION_MODEL_URL, "models", DETECTION_MODEL_FILE)
            .map_err(unavailable)?;
        let recognition =
            download::ensure_cached(RECOGNITION_MODEL_URL, "models", RECOGNITION_MODEL_FILE)
                .map_err(unavailable)?;
        Ok((detection, recognition))
    }

    impl SceneTextBackend for OcrsBackend {
        fn detect(&self, image: &DynamicImage) -> anyhow::Result<Vec<Detection>> {
            // HWC RGB is what ImageSource::from_bytes expects
            let rgb_img = image.to_rgb8();
            let dimensions = rgb_img.dimensions();

            let img_source = ImageSource::from_bytes(rgb_img.as_raw(), dimensions)
                .context("Failed to create image source")?;

            let ocr_input = self
                .engine
                .prepare_input(img_source)
                .context("Failed to prepare input")?;

            let word_rects = self
                .engine
                .detect_words(&ocr_input)
                .context("Failed to detect words")?;

            let line_rects = self.engine.find_text_lines(&ocr_input, &word_rects);

            let line_texts = self
                .engine
                .recognize_text(&ocr_input, &line_rects)
                .context("Failed to recognize text")?;

            let detections = line_texts
                .iter()
                .flatten()
                .filter_map(|line| {
                    let text = line
                        .words()
                        .map(|word| word.to_string())
                        .collect::<Vec<_>>()
                        .join(" ");
                    if text.trim().is_empty() {
                        return None;
                    }

                    let corners = line.rotated_rect().corners().map(|p| (p.x, p.y));

                    Some(Detection {
                        corners,
                        confidence: text_quality(&text),
                        text,
                    })
                })
                .collect::<Vec<_>>();

            tracing::trace!("ocrs recognized {} lines", detections.len());
            Ok(detections)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_returns_zero() {
        assert_eq!(text_quality(""), 0.0);
    }

    #[test]
    fn test_short_text_returns_half() {
        assert_eq!(text_quality("Hi"), 0.5);
        assert_eq!(text_quality("Test"), 0.5);
    }

    #[test]
    fn test_clean_line_passes_acceptance_threshold() {
        let confidence = text_quality("The quick brown fox jumps over the lazy dog");
        assert!(confidence > 0.75, "Expected > 0.75, got {}", confidence);
    }

    #[test]
    fn test_garbled_text_low_confidence() {
        let confidence = text_quality("§±®©¥€£¢¤");
        assert!(confidence < 0.5, "Expected < 0.5, got {}", confidence);
    }

    #[test]
    fn test_repeated_chars_lower_confidence() {
        let clean = text_quality("Hello brave World");
        let noisy = text_quality("Hello aaaaaaaaaaaa World");
        assert!(noisy < clean, "Expected {} < {}", noisy, clean);
    }

    #[test]
    fn test_single_char_words_lower_confidence() {
        let confidence = text_quality("a b c d e f g h i j k l m n o p");
        assert!(confidence < 0.7, "Expected < 0.7, got {}", confidence);
    }

    #[test]
    fn test_detect_repetition_levels() {
        assert_eq!(detect_repetition("Hello World"), 1.0);
        assert!(detect_repetition("Hellooooo World") < 1.0);
    }

    #[test]
    fn test_analyze_whitespace_normal() {
        assert!(analyze_whitespace("Hello World Test String") > 0.7);
    }
}
