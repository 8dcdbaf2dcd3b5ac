use crate::error::OcrError;
use image::DynamicImage;

/// Collapse a capture to a single luminance channel.
/// Already-gray images pass through without a copy.
pub fn apply(image: DynamicImage) -> Result<DynamicImage, OcrError> {
    match image {
        DynamicImage::ImageLuma8(_) => Ok(image),
        other => Ok(DynamicImage::ImageLuma8(other.to_luma8())),
    }
}
