use crate::error::OcrError;
use image::DynamicImage;
use imageproc::distance_transform::Norm;
use imageproc::morphology::close;

/// Radius of the square structuring element (1 = 3x3)
const CLOSE_RADIUS: u8 = 1;

/// Morphological closing: dilate then erode.
/// Removes pinholes and specks narrower than the structuring element.
pub fn apply(image: DynamicImage) -> Result<DynamicImage, OcrError> {
    let gray = image.to_luma8();
    let closed = close(&gray, Norm::LInf, CLOSE_RADIUS);
    Ok(DynamicImage::ImageLuma8(closed))
}
