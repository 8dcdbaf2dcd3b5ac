use crate::error::OcrError;
use image::DynamicImage;
use imageproc::filter::filter3x3;

/// Apply a 3x3 Gaussian blur to suppress capture noise
pub fn apply(image: DynamicImage) -> Result<DynamicImage, OcrError> {
    let gray = image.to_luma8();

    // Binomial approximation of a Gaussian with sigma 0.8
    let kernel: [f32; 9] = [
        1.0 / 16.0,
        2.0 / 16.0,
        1.0 / 16.0,
        2.0 / 16.0,
        4.0 / 16.0,
        2.0 / 16.0,
        1.0 / 16.0,
        2.0 / 16.0,
        1.0 / 16.0,
    ];

    let blurred = filter3x3(&gray, &kernel);
    Ok(DynamicImage::ImageLuma8(blurred))
}
