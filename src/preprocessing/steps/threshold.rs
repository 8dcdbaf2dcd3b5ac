use crate::error::OcrError;
use image::{DynamicImage, GrayImage, Luma};

/// Side of the square neighborhood used for the local mean
const BLOCK_SIZE: u32 = 11;
/// Subtracted from the local mean to get the threshold
const OFFSET: f64 = 2.0;

/// Apply adaptive mean thresholding
/// Robust to uneven lighting and anti-aliased screen text
pub fn apply(image: DynamicImage) -> Result<DynamicImage, OcrError> {
    let gray = image.to_luma8();
    let binarized = mean_threshold(&gray, BLOCK_SIZE, OFFSET);
    Ok(DynamicImage::ImageLuma8(binarized))
}

/// Local mean thresholding
///
/// For each pixel, threshold = mean(window) - offset; the pixel becomes white
/// when strictly above the threshold. Windows are clipped at the borders.
fn mean_threshold(img: &GrayImage, block_size: u32, offset: f64) -> GrayImage {
    let (width, height) = img.dimensions();
    let half_window = block_size as i64 / 2;

    // Precompute the integral image for constant-time window sums
    let integral = compute_integral_image(img);

    GrayImage::from_fn(width, height, |x, y| {
        let x1 = (x as i64 - half_window).max(0) as usize;
        let y1 = (y as i64 - half_window).max(0) as usize;
        let x2 = (x as i64 + half_window).min(width as i64 - 1) as usize + 1;
        let y2 = (y as i64 + half_window).min(height as i64 - 1) as usize + 1;

        let area = ((x2 - x1) * (y2 - y1)) as f64;
        // Add before subtracting so the unsigned sum never dips below zero
        let sum = integral[y2][x2] + integral[y1][x1] - integral[y1][x2] - integral[y2][x1];
        let threshold = sum as f64 / area - offset;

        if img.get_pixel(x, y).0[0] as f64 > threshold {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}

/// Summed-area table with a zero row and column in front
fn compute_integral_image(img: &GrayImage) -> Vec<Vec<u64>> {
    let (width, height) = img.dimensions();
    let mut integral = vec![vec![0u64; width as usize + 1]; height as usize + 1];

    for y in 0..height as usize {
        for x in 0..width as usize {
            let val = img.get_pixel(x as u32, y as u32).0[0] as u64;
            integral[y + 1][x + 1] = val + integral[y][x + 1] + integral[y + 1][x] - integral[y][x];
        }
    }

    integral
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_binarizes_image() {
        let img = GrayImage::from_fn(50, 50, |x, _| Luma([(x as u8 * 5).min(255)]));

        let result = apply(DynamicImage::ImageLuma8(img)).unwrap();
        let result_gray = result.to_luma8();

        for pixel in result_gray.pixels() {
            assert!(
                pixel.0[0] == 0 || pixel.0[0] == 255,
                "Expected binary pixel, got {}",
                pixel.0[0]
            );
        }
    }

    #[test]
    fn test_threshold_handles_text_pattern() {
        // Dark text on light background
        let mut img = GrayImage::from_pixel(50, 20, Luma([240]));
        for x in 10..40 {
            img.put_pixel(x, 10, Luma([20]));
        }

        let result = apply(DynamicImage::ImageLuma8(img)).unwrap();
        let result_gray = result.to_luma8();

        assert_eq!(result_gray.get_pixel(25, 10).0[0], 0);
        assert_eq!(result_gray.get_pixel(25, 5).0[0], 255);
    }

    #[test]
    fn test_threshold_uniform_white_stays_white() {
        let img = GrayImage::from_pixel(30, 30, Luma([255]));
        let result = mean_threshold(&img, BLOCK_SIZE, OFFSET);
        assert!(result.pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn test_threshold_gradient_and_checkerboard() {
        let gradient = GrayImage::from_fn(64, 48, |x, y| Luma([(x * 3 + y) as u8]));
        let result = mean_threshold(&gradient, BLOCK_SIZE, OFFSET);
        assert_eq!(result.dimensions(), (64, 48));

        let checker = GrayImage::from_fn(33, 21, |x, y| {
            if (x / 3 + y / 3) % 2 == 0 {
                Luma([0])
            } else {
                Luma([255])
            }
        });
        let result = mean_threshold(&checker, BLOCK_SIZE, OFFSET);
        assert_eq!(result.get_pixel(1, 1).0[0], 0);
        assert_eq!(result.get_pixel(4, 1).0[0], 255);
    }

    #[test]
    fn test_window_sum_matches_direct_sum() {
        let img = GrayImage::from_fn(20, 15, |x, y| Luma([((x * 37 + y * 11) % 256) as u8]));
        let integral = compute_integral_image(&img);

        let (x1, y1, x2, y2) = (3usize, 4usize, 12usize, 10usize);
        let direct: u64 = (y1..y2)
            .flat_map(|y| (x1..x2).map(move |x| (x, y)))
            .map(|(x, y)| img.get_pixel(x as u32, y as u32).0[0] as u64)
            .sum();
        let windowed = integral[y2][x2] + integral[y1][x1] - integral[y1][x2] - integral[y2][x1];
        assert_eq!(windowed, direct);
    }

    #[test]
    fn test_integral_image_sums() {
        let img = GrayImage::from_pixel(3, 2, Luma([10]));
        let integral = compute_integral_image(&img);
        assert_eq!(integral[2][3], 60);
        assert_eq!(integral[1][2], 20);
    }
}
