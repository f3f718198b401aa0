//! Image preprocessing for OCR.

use image::{DynamicImage, GrayImage, Luma};
use tracing::debug;

use crate::error::OcrError;

/// Optional clean-up applied to photographed receipts before OCR.
///
/// The ingestor asks [`ImageFilter::is_available`] first and sends the
/// original image to OCR when the filter is unavailable or fails.
pub trait ImageFilter {
    /// Whether this filter can run.
    fn is_available(&self) -> bool {
        true
    }

    /// Produce the image handed to OCR.
    fn apply(&self, image: &DynamicImage) -> Result<DynamicImage, OcrError>;
}

/// Filter that is never available.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopFilter;

impl ImageFilter for NoopFilter {
    fn is_available(&self) -> bool {
        false
    }

    fn apply(&self, image: &DynamicImage) -> Result<DynamicImage, OcrError> {
        Ok(image.clone())
    }
}

/// Thresholding strategy for the final black/white image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binarization {
    /// Global threshold chosen by Otsu's method.
    Otsu,
    /// Local mean threshold over a `block_size` window, minus `c`.
    Adaptive { block_size: u32, c: i32 },
}

/// Greyscale, median denoise, then binarize.
#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
    /// Median filter radius (0 disables denoising).
    median_radius: u32,
    binarization: Binarization,
}

impl ImagePreprocessor {
    /// Create a new preprocessor with default settings.
    pub fn new() -> Self {
        Self {
            median_radius: 1,
            binarization: Binarization::Otsu,
        }
    }

    /// Set median filter radius.
    pub fn with_median_radius(mut self, radius: u32) -> Self {
        self.median_radius = radius;
        self
    }

    /// Set thresholding strategy.
    pub fn with_binarization(mut self, binarization: Binarization) -> Self {
        self.binarization = binarization;
        self
    }

    /// Run the full filter chain.
    pub fn enhance(&self, image: &DynamicImage) -> GrayImage {
        let gray = image.to_luma8();
        let denoised = if self.median_radius > 0 {
            median_filter(&gray, self.median_radius)
        } else {
            gray
        };

        match self.binarization {
            Binarization::Otsu => {
                let level = otsu_level(&denoised);
                debug!("Otsu threshold: {}", level);
                threshold(&denoised, level)
            }
            Binarization::Adaptive { block_size, c } => adaptive_threshold(&denoised, block_size, c),
        }
    }
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageFilter for ImagePreprocessor {
    fn apply(&self, image: &DynamicImage) -> Result<DynamicImage, OcrError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(OcrError::InvalidImage("empty image".to_string()));
        }
        Ok(DynamicImage::ImageLuma8(self.enhance(image)))
    }
}

fn median_filter(image: &GrayImage, radius: u32) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut result = GrayImage::new(width, height);
    let mut window = Vec::with_capacity(((2 * radius + 1) * (2 * radius + 1)) as usize);

    for y in 0..height {
        for x in 0..width {
            window.clear();

            let y_start = y.saturating_sub(radius);
            let y_end = (y + radius + 1).min(height);
            let x_start = x.saturating_sub(radius);
            let x_end = (x + radius + 1).min(width);

            for ly in y_start..y_end {
                for lx in x_start..x_end {
                    window.push(image.get_pixel(lx, ly)[0]);
                }
            }

            window.sort_unstable();
            result.put_pixel(x, y, Luma([window[window.len() / 2]]));
        }
    }

    result
}

/// Threshold maximizing between-class variance of the histogram.
fn otsu_level(image: &GrayImage) -> u8 {
    let mut histogram = [0u64; 256];
    for pixel in image.pixels() {
        histogram[pixel[0] as usize] += 1;
    }

    let total: u64 = histogram.iter().sum();
    if total == 0 {
        return 127;
    }
    let weighted_total: f64 = histogram
        .iter()
        .enumerate()
        .map(|(level, &count)| level as f64 * count as f64)
        .sum();

    let mut background_weight = 0u64;
    let mut background_sum = 0f64;
    let mut best_level = 0u8;
    let mut best_variance = -1f64;

    for (level, &count) in histogram.iter().enumerate() {
        background_weight += count;
        if background_weight == 0 {
            continue;
        }
        let foreground_weight = total - background_weight;
        if foreground_weight == 0 {
            break;
        }

        background_sum += level as f64 * count as f64;
        let background_mean = background_sum / background_weight as f64;
        let foreground_mean = (weighted_total - background_sum) / foreground_weight as f64;

        let diff = background_mean - foreground_mean;
        let variance = background_weight as f64 * foreground_weight as f64 * diff * diff;
        if variance > best_variance {
            best_variance = variance;
            best_level = level as u8;
        }
    }

    best_level
}

fn threshold(image: &GrayImage, level: u8) -> GrayImage {
    let (width, height) = image.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        if image.get_pixel(x, y)[0] > level {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

fn adaptive_threshold(image: &GrayImage, block_size: u32, c: i32) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut result = GrayImage::new(width, height);

    let half_block = block_size / 2;

    for y in 0..height {
        for x in 0..width {
            // Calculate local mean
            let mut sum = 0u32;
            let mut count = 0u32;

            let y_start = y.saturating_sub(half_block);
            let y_end = (y + half_block + 1).min(height);
            let x_start = x.saturating_sub(half_block);
            let x_end = (x + half_block + 1).min(width);

            for ly in y_start..y_end {
                for lx in x_start..x_end {
                    sum += image.get_pixel(lx, ly)[0] as u32;
                    count += 1;
                }
            }

            let mean = (sum / count) as i32;
            let threshold = mean - c;
            let pixel_value = image.get_pixel(x, y)[0] as i32;

            let output = if pixel_value > threshold { 255 } else { 0 };
            result.put_pixel(x, y, Luma([output]));
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    /// Dark text band on a light background, with one speck of noise.
    fn receipt_like() -> DynamicImage {
        let mut img = RgbImage::from_pixel(20, 20, Rgb([220, 220, 220]));
        for y in 8..12 {
            for x in 2..18 {
                img.put_pixel(x, y, Rgb([30, 30, 30]));
            }
        }
        img.put_pixel(3, 2, Rgb([0, 0, 0]));
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_noop_filter_is_unavailable() {
        let filter = NoopFilter;
        assert!(!filter.is_available());
        let img = receipt_like();
        assert_eq!(filter.apply(&img).unwrap().to_rgb8(), img.to_rgb8());
    }

    #[test]
    fn test_enhance_binarizes_and_denoises() {
        let out = ImagePreprocessor::new().enhance(&receipt_like());

        assert!(out.pixels().all(|p| p[0] == 0 || p[0] == 255));
        assert_eq!(out.get_pixel(3, 2)[0], 255, "isolated speck should be removed");
        assert_eq!(out.get_pixel(10, 10)[0], 0, "text band should stay dark");
        assert_eq!(out.get_pixel(10, 1)[0], 255);
    }

    #[test]
    fn test_otsu_level_splits_bimodal_histogram() {
        let gray = receipt_like().to_luma8();
        let level = otsu_level(&gray);
        assert!((30..220).contains(&level), "level {}", level);
    }

    #[test]
    fn test_adaptive_binarization() {
        let out = ImagePreprocessor::new()
            .with_median_radius(0)
            .with_binarization(Binarization::Adaptive { block_size: 15, c: 5 })
            .enhance(&receipt_like());
        assert!(out.pixels().all(|p| p[0] == 0 || p[0] == 255));
        assert_eq!(out.get_pixel(10, 10)[0], 0);
    }

    #[test]
    fn test_apply_rejects_empty_image() {
        let empty = DynamicImage::new_luma8(0, 0);
        assert!(ImagePreprocessor::new().apply(&empty).is_err());
    }
}
