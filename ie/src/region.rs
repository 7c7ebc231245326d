//! Identifier region: the strip printed with set code and collector number.
//!
//! The location is fixed relative to the canonical card (bottom-left corner),
//! so this is a plain ratio crop. It is only as good as the rectification.

use image::{GrayImage, Luma};

use crate::{CanonicalCardImage, ScanConfig};

/// Crop the bottom-left identifier strip of a rectified card and boost its contrast.
pub fn extract_identifier_region(card: &CanonicalCardImage, config: &ScanConfig) -> GrayImage {
    let gray = card.to_gray_image();
    let crop = crop_identifier_region(&gray, config.region_height_ratio, config.region_width_ratio);
    enhance_contrast(&crop, config.contrast_factor)
}

/// Bottom `height_ratio` of the image, left `width_ratio` of it. Never empty.
pub fn crop_identifier_region(gray: &GrayImage, height_ratio: f32, width_ratio: f32) -> GrayImage {
    let (w, h) = gray.dimensions();
    let region_h = ((h as f32 * height_ratio) as u32).clamp(1, h.max(1));
    let region_w = ((w as f32 * width_ratio) as u32).clamp(1, w.max(1));

    image::imageops::crop_imm(gray, 0, h.saturating_sub(region_h), region_w, region_h).to_image()
}

/// Scale each sample's distance from the mean intensity by `factor`.
///
/// `1.0` leaves the image unchanged, `0.0` flattens it to its mean.
pub fn enhance_contrast(gray: &GrayImage, factor: f32) -> GrayImage {
    let count = gray.pixels().len() as u64;
    if count == 0 {
        return gray.clone();
    }

    let sum = gray.pixels().map(|p| p.0[0] as u64).sum::<u64>();
    let mean = (sum as f32 / count as f32).round();

    let mut out = gray.clone();
    for p in out.pixels_mut() {
        let v = mean + (p.0[0] as f32 - mean) * factor;
        *p = Luma([v.round().clamp(0.0, 255.0) as u8]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rectify::canonical_size;
    use image::{Rgb, RgbImage};

    #[test]
    fn crops_bottom_left_strip_of_canonical_card() {
        let (w, h) = canonical_size(640);
        let mut rgb = RgbImage::from_pixel(w, h, Rgb([200, 200, 200]));
        // Dark ink inside the identifier strip, and outside it to the right.
        for y in h - 40..h - 20 {
            for x in 20..120 {
                rgb.put_pixel(x, y, Rgb([0, 0, 0]));
            }
            for x in 400..500 {
                rgb.put_pixel(x, y, Rgb([0, 0, 0]));
            }
        }

        let config = ScanConfig {
            contrast_factor: 1.0,
            ..ScanConfig::default()
        };
        let region = extract_identifier_region(&CanonicalCardImage::from(rgb), &config);

        assert_eq!(region.dimensions(), (320, 62));
        let dark = region.pixels().filter(|p| p.0[0] == 0).count();
        assert_eq!(dark, 100 * 20);
        // Region row 62 - 40 = 22 corresponds to the first inked canonical row.
        assert_eq!(region.get_pixel(20, 22).0[0], 0);
        assert_eq!(region.get_pixel(19, 22).0[0], 200);
    }

    #[test]
    fn crop_never_collapses() {
        let tiny = GrayImage::from_pixel(1, 3, Luma([9]));
        assert_eq!(crop_identifier_region(&tiny, 0.07, 0.5).dimensions(), (1, 1));
    }

    #[test]
    fn contrast_stretches_around_the_mean() {
        let gray = GrayImage::from_raw(4, 1, vec![100, 120, 140, 160]).unwrap();
        let out = enhance_contrast(&gray, 2.0);
        // mean 130
        assert_eq!(out.as_raw(), &vec![70, 110, 150, 190]);

        let flat = enhance_contrast(&gray, 0.0);
        assert!(flat.pixels().all(|p| p.0[0] == 130));
        assert_eq!(enhance_contrast(&gray, 1.0), gray);
    }

    #[test]
    fn contrast_clips_to_the_sample_range() {
        let gray = GrayImage::from_raw(2, 1, vec![0, 250]).unwrap();
        assert_eq!(enhance_contrast(&gray, 3.0).as_raw(), &vec![0, 255]);
    }
}
