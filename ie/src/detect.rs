//! Card boundary detection.
//!
//! Blur, adaptive threshold (inverted, so edges become foreground), trace
//! outer contours and keep the largest one. It is accepted only if it covers
//! enough of the frame and simplifies to exactly four vertices. One attempt per
//! frame; retrying is the caller's business.

use image::{GrayImage, Luma};
use imageproc::contours::{BorderType, find_contours};
use imageproc::point::Point;

use crate::{Quad, ScanConfig, geometry};

/// Find the card outline in a grayscale frame.
pub fn detect(gray: &GrayImage, config: &ScanConfig) -> Option<Quad> {
    let (w, h) = gray.dimensions();
    if w == 0 || h == 0 {
        return None;
    }

    let blurred = imageproc::filter::gaussian_blur_f32(gray, config.blur_sigma);
    let mask = adaptive_threshold_inv(&blurred, config.threshold_block_radius, config.threshold_delta);

    let contours = find_contours::<i32>(&mask);
    let largest = contours
        .iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| (imageproc::geometry::contour_area(&c.points), c))
        .max_by(|a, b| a.0.total_cmp(&b.0));

    let Some((area, contour)) = largest else {
        log::debug!("detect: no contours");
        return None;
    };

    let image_area = w as f64 * h as f64;
    if area < image_area * config.min_area_ratio as f64 {
        log::debug!(
            "detect: largest contour covers {:.1}% of the frame, below the {:.0}% floor",
            area / image_area * 100.0,
            config.min_area_ratio * 100.0
        );
        return None;
    }

    let epsilon = config.approx_epsilon_ratio * imageproc::geometry::arc_length(&contour.points, true);
    let polygon = geometry::approximate_closed_polygon(&contour.points, epsilon);
    let Ok(corners) = <[Point<i32>; 4]>::try_from(polygon.as_slice()) else {
        log::debug!("detect: outline simplified to {} vertices, not 4", polygon.len());
        return None;
    };

    Some(Quad::from_points(corners.map(|p| Point::new(p.x as f32, p.y as f32))))
}

/// Inverted Gaussian adaptive threshold.
///
/// A pixel becomes foreground (255) when it is darker than its Gaussian-weighted
/// neighbourhood mean minus `delta`, so uniform areas and faint noise stay
/// background. The weighting window matches a `(2 * block_radius + 1)` square block.
pub fn adaptive_threshold_inv(gray: &GrayImage, block_radius: u32, delta: i32) -> GrayImage {
    let block = 2 * block_radius.max(1) + 1;
    let sigma = 0.3 * ((block as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let local_mean = imageproc::filter::gaussian_blur_f32(gray, sigma);

    let mut out = GrayImage::new(gray.width(), gray.height());
    for (x, y, p) in gray.enumerate_pixels() {
        let mean = local_mean.get_pixel(x, y).0[0] as i32;
        let value = if (p.0[0] as i32) > mean - delta { 0 } else { 255 };
        out.put_pixel(x, y, Luma([value]));
    }
    out
}
