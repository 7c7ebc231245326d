//! Perspective rectification onto the canonical 63:88 card rectangle.

use image::{GrayImage, Rgb, RgbImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};

use crate::{PixelBuffer, Quad};

/// Physical card proportions (63mm x 88mm).
pub const CARD_ASPECT_W: u32 = 63;
pub const CARD_ASPECT_H: u32 = 88;

/// Top-down view of a card with its true physical aspect ratio.
#[derive(Debug, Clone)]
pub struct CanonicalCardImage {
    image: RgbImage,
}

impl CanonicalCardImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_rgb(&self) -> &RgbImage {
        &self.image
    }

    pub fn to_gray_image(&self) -> GrayImage {
        crate::buffer::to_gray(&self.image)
    }
}

/// Canonical `(width, height)` for a given output width.
pub fn canonical_size(width: u32) -> (u32, u32) {
    let width = width.max(1);
    let height = (width as f64 * CARD_ASPECT_H as f64 / CARD_ASPECT_W as f64).round() as u32;
    (width, height.max(1))
}

/// Warp the quadrilateral onto a `width x round(width * 88 / 63)` rectangle.
///
/// The quad is reordered first, so corner order on input does not matter.
/// Returns `None` when the corners are degenerate (collinear or coincident).
pub fn rectify(buffer: &PixelBuffer, quad: &Quad, width: u32) -> Option<CanonicalCardImage> {
    let quad = Quad::from_points(quad.corners);
    if quad.area() < 1.0 {
        log::debug!("rectify: degenerate quad {:?}", quad.corners);
        return None;
    }
    let (w, h) = canonical_size(width);

    let dst = [
        (0.0, 0.0),
        ((w - 1) as f32, 0.0),
        ((w - 1) as f32, (h - 1) as f32),
        (0.0, (h - 1) as f32),
    ];

    let Some(projection) = Projection::from_control_points(quad.as_tuples(), dst) else {
        log::debug!("rectify: degenerate quad {:?}", quad.corners);
        return None;
    };

    let mut out = RgbImage::new(w, h);
    warp_into(buffer.as_rgb(), &projection, Interpolation::Bilinear, Rgb([0, 0, 0]), &mut out);

    Some(CanonicalCardImage { image: out })
}

impl From<RgbImage> for CanonicalCardImage {
    /// Treat an image as already rectified (used when falling back to the full frame).
    fn from(image: RgbImage) -> Self {
        Self { image }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use imageproc::point::Point;

    fn quad(points: [(f32, f32); 4]) -> Quad {
        Quad::from_points(points.map(|(x, y)| Point::new(x, y)))
    }

    fn gradient(w: u32, h: u32) -> PixelBuffer {
        PixelBuffer::from(RgbImage::from_fn(w, h, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        }))
    }

    #[test]
    fn canonical_height_follows_card_proportions() {
        assert_eq!(canonical_size(640), (640, 894));
        assert_eq!(canonical_size(63), (63, 88));
        assert_eq!(canonical_size(315), (315, 440));
    }

    #[test]
    fn output_aspect_ignores_input_shape() {
        let buf = gradient(800, 600);
        let shapes = [
            [(10.0, 10.0), (790.0, 10.0), (790.0, 590.0), (10.0, 590.0)],
            [(300.0, 50.0), (420.0, 60.0), (430.0, 560.0), (290.0, 550.0)],
            [(100.0, 200.0), (700.0, 150.0), (650.0, 400.0), (150.0, 450.0)],
        ];

        for shape in shapes {
            let card = rectify(&buf, &quad(shape), 640).unwrap();
            assert_eq!((card.width(), card.height()), (640, 894));
            assert_abs_diff_eq!(
                card.width() as f64 / card.height() as f64,
                63.0 / 88.0,
                epsilon = 1.0 / card.height() as f64
            );
        }
    }

    #[test]
    fn corner_order_does_not_matter() {
        let buf = gradient(400, 400);
        let a = rectify(&buf, &quad([(50.0, 40.0), (300.0, 60.0), (280.0, 380.0), (40.0, 350.0)]), 126).unwrap();
        let b = rectify(&buf, &quad([(280.0, 380.0), (40.0, 350.0), (300.0, 60.0), (50.0, 40.0)]), 126).unwrap();
        assert_eq!(a.as_rgb(), b.as_rgb());
    }

    #[test]
    fn rectifying_a_canonical_image_is_near_identity() {
        let (w, h) = canonical_size(640);
        let buf = gradient(w, h);
        let full = quad([(0.0, 0.0), ((w - 1) as f32, 0.0), ((w - 1) as f32, (h - 1) as f32), (0.0, (h - 1) as f32)]);

        let once = rectify(&buf, &full, w).unwrap();
        assert_eq!((once.width(), once.height()), (w, h));

        let again = rectify(&PixelBuffer::from(once.as_rgb().clone()), &full, w).unwrap();
        assert_eq!((again.width(), again.height()), (w, h));

        for (x, y) in [(10, 10), (320, 440), (600, 880)] {
            let src = buf.as_rgb().get_pixel(x, y).0;
            let out = again.as_rgb().get_pixel(x, y).0;
            for c in 0..3 {
                assert!(src[c].abs_diff(out[c]) <= 2, "pixel ({x}, {y}) drifted: {src:?} -> {out:?}");
            }
        }
    }

    #[test]
    fn maps_quad_corners_to_output_corners() {
        // Mark the four corners of a tilted card with distinct colors.
        let mut img = RgbImage::from_pixel(300, 300, Rgb([0, 0, 0]));
        let marks = [
            ((60u32, 40u32), Rgb([255, 0, 0])),
            ((240, 60), Rgb([0, 255, 0])),
            ((230, 270), Rgb([0, 0, 255])),
            ((50, 250), Rgb([255, 255, 0])),
        ];
        for ((x, y), color) in marks {
            for dy in 0..9 {
                for dx in 0..9 {
                    img.put_pixel(x + dx - 4, y + dy - 4, color);
                }
            }
        }

        let q = quad([(240.0, 60.0), (50.0, 250.0), (60.0, 40.0), (230.0, 270.0)]);
        let card = rectify(&PixelBuffer::from(img), &q, 200).unwrap();
        let (w, h) = (card.width(), card.height());

        // Sample just inside each corner; the outermost row and column have no
        // right/bottom neighbour to interpolate with.
        let near = |x: u32, y: u32, expected: [u8; 3]| {
            let got = card.as_rgb().get_pixel(x, y).0;
            assert!(
                (0..3).all(|c| got[c].abs_diff(expected[c]) <= 2),
                "({x}, {y}) is {got:?}, expected {expected:?}"
            );
        };
        near(1, 1, [255, 0, 0]);
        near(w - 3, 1, [0, 255, 0]);
        near(w - 3, h - 3, [0, 0, 255]);
        near(1, h - 3, [255, 255, 0]);
    }

    #[test]
    fn degenerate_quad_is_rejected() {
        let buf = gradient(100, 100);
        let flat = quad([(10.0, 10.0), (50.0, 10.0), (90.0, 10.0), (30.0, 10.0)]);
        assert!(rectify(&buf, &flat, 64).is_none());
    }
}
