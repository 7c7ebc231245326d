//! Planar helpers for the boundary detector and the rectifier.

use imageproc::geometry::{approximate_polygon_dp, contour_area};
use imageproc::point::Point;

/// Four corners of a card outline in pixel space.
///
/// Corners are stored clockwise starting at top-left: `[tl, tr, br, bl]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    pub corners: [Point<f32>; 4],
}

impl Quad {
    /// Order four points of arbitrary order into `[tl, tr, br, bl]`.
    ///
    /// Top-left has the smallest `x + y` and bottom-right the largest; top-right has
    /// the smallest `y - x` and bottom-left the largest.
    pub fn from_points(points: [Point<f32>; 4]) -> Self {
        let sum = |p: &Point<f32>| p.x + p.y;
        let diff = |p: &Point<f32>| p.y - p.x;

        let tl = *min_by(&points, sum);
        let br = *max_by(&points, sum);
        let tr = *min_by(&points, diff);
        let bl = *max_by(&points, diff);

        Self {
            corners: [tl, tr, br, bl],
        }
    }

    pub fn top_left(&self) -> Point<f32> {
        self.corners[0]
    }

    pub fn top_right(&self) -> Point<f32> {
        self.corners[1]
    }

    pub fn bottom_right(&self) -> Point<f32> {
        self.corners[2]
    }

    pub fn bottom_left(&self) -> Point<f32> {
        self.corners[3]
    }

    pub fn area(&self) -> f64 {
        contour_area(&self.corners)
    }

    /// Corners as tuples, the shape `imageproc` projections take.
    pub fn as_tuples(&self) -> [(f32, f32); 4] {
        self.corners.map(|p| (p.x, p.y))
    }
}

fn min_by(points: &[Point<f32>; 4], key: impl Fn(&Point<f32>) -> f32) -> &Point<f32> {
    let mut best = &points[0];
    for p in &points[1..] {
        if key(p) < key(best) {
            best = p;
        }
    }
    best
}

fn max_by(points: &[Point<f32>; 4], key: impl Fn(&Point<f32>) -> f32) -> &Point<f32> {
    let mut best = &points[0];
    for p in &points[1..] {
        if key(p) > key(best) {
            best = p;
        }
    }
    best
}

/// Douglas-Peucker simplification of a closed contour.
///
/// The contour is rotated to start at the point farthest from its first
/// point. That point is an extreme of the shape, so it is a real vertex and
/// survives as one. The result does not repeat its first point.
pub fn approximate_closed_polygon(points: &[Point<i32>], epsilon: f64) -> Vec<Point<i32>> {
    if points.len() < 3 || epsilon <= 0.0 {
        return points.to_vec();
    }

    let start = farthest_from(points, points[0]);
    let mut rotated = points[start..].to_vec();
    rotated.extend_from_slice(&points[..start]);
    rotated.dedup();
    if rotated.len() > 1 && rotated.first() == rotated.last() {
        rotated.pop();
    }
    if rotated.len() < 3 {
        return rotated;
    }

    approximate_polygon_dp(&rotated, epsilon, true)
}

fn farthest_from(points: &[Point<i32>], origin: Point<i32>) -> usize {
    let mut best = 0;
    let mut best_d = -1i64;
    for (i, p) in points.iter().enumerate() {
        let dx = (p.x - origin.x) as i64;
        let dy = (p.y - origin.y) as i64;
        let d = dx * dx + dy * dy;
        if d > best_d {
            best_d = d;
            best = i;
        }
    }
    best
}
