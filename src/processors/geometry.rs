//! Geometric primitives for box decoding and grouping.
//!
//! This module provides the 2D point and quadrilateral types used across the
//! pipeline, plus the convex-hull and rotating-calipers machinery behind
//! minimum-area rectangle extraction.

use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// A 2D point with floating-point coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X-coordinate of the point.
    pub x: f32,
    /// Y-coordinate of the point.
    pub y: f32,
}

impl Point {
    /// Creates a new point with the given coordinates.
    ///
    /// # Arguments
    ///
    /// * `x` - The x-coordinate of the point.
    /// * `y` - The y-coordinate of the point.
    ///
    /// # Returns
    ///
    /// A new `Point` instance.
    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// An ordered 4-point polygon.
///
/// After post-processing the first point is the one with minimum `x + y`
/// (the top-left for roughly axis-aligned text) and the remainder follow
/// clockwise in image coordinates. Points may lie off-canvas; consumers clamp
/// when sampling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quad(pub [Point; 4]);

impl Quad {
    /// Builds an axis-aligned quad from corner coordinates.
    pub fn from_rect(x_min: f32, y_min: f32, x_max: f32, y_max: f32) -> Self {
        Self([
            Point::new(x_min, y_min),
            Point::new(x_max, y_min),
            Point::new(x_max, y_max),
            Point::new(x_min, y_max),
        ])
    }

    /// Smallest x over the four points.
    pub fn x_min(&self) -> f32 {
        self.0.iter().map(|p| p.x).fold(f32::INFINITY, f32::min)
    }

    /// Largest x over the four points.
    pub fn x_max(&self) -> f32 {
        self.0.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max)
    }

    /// Smallest y over the four points.
    pub fn y_min(&self) -> f32 {
        self.0.iter().map(|p| p.y).fold(f32::INFINITY, f32::min)
    }

    /// Largest y over the four points.
    pub fn y_max(&self) -> f32 {
        self.0.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max)
    }

    /// Width of the axis-aligned bounds.
    pub fn width(&self) -> f32 {
        self.x_max() - self.x_min()
    }

    /// Height of the axis-aligned bounds.
    pub fn height(&self) -> f32 {
        self.y_max() - self.y_min()
    }

    /// Absolute angle of the top edge (`p0 -> p1`) in degrees.
    pub fn top_edge_angle_deg(&self) -> f32 {
        let dx = self.0[1].x - self.0[0].x;
        let dy = self.0[1].y - self.0[0].y;
        dy.atan2(dx).to_degrees().abs()
    }

    /// Axis-aligned union with another quad.
    pub fn union(&self, other: &Quad) -> Quad {
        Quad::from_rect(
            self.x_min().min(other.x_min()),
            self.y_min().min(other.y_min()),
            self.x_max().max(other.x_max()),
            self.y_max().max(other.y_max()),
        )
    }

    /// Whether all eight coordinates are finite.
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|p| p.x.is_finite() && p.y.is_finite())
    }

    /// The nested-array form used in the programmatic result format.
    pub fn to_array(&self) -> [[f32; 2]; 4] {
        [
            [self.0[0].x, self.0[0].y],
            [self.0[1].x, self.0[1].y],
            [self.0[2].x, self.0[2].y],
            [self.0[3].x, self.0[3].y],
        ]
    }

    /// Reorders the points clockwise (image coordinates, y down) starting
    /// from the point with minimum `x + y`.
    pub fn ordered_clockwise(&self) -> Quad {
        let mut points = self.0;

        // Shoelace sum: with y pointing down, positive means clockwise on
        // screen.
        let mut doubled_area = 0.0f32;
        for i in 0..4 {
            let j = (i + 1) % 4;
            doubled_area += points[i].x * points[j].y - points[j].x * points[i].y;
        }
        if doubled_area < 0.0 {
            points.reverse();
        }

        let start = (0..4)
            .min_by(|&a, &b| {
                let sa = points[a].x + points[a].y;
                let sb = points[b].x + points[b].y;
                sa.partial_cmp(&sb).unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(0);
        let mut rolled = [Point::new(0.0, 0.0); 4];
        for (i, slot) in rolled.iter_mut().enumerate() {
            *slot = points[(start + i) % 4];
        }
        Quad(rolled)
    }
}

fn cross(o: &Point, a: &Point, b: &Point) -> f32 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Convex hull via Graham's scan.
///
/// Returns the hull in counter-clockwise order (mathematical orientation).
/// Inputs with fewer than 3 points are returned as-is.
pub fn convex_hull(input: &[Point]) -> Vec<Point> {
    if input.len() < 3 {
        return input.to_vec();
    }
    let mut points = input.to_vec();

    let mut start_idx = 0;
    for i in 1..points.len() {
        if points[i].y < points[start_idx].y
            || (points[i].y == points[start_idx].y && points[i].x < points[start_idx].x)
        {
            start_idx = i;
        }
    }
    points.swap(0, start_idx);
    let start = points[0];

    points[1..].sort_by(|a, b| {
        let c = cross(&start, a, b);
        if c == 0.0 {
            let da = (a.x - start.x).powi(2) + (a.y - start.y).powi(2);
            let db = (b.x - start.x).powi(2) + (b.y - start.y).powi(2);
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        } else if c > 0.0 {
            std::cmp::Ordering::Less
        } else {
            std::cmp::Ordering::Greater
        }
    });

    let mut hull: Vec<Point> = Vec::with_capacity(points.len());
    for point in points {
        while hull.len() > 1 && cross(&hull[hull.len() - 2], &hull[hull.len() - 1], &point) <= 0.0 {
            hull.pop();
        }
        hull.push(point);
    }
    hull
}

/// Minimum-area enclosing rectangle via rotating calipers over hull edges.
///
/// For every hull edge the point set is projected onto the edge direction and
/// its perpendicular; the tightest axis-aligned box in that rotated frame is
/// a candidate, and the smallest-area candidate wins. Degenerate inputs fall
/// back to the axis-aligned bounding rectangle.
pub fn min_area_rect(points: &[Point]) -> Quad {
    let hull = convex_hull(points);
    if hull.len() < 3 {
        return axis_aligned_bounds(points);
    }

    let n = hull.len();
    let mut best_area = f32::MAX;
    let mut best: Option<Quad> = None;

    for i in 0..n {
        let j = (i + 1) % n;
        let edge_x = hull[j].x - hull[i].x;
        let edge_y = hull[j].y - hull[i].y;
        let len = (edge_x * edge_x + edge_y * edge_y).sqrt();
        if len < f32::EPSILON {
            continue;
        }
        let nx = edge_x / len;
        let ny = edge_y / len;
        let px = -ny;
        let py = nx;

        let mut min_n = f32::MAX;
        let mut max_n = f32::MIN;
        let mut min_p = f32::MAX;
        let mut max_p = f32::MIN;
        for point in &hull {
            let proj_n = nx * (point.x - hull[i].x) + ny * (point.y - hull[i].y);
            let proj_p = px * (point.x - hull[i].x) + py * (point.y - hull[i].y);
            min_n = min_n.min(proj_n);
            max_n = max_n.max(proj_n);
            min_p = min_p.min(proj_p);
            max_p = max_p.max(proj_p);
        }

        let area = (max_n - min_n) * (max_p - min_p);
        if area < best_area {
            best_area = area;
            let corner = |cn: f32, cp: f32| {
                Point::new(
                    hull[i].x + cn * nx + cp * px,
                    hull[i].y + cn * ny + cp * py,
                )
            };
            best = Some(Quad([
                corner(min_n, min_p),
                corner(max_n, min_p),
                corner(max_n, max_p),
                corner(min_n, max_p),
            ]));
        }
    }

    best.unwrap_or_else(|| axis_aligned_bounds(points))
}

/// Axis-aligned bounding rectangle of a point set.
pub fn axis_aligned_bounds(points: &[Point]) -> Quad {
    let (min_x, max_x) = points
        .iter()
        .map(|p| p.x)
        .minmax()
        .into_option()
        .unwrap_or((0.0, 0.0));
    let (min_y, max_y) = points
        .iter()
        .map(|p| p.y)
        .minmax()
        .into_option()
        .unwrap_or((0.0, 0.0));
    Quad::from_rect(min_x, min_y, max_x, max_y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hull_of_square_with_interior_point() {
        let points = vec![
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(4.0, 4.0),
            Point::new(0.0, 4.0),
            Point::new(2.0, 2.0),
        ];
        let hull = convex_hull(&points);
        assert_eq!(hull.len(), 4);
        assert!(!hull.iter().any(|p| p.x == 2.0 && p.y == 2.0));
    }

    #[test]
    fn min_area_rect_of_axis_aligned_points() {
        let points = vec![
            Point::new(1.0, 1.0),
            Point::new(5.0, 1.0),
            Point::new(5.0, 3.0),
            Point::new(1.0, 3.0),
        ];
        let rect = min_area_rect(&points).ordered_clockwise();
        assert!((rect.width() - 4.0).abs() < 1e-4);
        assert!((rect.height() - 2.0).abs() < 1e-4);
        assert!((rect.0[0].x - 1.0).abs() < 1e-4);
        assert!((rect.0[0].y - 1.0).abs() < 1e-4);
    }

    #[test]
    fn min_area_rect_of_rotated_points_beats_axis_aligned() {
        // A thin 45-degree segment of points with slight thickness
        let points: Vec<Point> = (0..10)
            .flat_map(|i| {
                let t = i as f32;
                [Point::new(t, t), Point::new(t + 0.5, t - 0.5)]
            })
            .collect();
        let rect = min_area_rect(&points);
        let aabb = axis_aligned_bounds(&points);
        let rect_area = rect.0[0].distance(&rect.0[1]) * rect.0[1].distance(&rect.0[2]);
        let aabb_area = aabb.width() * aabb.height();
        assert!(rect_area < aabb_area * 0.5, "{rect_area} vs {aabb_area}");
    }

    #[test]
    fn ordered_clockwise_starts_at_min_sum_and_winds_clockwise() {
        let quad = Quad([
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
            Point::new(0.0, 0.0),
        ]);
        let ordered = quad.ordered_clockwise();
        assert_eq!(ordered.0[0], Point::new(0.0, 0.0));
        assert_eq!(ordered.0[1], Point::new(10.0, 0.0));
        assert_eq!(ordered.0[2], Point::new(10.0, 10.0));
        assert_eq!(ordered.0[3], Point::new(0.0, 10.0));
    }

    #[test]
    fn union_covers_both_quads() {
        let a = Quad::from_rect(0.0, 0.0, 10.0, 10.0);
        let b = Quad::from_rect(15.0, -5.0, 25.0, 10.0);
        let u = a.union(&b);
        assert_eq!(u.x_min(), 0.0);
        assert_eq!(u.y_min(), -5.0);
        assert_eq!(u.x_max(), 25.0);
        assert_eq!(u.y_max(), 10.0);
    }

    #[test]
    fn top_edge_angle_of_flat_quad_is_zero() {
        let q = Quad::from_rect(0.0, 0.0, 5.0, 2.0);
        assert!(q.top_edge_angle_deg().abs() < 1e-6);
    }
}
