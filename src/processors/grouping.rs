//! Detector box grouping.
//!
//! Quadrilaterals from the detector are classified by slope into horizontal
//! and free-form lists. Horizontals are grouped into lines by y-center,
//! merged greedily along x, and expanded by a margin; free-form polygons are
//! expanded along their own diagonals and passed through. Horizontals come
//! first in the output (line-major, left-to-right), then frees in discovery
//! order.

use crate::processors::geometry::{Point, Quad};

/// Thresholds controlling classification, line grouping, and merging.
#[derive(Debug, Clone, Copy)]
pub struct GroupingParams {
    /// Above this slope a polygon is routed as free-form.
    pub slope_ths: f32,
    /// Line membership: |y-center - line mean| < `ycenter_ths` * line height.
    pub ycenter_ths: f32,
    /// Merge eligibility: height difference < `height_ths` * cluster height.
    pub height_ths: f32,
    /// Merge eligibility: x gap < `width_ths` * box height.
    pub width_ths: f32,
    /// Margin added around merged boxes, as a fraction of min(w, h).
    pub add_margin: f32,
}

/// Output buckets of the grouping stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupedBoxes {
    /// Axis-aligned rectangles, line-major then left-to-right.
    pub horizontal: Vec<Quad>,
    /// Margin-expanded free-form quadrilaterals in discovery order.
    pub free: Vec<Quad>,
}

impl GroupedBoxes {
    /// Total number of boxes across both buckets.
    pub fn len(&self) -> usize {
        self.horizontal.len() + self.free.len()
    }

    /// Whether no boxes survived.
    pub fn is_empty(&self) -> bool {
        self.horizontal.is_empty() && self.free.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
struct HorizontalBox {
    x_min: f32,
    x_max: f32,
    y_min: f32,
    y_max: f32,
    y_center: f32,
    height: f32,
}

/// Classifies, line-groups, and merges detector quads.
pub fn group_text_boxes(polys: &[Quad], params: GroupingParams) -> GroupedBoxes {
    let mut horizontals = Vec::new();
    let mut free = Vec::new();

    for quad in polys {
        let p = &quad.0;
        let slope_up = (p[1].y - p[0].y) / (p[1].x - p[0].x).max(10.0);
        let slope_down = (p[2].y - p[3].y) / (p[2].x - p[3].x).max(10.0);
        if slope_up.abs().max(slope_down.abs()) < params.slope_ths {
            let x_min = quad.x_min();
            let x_max = quad.x_max();
            let y_min = quad.y_min();
            let y_max = quad.y_max();
            horizontals.push(HorizontalBox {
                x_min,
                x_max,
                y_min,
                y_max,
                y_center: 0.5 * (y_min + y_max),
                height: y_max - y_min,
            });
        } else {
            free.push(expand_free_quad(quad, params.add_margin));
        }
    }

    horizontals.sort_by(|a, b| {
        a.y_center
            .partial_cmp(&b.y_center)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let lines = group_into_lines(&horizontals, params.ycenter_ths);

    let mut merged = Vec::new();
    for line in lines {
        merge_line(&line, params, &mut merged);
    }

    GroupedBoxes {
        horizontal: merged,
        free,
    }
}

/// Drops boxes whose longer side does not exceed `min_size`.
pub fn filter_min_size(boxes: GroupedBoxes, min_size: f32) -> GroupedBoxes {
    GroupedBoxes {
        horizontal: boxes
            .horizontal
            .into_iter()
            .filter(|q| q.width().max(q.height()) > min_size)
            .collect(),
        free: boxes
            .free
            .into_iter()
            .filter(|q| q.width().max(q.height()) > min_size)
            .collect(),
    }
}

fn group_into_lines(sorted: &[HorizontalBox], ycenter_ths: f32) -> Vec<Vec<HorizontalBox>> {
    let mut lines: Vec<Vec<HorizontalBox>> = Vec::new();
    let mut current: Vec<HorizontalBox> = Vec::new();
    let mut heights: Vec<f32> = Vec::new();
    let mut centers: Vec<f32> = Vec::new();

    for &hbox in sorted {
        if current.is_empty() {
            heights.push(hbox.height);
            centers.push(hbox.y_center);
            current.push(hbox);
            continue;
        }
        let mean_center = mean(&centers);
        let mean_height = mean(&heights);
        if (mean_center - hbox.y_center).abs() < ycenter_ths * mean_height {
            heights.push(hbox.height);
            centers.push(hbox.y_center);
            current.push(hbox);
        } else {
            lines.push(std::mem::take(&mut current));
            heights.clear();
            centers.clear();
            heights.push(hbox.height);
            centers.push(hbox.y_center);
            current.push(hbox);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn merge_line(line: &[HorizontalBox], params: GroupingParams, out: &mut Vec<Quad>) {
    if line.len() == 1 {
        let b = line[0];
        let margin = (params.add_margin * (b.x_max - b.x_min).min(b.height)).trunc();
        out.push(Quad::from_rect(
            b.x_min - margin,
            b.y_min - margin,
            b.x_max + margin,
            b.y_max + margin,
        ));
        return;
    }

    let mut boxes: Vec<HorizontalBox> = line.to_vec();
    boxes.sort_by(|a, b| {
        a.x_min
            .partial_cmp(&b.x_min)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut clusters: Vec<Vec<HorizontalBox>> = Vec::new();
    let mut current: Vec<HorizontalBox> = Vec::new();
    let mut heights: Vec<f32> = Vec::new();
    let mut reach_x = 0.0f32;

    for hbox in boxes {
        if current.is_empty() {
            heights.push(hbox.height);
            reach_x = hbox.x_max;
            current.push(hbox);
            continue;
        }
        let comparable_height = (mean(&heights) - hbox.height).abs()
            < params.height_ths * mean(&heights);
        let comparable_gap = (hbox.x_min - reach_x) < params.width_ths * (hbox.y_max - hbox.y_min);
        if comparable_height && comparable_gap {
            heights.push(hbox.height);
            reach_x = hbox.x_max;
            current.push(hbox);
        } else {
            clusters.push(std::mem::take(&mut current));
            heights.clear();
            heights.push(hbox.height);
            reach_x = hbox.x_max;
            current.push(hbox);
        }
    }
    if !current.is_empty() {
        clusters.push(current);
    }

    for cluster in clusters {
        let x_min = cluster.iter().map(|b| b.x_min).fold(f32::INFINITY, f32::min);
        let x_max = cluster
            .iter()
            .map(|b| b.x_max)
            .fold(f32::NEG_INFINITY, f32::max);
        let y_min = cluster.iter().map(|b| b.y_min).fold(f32::INFINITY, f32::min);
        let y_max = cluster
            .iter()
            .map(|b| b.y_max)
            .fold(f32::NEG_INFINITY, f32::max);
        let margin = (params.add_margin * (x_max - x_min).min(y_max - y_min)).trunc();
        out.push(Quad::from_rect(
            x_min - margin,
            y_min - margin,
            x_max + margin,
            y_max + margin,
        ));
    }
}

fn expand_free_quad(quad: &Quad, add_margin: f32) -> Quad {
    let p = &quad.0;
    let height = Point::new(p[3].x - p[0].x, p[3].y - p[0].y);
    let width = Point::new(p[1].x - p[0].x, p[1].y - p[0].y);
    let height = height.x.hypot(height.y);
    let width = width.x.hypot(width.y);
    let margin = (1.44 * add_margin * width.min(height)).trunc();

    // Expand along the two diagonals; each corner moves outward by the
    // margin in its diagonal's direction.
    let theta13 = ((p[0].y - p[2].y) / (p[0].x - p[2].x).max(10.0)).atan().abs();
    let theta24 = ((p[1].y - p[3].y) / (p[1].x - p[3].x).max(10.0)).atan().abs();
    Quad([
        Point::new(p[0].x - theta13.cos() * margin, p[0].y - theta13.sin() * margin),
        Point::new(p[1].x + theta24.cos() * margin, p[1].y - theta24.sin() * margin),
        Point::new(p[2].x + theta13.cos() * margin, p[2].y + theta13.sin() * margin),
        Point::new(p[3].x - theta24.cos() * margin, p[3].y + theta24.sin() * margin),
    ])
}

fn mean(values: &[f32]) -> f32 {
    values.iter().sum::<f32>() / values.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARAMS: GroupingParams = GroupingParams {
        slope_ths: 0.1,
        ycenter_ths: 0.5,
        height_ths: 0.5,
        width_ths: 0.5,
        add_margin: 0.1,
    };

    fn rect(x0: f32, y0: f32, x1: f32, y1: f32) -> Quad {
        Quad::from_rect(x0, y0, x1, y1)
    }

    #[test]
    fn flat_quads_are_horizontal_and_steep_quads_are_free() {
        let flat = rect(0.0, 0.0, 100.0, 20.0);
        let steep = Quad([
            Point::new(0.0, 0.0),
            Point::new(100.0, 40.0),
            Point::new(100.0, 60.0),
            Point::new(0.0, 20.0),
        ]);
        let grouped = group_text_boxes(&[flat, steep], PARAMS);
        assert_eq!(grouped.horizontal.len(), 1);
        assert_eq!(grouped.free.len(), 1);
    }

    #[test]
    fn nearby_boxes_on_one_line_merge() {
        // Two boxes with a 5px gap on the same baseline: gap 5 < 0.5 * 20
        let a = rect(0.0, 0.0, 50.0, 20.0);
        let b = rect(55.0, 0.0, 100.0, 20.0);
        let grouped = group_text_boxes(&[a, b], PARAMS);
        assert_eq!(grouped.horizontal.len(), 1);
        let merged = &grouped.horizontal[0];
        // union (0,0)-(100,20) plus trunc(0.1 * 20) = 2 margin
        assert_eq!(merged.x_min(), -2.0);
        assert_eq!(merged.y_min(), -2.0);
        assert_eq!(merged.x_max(), 102.0);
        assert_eq!(merged.y_max(), 22.0);
    }

    #[test]
    fn wide_gap_splits_clusters() {
        let a = rect(0.0, 0.0, 50.0, 20.0);
        let b = rect(80.0, 0.0, 130.0, 20.0); // gap 30 > 0.5 * 20
        let grouped = group_text_boxes(&[a, b], PARAMS);
        assert_eq!(grouped.horizontal.len(), 2);
    }

    #[test]
    fn different_lines_stay_separate() {
        let a = rect(0.0, 0.0, 50.0, 20.0);
        let b = rect(0.0, 50.0, 50.0, 70.0);
        let grouped = group_text_boxes(&[a, b], PARAMS);
        assert_eq!(grouped.horizontal.len(), 2);
    }

    #[test]
    fn height_mismatch_prevents_merge() {
        let a = rect(0.0, 0.0, 50.0, 20.0);
        let b = rect(52.0, -20.0, 100.0, 40.0); // height 60 vs 20
        let grouped = group_text_boxes(&[a, b], PARAMS);
        assert_eq!(grouped.horizontal.len(), 2);
    }

    #[test]
    fn grouping_is_idempotent_without_margin() {
        let params = GroupingParams {
            add_margin: 0.0,
            ..PARAMS
        };
        let input = vec![
            rect(0.0, 0.0, 50.0, 20.0),
            rect(55.0, 0.0, 100.0, 20.0),
            rect(0.0, 60.0, 80.0, 84.0),
        ];
        let once = group_text_boxes(&input, params);
        let twice = group_text_boxes(&once.horizontal, params);
        assert_eq!(once, twice);
    }

    #[test]
    fn min_size_filter_drops_small_boxes() {
        let grouped = GroupedBoxes {
            horizontal: vec![rect(0.0, 0.0, 15.0, 15.0), rect(0.0, 0.0, 30.0, 10.0)],
            free: vec![rect(0.0, 0.0, 10.0, 10.0)],
        };
        let filtered = filter_min_size(grouped, 20.0);
        assert_eq!(filtered.horizontal.len(), 1);
        assert!(filtered.free.is_empty());
    }

    #[test]
    fn free_quad_margin_moves_corners_outward() {
        let steep = Quad([
            Point::new(10.0, 10.0),
            Point::new(110.0, 50.0),
            Point::new(110.0, 80.0),
            Point::new(10.0, 40.0),
        ]);
        let params = GroupingParams {
            slope_ths: 0.1,
            ..PARAMS
        };
        let grouped = group_text_boxes(&[steep], params);
        assert_eq!(grouped.free.len(), 1);
        let expanded = &grouped.free[0];
        assert!(expanded.0[0].x < steep.0[0].x);
        assert!(expanded.0[0].y < steep.0[0].y);
        assert!(expanded.0[2].x > steep.0[2].x);
        assert!(expanded.0[2].y > steep.0[2].y);
    }
}
