//! Post-recognition line merging.
//!
//! Decoded regions are grouped by their rotation tag (exact angle, so probe
//! variants never cross), split into lines by y-center, and merged along x
//! when the gap stays within `x_ths` times the running line's height. Merged
//! regions join their text with a single space, keep the minimum member
//! confidence, and cover the axis-aligned union of their members. Regions
//! rotated beyond `max_angle_deg` are never merged.

use crate::processors::geometry::Quad;

/// A decoded region with its rotation tag, prior to result emission.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedRegion {
    /// The region polygon in original-image coordinates.
    pub quad: Quad,
    /// Decoded text.
    pub text: String,
    /// Decoder confidence.
    pub confidence: f32,
    /// Rotation probe angle this region came from (0 when unrotated).
    pub rotation_deg: i32,
}

/// Thresholds for the post-recognition merge.
#[derive(Debug, Clone, Copy)]
pub struct MergeParams {
    /// Gap threshold, scaled by the running line's height.
    pub x_ths: f32,
    /// Line membership threshold on the y-center, scaled by line height.
    pub y_ths: f32,
    /// Regions whose top edge exceeds this angle stay unmerged.
    pub max_angle_deg: f32,
}

/// Merges recognized regions into lines.
pub fn merge_lines(regions: Vec<RecognizedRegion>, params: MergeParams) -> Vec<RecognizedRegion> {
    // Group by exact rotation tag, preserving first-seen group order.
    let mut groups: Vec<(i32, Vec<RecognizedRegion>)> = Vec::new();
    for region in regions {
        match groups.iter_mut().find(|(tag, _)| *tag == region.rotation_deg) {
            Some((_, members)) => members.push(region),
            None => groups.push((region.rotation_deg, vec![region])),
        }
    }

    let mut out = Vec::new();
    for (_, members) in groups {
        merge_group(members, params, &mut out);
    }
    out
}

fn merge_group(members: Vec<RecognizedRegion>, params: MergeParams, out: &mut Vec<RecognizedRegion>) {
    let mut mergeable = Vec::new();
    for region in members {
        if region.quad.top_edge_angle_deg() <= params.max_angle_deg {
            mergeable.push(region);
        } else {
            out.push(region);
        }
    }

    mergeable.sort_by(|a, b| {
        let ca = 0.5 * (a.quad.y_min() + a.quad.y_max());
        let cb = 0.5 * (b.quad.y_min() + b.quad.y_max());
        ca.partial_cmp(&cb).unwrap_or(std::cmp::Ordering::Equal)
    });

    // Line grouping by y-center against the running line mean.
    let mut lines: Vec<Vec<RecognizedRegion>> = Vec::new();
    let mut current: Vec<RecognizedRegion> = Vec::new();
    let mut centers: Vec<f32> = Vec::new();
    let mut heights: Vec<f32> = Vec::new();
    for region in mergeable {
        let center = 0.5 * (region.quad.y_min() + region.quad.y_max());
        let height = region.quad.height();
        if current.is_empty()
            || (mean(&centers) - center).abs() < params.y_ths * mean(&heights)
        {
            centers.push(center);
            heights.push(height);
            current.push(region);
        } else {
            lines.push(std::mem::take(&mut current));
            centers.clear();
            heights.clear();
            centers.push(center);
            heights.push(height);
            current.push(region);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    for mut line in lines {
        line.sort_by(|a, b| {
            a.quad
                .x_min()
                .partial_cmp(&b.quad.x_min())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut cluster: Vec<RecognizedRegion> = Vec::new();
        let mut cluster_heights: Vec<f32> = Vec::new();
        let mut reach_x = 0.0f32;
        for region in line {
            if cluster.is_empty() {
                cluster_heights.push(region.quad.height());
                reach_x = region.quad.x_max();
                cluster.push(region);
                continue;
            }
            let gap = region.quad.x_min() - reach_x;
            if gap <= params.x_ths * mean(&cluster_heights) {
                cluster_heights.push(region.quad.height());
                reach_x = reach_x.max(region.quad.x_max());
                cluster.push(region);
            } else {
                out.push(collapse_cluster(std::mem::take(&mut cluster)));
                cluster_heights.clear();
                cluster_heights.push(region.quad.height());
                reach_x = region.quad.x_max();
                cluster.push(region);
            }
        }
        if !cluster.is_empty() {
            out.push(collapse_cluster(cluster));
        }
    }
}

fn collapse_cluster(mut cluster: Vec<RecognizedRegion>) -> RecognizedRegion {
    if cluster.len() == 1 {
        return cluster.pop().expect("non-empty cluster");
    }
    let rotation_deg = cluster[0].rotation_deg;
    let mut quad = cluster[0].quad;
    let mut confidence = f32::INFINITY;
    let mut texts = Vec::with_capacity(cluster.len());
    for member in &cluster {
        quad = quad.union(&member.quad);
        confidence = confidence.min(member.confidence);
        texts.push(member.text.as_str());
    }
    RecognizedRegion {
        quad,
        text: texts.join(" "),
        confidence,
        rotation_deg,
    }
}

fn mean(values: &[f32]) -> f32 {
    values.iter().sum::<f32>() / values.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::geometry::Point;

    const PARAMS: MergeParams = MergeParams {
        x_ths: 1.0,
        y_ths: 0.5,
        max_angle_deg: 10.0,
    };

    fn region(x0: f32, y0: f32, x1: f32, y1: f32, text: &str, conf: f32) -> RecognizedRegion {
        RecognizedRegion {
            quad: Quad::from_rect(x0, y0, x1, y1),
            text: text.to_string(),
            confidence: conf,
            rotation_deg: 0,
        }
    }

    fn rotated_region(angle_deg: f32, x0: f32, text: &str) -> RecognizedRegion {
        let rad = angle_deg.to_radians();
        let (w, h) = (30.0, 10.0);
        let p0 = Point::new(x0, 0.0);
        let p1 = Point::new(x0 + w * rad.cos(), w * rad.sin());
        let p2 = Point::new(p1.x - h * rad.sin(), p1.y + h * rad.cos());
        let p3 = Point::new(p0.x - h * rad.sin(), p0.y + h * rad.cos());
        RecognizedRegion {
            quad: Quad([p0, p1, p2, p3]),
            text: text.to_string(),
            confidence: 0.9,
            rotation_deg: 0,
        }
    }

    #[test]
    fn golden_three_boxes_merge_first_two() {
        let regions = vec![
            region(0.0, 0.0, 10.0, 10.0, "foo", 0.9),
            region(15.0, 0.0, 25.0, 10.0, "bar", 0.7),
            region(40.0, 0.0, 50.0, 10.0, "baz", 0.8),
        ];
        let merged = merge_lines(regions, PARAMS);
        assert_eq!(merged.len(), 2);
        let foobar = merged
            .iter()
            .find(|r| r.text == "foo bar")
            .expect("first two merge");
        assert_eq!(foobar.confidence, 0.7);
        assert_eq!(foobar.quad, Quad::from_rect(0.0, 0.0, 25.0, 10.0));
        assert!(merged.iter().any(|r| r.text == "baz"));
    }

    #[test]
    fn different_lines_do_not_merge() {
        let regions = vec![
            region(0.0, 0.0, 10.0, 10.0, "top", 0.9),
            region(0.0, 30.0, 10.0, 40.0, "bottom", 0.9),
        ];
        let merged = merge_lines(regions, PARAMS);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn rotation_tags_partition_groups() {
        let mut a = region(0.0, 0.0, 10.0, 10.0, "foo", 0.9);
        let mut b = region(12.0, 0.0, 22.0, 10.0, "bar", 0.9);
        a.rotation_deg = 0;
        b.rotation_deg = 90;
        let merged = merge_lines(vec![a, b], PARAMS);
        assert_eq!(merged.len(), 2, "different tags never merge");
    }

    #[test]
    fn rotation_boundary_controls_mergeability() {
        // two 9.9-degree rectangles on one line merge
        let a = rotated_region(9.9, 0.0, "left");
        let b = rotated_region(9.9, 32.0, "right");
        let merged = merge_lines(vec![a, b], PARAMS);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].text, "left right");

        // 9.9 and 10.1 degrees: the steeper one is not merge-eligible
        let a = rotated_region(9.9, 0.0, "left");
        let b = rotated_region(10.1, 32.0, "right");
        let merged = merge_lines(vec![a, b], PARAMS);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn text_joins_in_x_order_even_when_input_is_shuffled() {
        let regions = vec![
            region(15.0, 0.0, 25.0, 10.0, "world", 0.8),
            region(0.0, 0.0, 10.0, 10.0, "hello", 0.9),
        ];
        let merged = merge_lines(regions, PARAMS);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].text, "hello world");
    }
}
