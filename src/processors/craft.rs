//! Detector heatmap post-processing.
//!
//! Turns the CRAFT text/link score maps into quadrilaterals: threshold both
//! maps, flood-fill connected components over their union, suppress link-only
//! pixels, dilate each component adaptively, and wrap the surviving pixels in
//! a minimum-area rectangle. Coordinates stay in heatmap space here;
//! [`adjust_to_original`] projects them back to the input image.

use crate::core::constants::MIN_COMPONENT_AREA;
use crate::core::tensor::Tensor2D;
use crate::processors::geometry::{Point, Quad, axis_aligned_bounds, min_area_rect};

/// Thresholds applied to the score maps.
#[derive(Debug, Clone, Copy)]
pub struct CraftThresholds {
    /// Peak text score a component must reach.
    pub text_threshold: f32,
    /// Per-pixel text inclusion threshold.
    pub low_text: f32,
    /// Per-pixel link inclusion threshold.
    pub link_threshold: f32,
}

struct Component {
    pixels: Vec<(usize, usize)>,
    min_x: usize,
    max_x: usize,
    min_y: usize,
    max_y: usize,
    peak_text: f32,
}

/// Decodes boxes from the text/link heatmaps.
///
/// # Arguments
///
/// * `text_map` - Per-pixel text score at detector output resolution.
/// * `link_map` - Per-pixel link score, same shape as `text_map`.
/// * `thresholds` - Component validity and inclusion thresholds.
///
/// # Returns
///
/// Quadrilaterals in heatmap coordinates, clockwise from the min(x+y)
/// corner. Mismatched or empty maps produce no boxes.
pub fn extract_boxes(
    text_map: &Tensor2D,
    link_map: &Tensor2D,
    thresholds: CraftThresholds,
) -> Vec<Quad> {
    let (height, width) = text_map.dim();
    if link_map.dim() != (height, width) || height == 0 || width == 0 {
        return Vec::new();
    }

    let text_score: Vec<bool> = text_map.iter().map(|&v| v > thresholds.low_text).collect();
    let link_score: Vec<bool> = link_map
        .iter()
        .map(|&v| v > thresholds.link_threshold)
        .collect();
    let combined: Vec<bool> = text_score
        .iter()
        .zip(&link_score)
        .map(|(&t, &l)| t || l)
        .collect();

    let mut visited = vec![false; width * height];
    let mut boxes = Vec::new();
    let mut stack = Vec::new();

    for start in 0..width * height {
        if visited[start] || !combined[start] {
            continue;
        }
        let component = flood_fill(
            start,
            width,
            height,
            &combined,
            &mut visited,
            &mut stack,
            text_map,
        );

        if component.pixels.len() < MIN_COMPONENT_AREA
            || component.peak_text < thresholds.text_threshold
        {
            continue;
        }

        if let Some(quad) = component_to_quad(&component, &text_score, &link_score, width, height) {
            boxes.push(quad);
        }
    }
    boxes
}

fn flood_fill(
    start: usize,
    width: usize,
    height: usize,
    combined: &[bool],
    visited: &mut [bool],
    stack: &mut Vec<usize>,
    text_map: &Tensor2D,
) -> Component {
    let mut component = Component {
        pixels: Vec::new(),
        min_x: usize::MAX,
        max_x: 0,
        min_y: usize::MAX,
        max_y: 0,
        peak_text: f32::NEG_INFINITY,
    };

    visited[start] = true;
    stack.push(start);
    while let Some(index) = stack.pop() {
        let x = index % width;
        let y = index / width;
        component.pixels.push((x, y));
        component.min_x = component.min_x.min(x);
        component.max_x = component.max_x.max(x);
        component.min_y = component.min_y.min(y);
        component.max_y = component.max_y.max(y);
        component.peak_text = component.peak_text.max(text_map[[y, x]]);

        if x > 0 && combined[index - 1] && !visited[index - 1] {
            visited[index - 1] = true;
            stack.push(index - 1);
        }
        if x + 1 < width && combined[index + 1] && !visited[index + 1] {
            visited[index + 1] = true;
            stack.push(index + 1);
        }
        if y > 0 && combined[index - width] && !visited[index - width] {
            visited[index - width] = true;
            stack.push(index - width);
        }
        if y + 1 < height && combined[index + width] && !visited[index + width] {
            visited[index + width] = true;
            stack.push(index + width);
        }
    }
    component
}

fn component_to_quad(
    component: &Component,
    text_score: &[bool],
    link_score: &[bool],
    width: usize,
    height: usize,
) -> Option<Quad> {
    // Component mask with link-only pixels suppressed: link regions join
    // characters but must not bleed into the rectangle themselves.
    let mut segmap = vec![false; width * height];
    for &(x, y) in &component.pixels {
        let index = y * width + x;
        if link_score[index] && !text_score[index] {
            continue;
        }
        segmap[index] = true;
    }

    let area = component.pixels.len();
    let bw = component.max_x - component.min_x + 1;
    let bh = component.max_y - component.min_y + 1;
    let niter =
        ((area as f32 * bw.min(bh) as f32 / (bw as f32 * bh as f32)).sqrt() * 2.0) as usize;

    // Dilate within a niter-extended window around the component, square
    // kernel of size 1 + niter, anchor at the kernel center.
    let sx = component.min_x.saturating_sub(niter);
    let sy = component.min_y.saturating_sub(niter);
    let ex = (component.max_x + niter + 2).min(width);
    let ey = (component.max_y + niter + 2).min(height);
    let dilated = dilate_window(&segmap, width, sx, sy, ex, ey, 1 + niter);

    let mut points = Vec::new();
    for y in sy..ey {
        for x in sx..ex {
            if dilated[(y - sy) * (ex - sx) + (x - sx)] {
                points.push(Point::new(x as f32, y as f32));
            }
        }
    }
    if points.is_empty() {
        return None;
    }

    let rect = min_area_rect(&points);
    let w = rect.0[0].distance(&rect.0[1]);
    let h = rect.0[1].distance(&rect.0[2]);
    let box_ratio = w.max(h) / (w.min(h) + 1e-5);
    let quad = if (1.0 - box_ratio).abs() <= 0.1 {
        // Nearly square rectangles are unstable under rotation; use the
        // axis-aligned bounds of the dilated foreground instead.
        axis_aligned_bounds(&points)
    } else {
        rect
    };

    Some(quad.ordered_clockwise())
}

fn dilate_window(
    segmap: &[bool],
    width: usize,
    sx: usize,
    sy: usize,
    ex: usize,
    ey: usize,
    kernel: usize,
) -> Vec<bool> {
    let window_w = ex - sx;
    let window_h = ey - sy;
    let anchor = (kernel / 2) as i64;
    let mut out = vec![false; window_w * window_h];

    for wy in 0..window_h {
        for wx in 0..window_w {
            let mut hit = false;
            'scan: for ky in 0..kernel as i64 {
                let src_y = wy as i64 + ky - anchor;
                if src_y < 0 || src_y >= window_h as i64 {
                    continue;
                }
                for kx in 0..kernel as i64 {
                    let src_x = wx as i64 + kx - anchor;
                    if src_x < 0 || src_x >= window_w as i64 {
                        continue;
                    }
                    let gx = sx + src_x as usize;
                    let gy = sy + src_y as usize;
                    if segmap[gy * width + gx] {
                        hit = true;
                        break 'scan;
                    }
                }
            }
            out[wy * window_w + wx] = hit;
        }
    }
    out
}

/// Projects heatmap-space quads back to original-image coordinates.
///
/// `scale_x`/`scale_y` are the detector resize scales and `stride_x`/
/// `stride_y` the ratio of padded input size to heatmap size, derived from
/// the actual tensors rather than hard-coded.
pub fn adjust_to_original(
    boxes: &[Quad],
    scale_x: f32,
    scale_y: f32,
    stride_x: f32,
    stride_y: f32,
) -> Vec<Quad> {
    boxes
        .iter()
        .map(|quad| {
            Quad(quad.0.map(|p| {
                Point::new(p.x * stride_x / scale_x, p.y * stride_y / scale_y)
            }))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESHOLDS: CraftThresholds = CraftThresholds {
        text_threshold: 0.7,
        low_text: 0.4,
        link_threshold: 0.4,
    };

    fn map_with_block(
        height: usize,
        width: usize,
        x0: usize,
        y0: usize,
        bw: usize,
        bh: usize,
        value: f32,
    ) -> Tensor2D {
        let mut map = Tensor2D::zeros((height, width));
        for y in y0..y0 + bh {
            for x in x0..x0 + bw {
                map[[y, x]] = value;
            }
        }
        map
    }

    #[test]
    fn block_of_text_produces_exactly_one_box() {
        // 3x4 block of 0.9 scores in an 8x8 map
        let text = map_with_block(8, 8, 2, 3, 4, 3, 0.9);
        let link = Tensor2D::zeros((8, 8));
        let boxes = extract_boxes(&text, &link, THRESHOLDS);
        assert_eq!(boxes.len(), 1);
        let quad = &boxes[0];
        assert!(quad.width() >= 3.0);
        assert!(quad.height() >= 2.0);
        assert!(quad.is_finite());
    }

    #[test]
    fn small_or_weak_components_are_discarded() {
        // area 9 < 10
        let text = map_with_block(8, 8, 0, 0, 3, 3, 0.9);
        let link = Tensor2D::zeros((8, 8));
        assert!(extract_boxes(&text, &link, THRESHOLDS).is_empty());

        // big enough but peak below text_threshold
        let text = map_with_block(8, 8, 0, 0, 4, 4, 0.5);
        assert!(extract_boxes(&text, &link, THRESHOLDS).is_empty());
    }

    #[test]
    fn link_pixels_bridge_components_but_do_not_shape_them() {
        // Two 3x3 text blocks joined by a one-pixel-wide link line.
        let mut text = Tensor2D::zeros((9, 16));
        for y in 2..5 {
            for x in 1..4 {
                text[[y, x]] = 0.9;
            }
            for x in 11..14 {
                text[[y, x]] = 0.9;
            }
        }
        let mut link = Tensor2D::zeros((9, 16));
        for x in 4..11 {
            link[[3, x]] = 0.9;
        }

        let boxes = extract_boxes(&text, &link, THRESHOLDS);
        assert_eq!(boxes.len(), 1, "link joins the blocks into one component");
        // Without the link both halves are below the area threshold of one
        // merged component, so they come out as two boxes.
        let no_link = Tensor2D::zeros((9, 16));
        let boxes = extract_boxes(&text, &no_link, THRESHOLDS);
        assert_eq!(boxes.len(), 0, "3x3 blocks alone are under the area floor");
    }

    #[test]
    fn separate_components_yield_separate_boxes() {
        let mut text = Tensor2D::zeros((16, 16));
        for y in 1..4 {
            for x in 1..6 {
                text[[y, x]] = 0.9;
            }
        }
        for y in 10..13 {
            for x in 8..14 {
                text[[y, x]] = 0.9;
            }
        }
        let link = Tensor2D::zeros((16, 16));
        let boxes = extract_boxes(&text, &link, THRESHOLDS);
        assert_eq!(boxes.len(), 2);
    }

    #[test]
    fn adjust_divides_by_scale_over_stride() {
        let quad = Quad::from_rect(10.0, 20.0, 30.0, 40.0);
        let adjusted = adjust_to_original(&[quad], 0.5, 0.5, 2.0, 2.0);
        assert_eq!(adjusted[0].x_min(), 40.0);
        assert_eq!(adjusted[0].y_min(), 80.0);
        assert_eq!(adjusted[0].x_max(), 120.0);
        assert_eq!(adjusted[0].y_max(), 160.0);
    }

    #[test]
    fn empty_maps_produce_no_boxes() {
        let zeros = Tensor2D::zeros((8, 8));
        assert!(extract_boxes(&zeros, &zeros, THRESHOLDS).is_empty());
    }
}
