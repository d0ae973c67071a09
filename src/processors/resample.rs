//! Resampling and padding primitives.
//!
//! The coordinate mapping is pixel-center aligned for both kernels: the
//! source coordinate for destination `(x, y)` is
//! `sx = (x + 0.5) * (W / W') - 0.5`, clamped to `[0, W - 1]`, and likewise
//! for `y`. Outputs are rounded back to `u8`. These details are load-bearing:
//! the detector and recognizer were trained against exactly this arithmetic.

use crate::core::errors::OCRError;
use crate::processors::raster::RasterImage;

/// Catmull-Rom cubic kernel (`a = -0.5`).
#[inline]
fn cubic_kernel(t: f32) -> f32 {
    let t = t.abs();
    if t <= 1.0 {
        (1.5 * t - 2.5) * t * t + 1.0
    } else if t < 2.0 {
        ((-0.5 * t + 2.5) * t - 4.0) * t + 2.0
    } else {
        0.0
    }
}

#[inline]
fn source_coord(dst: usize, ratio: f32, limit: usize) -> f32 {
    ((dst as f32 + 0.5) * ratio - 0.5).clamp(0.0, (limit - 1) as f32)
}

/// Bilinear resize with pixel-center coordinate mapping.
///
/// # Arguments
///
/// * `src` - The source image, any channel count.
/// * `dst_width` - Target width in pixels.
/// * `dst_height` - Target height in pixels.
///
/// # Returns
///
/// The resized image with the source's channel order, or an error for a
/// zero-sized target.
pub fn resize_bilinear(
    src: &RasterImage,
    dst_width: usize,
    dst_height: usize,
) -> Result<RasterImage, OCRError> {
    if dst_width == 0 || dst_height == 0 {
        return Err(OCRError::invalid_input(format!(
            "resize target must be positive, got {dst_width}x{dst_height}"
        )));
    }
    let channels = src.channels();
    let x_ratio = src.width as f32 / dst_width as f32;
    let y_ratio = src.height as f32 / dst_height as f32;

    let mut data = vec![0u8; dst_width * dst_height * channels];
    for y in 0..dst_height {
        let sy = source_coord(y, y_ratio, src.height);
        let y0 = sy.floor() as usize;
        let y1 = (y0 + 1).min(src.height - 1);
        let fy = sy - y0 as f32;
        for x in 0..dst_width {
            let sx = source_coord(x, x_ratio, src.width);
            let x0 = sx.floor() as usize;
            let x1 = (x0 + 1).min(src.width - 1);
            let fx = sx - x0 as f32;

            let p00 = src.pixel_offset(x0, y0);
            let p10 = src.pixel_offset(x1, y0);
            let p01 = src.pixel_offset(x0, y1);
            let p11 = src.pixel_offset(x1, y1);
            let dst = (y * dst_width + x) * channels;
            for c in 0..channels {
                let top = src.data[p00 + c] as f32 * (1.0 - fx) + src.data[p10 + c] as f32 * fx;
                let bottom = src.data[p01 + c] as f32 * (1.0 - fx) + src.data[p11 + c] as f32 * fx;
                let value = top * (1.0 - fy) + bottom * fy;
                data[dst + c] = value.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
    RasterImage::new(data, dst_width, dst_height, src.order)
}

/// Bicubic resize with the Catmull-Rom kernel and per-pixel weight
/// renormalization.
///
/// Taps outside the image are clamped to the border; the weight sum is
/// divided out so clamped taps cannot overshoot.
pub fn resize_bicubic(
    src: &RasterImage,
    dst_width: usize,
    dst_height: usize,
) -> Result<RasterImage, OCRError> {
    if dst_width == 0 || dst_height == 0 {
        return Err(OCRError::invalid_input(format!(
            "resize target must be positive, got {dst_width}x{dst_height}"
        )));
    }
    let channels = src.channels();
    let x_ratio = src.width as f32 / dst_width as f32;
    let y_ratio = src.height as f32 / dst_height as f32;

    let mut data = vec![0u8; dst_width * dst_height * channels];
    let mut accum = vec![0.0f32; channels];
    for y in 0..dst_height {
        let sy = source_coord(y, y_ratio, src.height);
        let y_int = sy.floor() as i64;
        let dy = sy - y_int as f32;
        let wy = [
            cubic_kernel(dy + 1.0),
            cubic_kernel(dy),
            cubic_kernel(dy - 1.0),
            cubic_kernel(dy - 2.0),
        ];
        for x in 0..dst_width {
            let sx = source_coord(x, x_ratio, src.width);
            let x_int = sx.floor() as i64;
            let dx = sx - x_int as f32;
            let wx = [
                cubic_kernel(dx + 1.0),
                cubic_kernel(dx),
                cubic_kernel(dx - 1.0),
                cubic_kernel(dx - 2.0),
            ];

            accum.fill(0.0);
            let mut weight_sum = 0.0f32;
            for (j, &weight_y) in wy.iter().enumerate() {
                let sample_y =
                    (y_int - 1 + j as i64).clamp(0, src.height as i64 - 1) as usize;
                for (i, &weight_x) in wx.iter().enumerate() {
                    let sample_x =
                        (x_int - 1 + i as i64).clamp(0, src.width as i64 - 1) as usize;
                    let weight = weight_x * weight_y;
                    weight_sum += weight;
                    let offset = src.pixel_offset(sample_x, sample_y);
                    for (c, acc) in accum.iter_mut().enumerate() {
                        *acc += weight * src.data[offset + c] as f32;
                    }
                }
            }

            let dst = (y * dst_width + x) * channels;
            for c in 0..channels {
                let value = if weight_sum.abs() > f32::EPSILON {
                    accum[c] / weight_sum
                } else {
                    accum[c]
                };
                data[dst + c] = value.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
    RasterImage::new(data, dst_width, dst_height, src.order)
}

/// Result of an aspect-preserving long-side resize.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LongSideResize {
    /// Width after the resize.
    pub width: usize,
    /// Height after the resize.
    pub height: usize,
    /// `width / original_width`.
    pub scale_x: f32,
    /// `height / original_height`.
    pub scale_y: f32,
}

/// Resizes so that `max(W', H') == target_long` while preserving aspect.
///
/// Target dimensions are floored (minimum 1). Padding to a stride is a
/// separate explicit step; this matches the detector's dynamic-shape
/// contract.
pub fn resize_long_side(
    src: &RasterImage,
    target_long: usize,
) -> Result<(RasterImage, LongSideResize), OCRError> {
    if target_long == 0 {
        return Err(OCRError::invalid_input("target side must be positive"));
    }
    let long = src.width.max(src.height);
    let scale = target_long as f32 / long as f32;
    let width = ((src.width as f32 * scale) as usize).max(1);
    let height = ((src.height as f32 * scale) as usize).max(1);
    let resized = resize_bilinear(src, width, height)?;
    let info = LongSideResize {
        width,
        height,
        scale_x: width as f32 / src.width as f32,
        scale_y: height as f32 / src.height as f32,
    };
    Ok((resized, info))
}

/// Pads right/bottom with zero bytes so both dimensions are multiples of
/// `align`. Returns the padded image and the (right, bottom) pad amounts.
pub fn pad_to_stride(
    src: &RasterImage,
    align: usize,
) -> Result<(RasterImage, usize, usize), OCRError> {
    if align == 0 {
        return Err(OCRError::invalid_input("stride must be positive"));
    }
    let target_w = src.width.div_ceil(align) * align;
    let target_h = src.height.div_ceil(align) * align;
    let pad_right = target_w - src.width;
    let pad_bottom = target_h - src.height;
    if pad_right == 0 && pad_bottom == 0 {
        return Ok((src.clone(), 0, 0));
    }
    let channels = src.channels();
    let mut data = vec![0u8; target_w * target_h * channels];
    for y in 0..src.height {
        let src_start = y * src.width * channels;
        let dst_start = y * target_w * channels;
        data[dst_start..dst_start + src.width * channels]
            .copy_from_slice(&src.data[src_start..src_start + src.width * channels]);
    }
    let padded = RasterImage::new(data, target_w, target_h, src.order)?;
    Ok((padded, pad_right, pad_bottom))
}

/// Replicate-pads a CHW float buffer to `target_width` by repeating the last
/// valid column. Identity when `width >= target_width`.
pub fn replicate_pad_width(
    data: &[f32],
    channels: usize,
    height: usize,
    width: usize,
    target_width: usize,
) -> Result<Vec<f32>, OCRError> {
    pad_width_impl(data, channels, height, width, target_width, None)
}

/// Right-pads a CHW float buffer to `target_width` with a constant fill
/// value. Identity when `width >= target_width`.
pub fn pad_width_with_value(
    data: &[f32],
    channels: usize,
    height: usize,
    width: usize,
    target_width: usize,
    fill: f32,
) -> Result<Vec<f32>, OCRError> {
    pad_width_impl(data, channels, height, width, target_width, Some(fill))
}

fn pad_width_impl(
    data: &[f32],
    channels: usize,
    height: usize,
    width: usize,
    target_width: usize,
    fill: Option<f32>,
) -> Result<Vec<f32>, OCRError> {
    if data.len() != channels * height * width {
        return Err(OCRError::invalid_input(format!(
            "CHW buffer length {} does not match {channels}x{height}x{width}",
            data.len()
        )));
    }
    if width >= target_width {
        return Ok(data.to_vec());
    }
    let mut out = vec![0.0f32; channels * height * target_width];
    for c in 0..channels {
        for y in 0..height {
            let src_row = (c * height + y) * width;
            let dst_row = (c * height + y) * target_width;
            out[dst_row..dst_row + width].copy_from_slice(&data[src_row..src_row + width]);
            let pad_value = fill.unwrap_or(data[src_row + width - 1]);
            for x in width..target_width {
                out[dst_row + x] = pad_value;
            }
        }
    }
    Ok(out)
}
