//! Perspective rectification for free-form quadrilaterals.
//!
//! The homography mapping a source quad to the output rectangle is found by
//! solving the standard 8-equation linear system; sampling uses the inverse
//! transform with nearest-neighbor lookup clamped to the source bounds, which
//! is what the recognizer was validated against.

use crate::core::errors::OCRError;
use crate::processors::geometry::Point;
use crate::processors::raster::RasterImage;
use nalgebra::{Matrix3, Vector3};
use rayon::prelude::*;

/// Solves the 3x3 homography mapping `src` points onto `dst` points.
pub fn perspective_transform(
    src: &[Point; 4],
    dst: &[Point; 4],
) -> Result<Matrix3<f32>, OCRError> {
    let mut a = nalgebra::DMatrix::<f32>::zeros(8, 8);
    let mut b = nalgebra::DVector::<f32>::zeros(8);

    for i in 0..4 {
        let s = &src[i];
        let d = &dst[i];
        a.set_row(
            i * 2,
            &nalgebra::RowDVector::from_row_slice(&[
                s.x,
                s.y,
                1.0,
                0.0,
                0.0,
                0.0,
                -s.x * d.x,
                -s.y * d.x,
            ]),
        );
        b[i * 2] = d.x;
        a.set_row(
            i * 2 + 1,
            &nalgebra::RowDVector::from_row_slice(&[
                0.0,
                0.0,
                0.0,
                s.x,
                s.y,
                1.0,
                -s.x * d.y,
                -s.y * d.y,
            ]),
        );
        b[i * 2 + 1] = d.y;
    }

    let solution = a.lu().solve(&b).ok_or_else(|| {
        OCRError::processing(
            crate::core::errors::ProcessingStage::Rectification,
            "perspective system is singular",
            std::io::Error::other("degenerate quadrilateral"),
        )
    })?;

    Ok(Matrix3::new(
        solution[0],
        solution[1],
        solution[2],
        solution[3],
        solution[4],
        solution[5],
        solution[6],
        solution[7],
        1.0,
    ))
}

/// Warps the region under `quad` to an upright `width x height` image.
///
/// The quad's corners map to `(0,0)`, `(width-1,0)`, `(width-1,height-1)`,
/// `(0,height-1)` in order. Each output pixel back-projects through the
/// inverse homography and samples the nearest source pixel, clamped to
/// bounds.
pub fn warp_quad(
    src: &RasterImage,
    quad: &[Point; 4],
    width: usize,
    height: usize,
) -> Result<RasterImage, OCRError> {
    if width == 0 || height == 0 {
        return Err(OCRError::invalid_input(format!(
            "warp target must be positive, got {width}x{height}"
        )));
    }
    let dst = [
        Point::new(0.0, 0.0),
        Point::new(width as f32 - 1.0, 0.0),
        Point::new(width as f32 - 1.0, height as f32 - 1.0),
        Point::new(0.0, height as f32 - 1.0),
    ];
    let forward = perspective_transform(quad, &dst)?;
    let inverse = forward.try_inverse().ok_or_else(|| {
        OCRError::processing(
            crate::core::errors::ProcessingStage::Rectification,
            "perspective matrix is not invertible",
            std::io::Error::other("singular homography"),
        )
    })?;

    let channels = src.channels();
    let mut data = vec![0u8; width * height * channels];

    let fill_row = |dst_y: usize, row: &mut [u8]| {
        for dst_x in 0..width {
            let back = inverse * Vector3::new(dst_x as f32, dst_y as f32, 1.0);
            let (src_x, src_y) = if back.z.abs() > f32::EPSILON {
                (back.x / back.z, back.y / back.z)
            } else {
                (0.0, 0.0)
            };
            let sx = (src_x.round() as i64).clamp(0, src.width as i64 - 1) as usize;
            let sy = (src_y.round() as i64).clamp(0, src.height as i64 - 1) as usize;
            let src_offset = src.pixel_offset(sx, sy);
            let dst_offset = dst_x * channels;
            row[dst_offset..dst_offset + channels]
                .copy_from_slice(&src.data[src_offset..src_offset + channels]);
        }
    };

    // Sequential fast path for small outputs, rayon rows otherwise.
    if height <= 8 {
        for (dst_y, row) in data.chunks_mut(width * channels).enumerate() {
            fill_row(dst_y, row);
        }
    } else {
        data.par_chunks_mut(width * channels)
            .enumerate()
            .for_each(|(dst_y, row)| fill_row(dst_y, row));
    }

    RasterImage::new(data, width, height, src.order)
}
