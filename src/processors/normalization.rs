//! Mean/variance normalization and tensor layout packing.
//!
//! The detector consumes RGB statistics; BGR and BGRA buffers are
//! channel-swapped during normalization rather than reordered in place, and
//! grayscale inputs broadcast their single channel. The float image is laid
//! out HWC and packed to NCHW as a separate step so both forms can be traced.

use crate::core::errors::OCRError;
use crate::core::tensor::{Tensor3D, Tensor4D};
use crate::processors::raster::RasterImage;

/// Converts a raster image to a normalized HWC float image:
/// `(pixel / 255 - mean[c]) / std[c]` with channels in RGB order.
pub fn normalize_mean_variance(
    img: &RasterImage,
    mean: &[f32; 3],
    std: &[f32; 3],
) -> Result<Tensor3D, OCRError> {
    for (i, &s) in std.iter().enumerate() {
        if s <= 0.0 {
            return Err(OCRError::config(format!(
                "std[{i}] must be greater than 0, got {s}"
            )));
        }
    }
    let offsets = img.order.rgb_offsets();
    let channels = img.channels();
    let mut out = Tensor3D::zeros((img.height, img.width, 3));
    for y in 0..img.height {
        for x in 0..img.width {
            let base = (y * img.width + x) * channels;
            for c in 0..3 {
                let value = img.data[base + offsets[c]] as f32 / 255.0;
                out[[y, x, c]] = (value - mean[c]) / std[c];
            }
        }
    }
    Ok(out)
}

/// Transposes a HWC float image to a `[1, C, H, W]` tensor.
pub fn hwc_to_nchw(hwc: &Tensor3D) -> Tensor4D {
    let (height, width, channels) = hwc.dim();
    Tensor4D::from_shape_fn((1, channels, height, width), |(_, c, y, x)| hwc[[y, x, c]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::raster::ChannelOrder;

    const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
    const STD: [f32; 3] = [0.229, 0.224, 0.225];

    #[test]
    fn zero_pixel_normalizes_to_negative_mean_over_std() {
        let img = RasterImage::new(vec![0, 0, 0], 1, 1, ChannelOrder::Rgb).unwrap();
        let out = normalize_mean_variance(&img, &MEAN, &STD).unwrap();
        for c in 0..3 {
            let expected = -MEAN[c] / STD[c];
            assert!((out[[0, 0, c]] - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn bgr_input_is_swapped_to_rgb_statistics() {
        let rgb = RasterImage::new(vec![200, 100, 50], 1, 1, ChannelOrder::Rgb).unwrap();
        let bgr = RasterImage::new(vec![50, 100, 200], 1, 1, ChannelOrder::Bgr).unwrap();
        let a = normalize_mean_variance(&rgb, &MEAN, &STD).unwrap();
        let b = normalize_mean_variance(&bgr, &MEAN, &STD).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn gray_input_broadcasts_its_channel() {
        let img = RasterImage::new(vec![128], 1, 1, ChannelOrder::Gray).unwrap();
        let out = normalize_mean_variance(&img, &MEAN, &STD).unwrap();
        for c in 0..3 {
            let expected = (128.0 / 255.0 - MEAN[c]) / STD[c];
            assert!((out[[0, 0, c]] - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn nchw_packing_transposes_axes() {
        let img = RasterImage::new(vec![255, 0, 0, 0, 255, 0], 2, 1, ChannelOrder::Rgb).unwrap();
        let hwc = normalize_mean_variance(&img, &[0.0; 3], &[1.0; 3]).unwrap();
        let nchw = hwc_to_nchw(&hwc);
        assert_eq!(nchw.shape(), &[1, 3, 1, 2]);
        assert_eq!(nchw[[0, 0, 0, 0]], 1.0); // R of pixel 0
        assert_eq!(nchw[[0, 1, 0, 1]], 1.0); // G of pixel 1
        assert_eq!(nchw[[0, 2, 0, 0]], 0.0);
    }
}
