//! CRAFT-style detector wrapper.
//!
//! Owns the detector's preprocessing contract (aspect-preserving resize,
//! stride padding, ImageNet normalization, NCHW packing), the forward pass
//! through the inference runner, and the projection of decoded boxes back to
//! original image coordinates. The heatmap stride is derived from the actual
//! tensor sizes instead of assuming the model's nominal 2x downsampling.

use crate::core::errors::OCRError;
use crate::core::inference::{InferenceRunner, split_detector_heatmaps};
use crate::core::options::OcrOptions;
use crate::core::tensor::{Tensor, Tensor2D, Tensor4D};
use crate::processors::craft::{CraftThresholds, adjust_to_original, extract_boxes};
use crate::processors::geometry::Quad;
use crate::processors::normalization::{hwc_to_nchw, normalize_mean_variance};
use crate::processors::raster::RasterImage;
use crate::processors::resample::{pad_to_stride, resize_bilinear};
use crate::trace::{TraceWriter, steps};
use std::sync::Arc;
use tracing::debug;

/// Geometry bookkeeping for projecting detections back to the input image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorScale {
    /// Resized width over original width.
    pub scale_x: f32,
    /// Resized height over original height.
    pub scale_y: f32,
    /// Pixels of zero padding added on the right.
    pub pad_right: usize,
    /// Pixels of zero padding added on the bottom.
    pub pad_bottom: usize,
    /// Padded input width fed to the model.
    pub input_width: usize,
    /// Padded input height fed to the model.
    pub input_height: usize,
}

/// The detector model with its numerical pre/post-processing.
pub struct CraftDetector {
    runner: Arc<dyn InferenceRunner>,
    model_name: String,
}

impl CraftDetector {
    /// Wraps an inference runner as the detector.
    pub fn new(runner: Arc<dyn InferenceRunner>) -> Self {
        let model_name = runner.source().to_string();
        Self { runner, model_name }
    }

    /// Name used in error context.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Builds the `[1, 3, H, W]` detector input and the scale record.
    pub fn preprocess(
        &self,
        image: &RasterImage,
        options: &OcrOptions,
        trace: Option<&dyn TraceWriter>,
    ) -> Result<(Tensor4D, DetectorScale), OCRError> {
        let long_side = image.width.max(image.height) as f32;
        let target = (long_side * options.mag_ratio).min(options.canvas_size as f32);
        let ratio = target / long_side;
        let width = ((image.width as f32 * ratio) as usize).max(1);
        let height = ((image.height as f32 * ratio) as usize).max(1);
        let resized = resize_bilinear(image, width, height)?;
        if let Some(tw) = trace {
            tw.write_image(steps::RESIZE_ASPECT_RATIO, &resized)?;
        }

        let (padded, pad_right, pad_bottom) = pad_to_stride(&resized, options.align)?;
        if let Some(tw) = trace {
            tw.write_image(steps::PAD_TO_STRIDE, &padded)?;
        }

        let hwc = normalize_mean_variance(&padded, &options.mean, &options.std)?;
        if let Some(tw) = trace {
            let (h, w, c) = hwc.dim();
            tw.write_tensor(
                steps::NORMALIZE_MEAN_VARIANCE,
                &[h, w, c],
                hwc.as_slice().unwrap_or(&[]),
            )?;
        }

        let nchw = hwc_to_nchw(&hwc);
        if let Some(tw) = trace {
            tw.write_tensor(
                steps::TO_TENSOR_LAYOUT,
                nchw.shape(),
                nchw.as_slice().unwrap_or(&[]),
            )?;
            tw.write_tensor(
                steps::DETECTOR_INPUT_FINAL,
                nchw.shape(),
                nchw.as_slice().unwrap_or(&[]),
            )?;
        }

        let scale = DetectorScale {
            scale_x: width as f32 / image.width as f32,
            scale_y: height as f32 / image.height as f32,
            pad_right,
            pad_bottom,
            input_width: padded.width,
            input_height: padded.height,
        };
        debug!(
            width,
            height,
            pad_right,
            pad_bottom,
            "detector input prepared"
        );
        Ok((nchw, scale))
    }

    /// Runs the model and returns the canonical text/link heatmaps.
    pub fn run(
        &self,
        input: Tensor4D,
        trace: Option<&dyn TraceWriter>,
    ) -> Result<(Tensor2D, Tensor2D), OCRError> {
        let input_name = self.runner.input_names()[0].clone();
        let outputs = self
            .runner
            .run(vec![(input_name, Tensor::from_array4(input))])?;
        let (text, link, layout) = split_detector_heatmaps(&outputs, &self.model_name)?;
        debug!(?layout, heat = ?text.dim(), "detector heatmaps extracted");

        if let Some(tw) = trace {
            let (h, w) = text.dim();
            let text_slice = text.as_slice().unwrap_or(&[]);
            let link_slice = link.as_slice().unwrap_or(&[]);
            tw.write_tensor(steps::DETECTOR_RAW_OUTPUT_TEXT, &[h, w], text_slice)?;
            tw.write_tensor(steps::DETECTOR_RAW_OUTPUT_LINK, &[h, w], link_slice)?;
            tw.write_tensor(steps::HEATMAP_TEXT, &[h, w], text_slice)?;
            tw.write_tensor(steps::HEATMAP_LINK, &[h, w], link_slice)?;
        }
        Ok((text, link))
    }

    /// Full detection: preprocess, forward pass, box decode, and projection
    /// to original image coordinates.
    pub fn detect(
        &self,
        image: &RasterImage,
        options: &OcrOptions,
        trace: Option<&dyn TraceWriter>,
    ) -> Result<Vec<Quad>, OCRError> {
        let (input, scale) = self.preprocess(image, options, trace)?;
        let (text_map, link_map) = self.run(input, trace)?;

        let (heat_h, heat_w) = text_map.dim();
        if heat_h == 0 || heat_w == 0 {
            return Err(OCRError::shape_mismatch(
                &self.model_name,
                "non-empty heatmaps",
                &[heat_h, heat_w],
            ));
        }
        // Model stride, from the observed heatmap size rather than a
        // hard-coded 2.
        let stride_x = scale.input_width as f32 / heat_w as f32;
        let stride_y = scale.input_height as f32 / heat_h as f32;

        let raw = extract_boxes(
            &text_map,
            &link_map,
            CraftThresholds {
                text_threshold: options.text_threshold,
                low_text: options.low_text,
                link_threshold: options.link_threshold,
            },
        );
        if let Some(tw) = trace {
            tw.write_boxes(steps::THRESHOLD_AND_BOX_DECODE, &raw)?;
        }

        let adjusted = adjust_to_original(&raw, scale.scale_x, scale.scale_y, stride_x, stride_y);
        if let Some(tw) = trace {
            tw.write_boxes(steps::ADJUST_COORDINATES_TO_ORIGINAL, &adjusted)?;
        }
        Ok(adjusted)
    }
}

impl std::fmt::Debug for CraftDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CraftDetector")
            .field("model_name", &self.model_name)
            .finish()
    }
}
