//! CRNN-style recognizer wrapper.
//!
//! Preprocessing matches EasyOCR's recognizer path: integer grayscale, a
//! two-stage aspect-preserving resample (linear then bicubic), 0.5/0.5
//! normalization, and replicate-last-column padding to the model's fixed
//! width. Replacing any of these with the obvious alternative (single-stage
//! resize, zero padding) shifts the model's output distribution.

use crate::core::errors::OCRError;
use crate::core::inference::InferenceRunner;
use crate::core::options::RecognizerOptions;
use crate::core::tensor::{Tensor, Tensor4D};
use crate::processors::decode::{CtcDecoder, DecodedText};
use crate::processors::raster::RasterImage;
use crate::processors::resample::{
    pad_width_with_value, replicate_pad_width, resize_bicubic, resize_bilinear,
};
use crate::utils::charset::Charset;
use std::sync::Arc;
use tracing::debug;

/// The recognizer model with its preprocessing and CTC decoding.
pub struct CrnnRecognizer {
    runner: Arc<dyn InferenceRunner>,
    decoder: CtcDecoder,
    charset: Charset,
    model_name: String,
}

impl CrnnRecognizer {
    /// Wraps an inference runner and its charset. The CTC blank sits at
    /// class 0.
    pub fn new(runner: Arc<dyn InferenceRunner>, charset: Charset) -> Result<Self, OCRError> {
        let decoder = CtcDecoder::new(charset.chars().to_vec(), 0)?;
        let model_name = runner.source().to_string();
        Ok(Self {
            runner,
            decoder,
            charset,
            model_name,
        })
    }

    /// The recognizer's charset.
    pub fn charset(&self) -> &Charset {
        &self.charset
    }

    /// The CTC decoder over the charset.
    pub fn decoder(&self) -> &CtcDecoder {
        &self.decoder
    }

    /// Name used in error context.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Builds the `[1, C, H, W]` recognizer input from a crop.
    pub fn preprocess(
        &self,
        crop: &RasterImage,
        rec: &RecognizerOptions,
    ) -> Result<Tensor4D, OCRError> {
        if rec.input_channels != 1 && rec.input_channels != 3 {
            return Err(OCRError::config(format!(
                "recognizer supports 1 or 3 input channels, got {}",
                rec.input_channels
            )));
        }
        let gray = crop.to_grayscale();
        let target_h = rec.input_height;

        // Stage 1: linear resample to the model height, width from the
        // (flipped to >= 1) aspect ratio.
        let ratio = gray.width as f32 / gray.height as f32;
        let ratio = if ratio < 1.0 { 1.0 / ratio } else { ratio };
        let stage1_w = ((target_h as f32 * ratio) as usize).max(1);
        let stage1 = resize_bilinear(&gray, stage1_w, target_h)?;

        // Stage 2: bicubic to the final width. EasyOCR's dynamic batch
        // width ceil(ratio) * H collapses to the fixed export width here.
        let stage1_ratio = stage1.width as f32 / stage1.height as f32;
        let natural_width = (ratio.ceil() as usize) * target_h;
        let max_width = natural_width.min(rec.input_width);
        let resized_w = ((target_h as f32 * stage1_ratio).ceil() as usize)
            .min(max_width)
            .max(1);
        let stage2 = resize_bicubic(&stage1, resized_w, target_h)?;
        debug!(
            crop_w = crop.width,
            crop_h = crop.height,
            stage1_w,
            resized_w,
            "recognizer crop resampled"
        );

        let channels = rec.input_channels;
        let mut chw = vec![0.0f32; channels * target_h * resized_w];
        for c in 0..channels {
            for y in 0..target_h {
                for x in 0..resized_w {
                    let value = stage2.data[y * resized_w + x] as f32 / 255.0;
                    chw[(c * target_h + y) * resized_w + x] = (value - rec.mean) / rec.std;
                }
            }
        }

        // Single-channel models replicate the last valid column; the
        // 3-channel path fills with the normalized mean, which is zero
        // after normalization.
        let padded = if channels == 1 {
            replicate_pad_width(&chw, channels, target_h, resized_w, rec.input_width)?
        } else {
            pad_width_with_value(&chw, channels, target_h, resized_w, rec.input_width, 0.0)?
        };

        Ok(Tensor4D::from_shape_vec(
            (1, channels, target_h, rec.input_width),
            padded,
        )?)
    }

    /// Runs the model on a prepared input and returns the raw logits as
    /// `(data, steps, classes)`.
    pub fn run(&self, input: Tensor4D) -> Result<(Vec<f32>, usize, usize), OCRError> {
        let input_names = self.runner.input_names();
        let mut feeds = vec![(
            input_names[0].clone(),
            Tensor::from_array4(input),
        )];
        // Some exports declare a second text input; feed a zero placeholder.
        if let Some(second) = input_names.get(1) {
            feeds.push((
                second.clone(),
                Tensor::I64 {
                    shape: vec![1, 1],
                    data: vec![0],
                },
            ));
        }

        let outputs = self.runner.run(feeds)?;
        let (name, logits) = outputs
            .iter()
            .find(|(_, t)| matches!(t, Tensor::F32 { .. }))
            .ok_or_else(|| {
                OCRError::shape_mismatch(&self.model_name, "an f32 logits tensor", &[])
            })?;
        let (shape, data) = logits.as_f32()?;
        let (steps, classes) = match shape {
            [1, steps, classes] => (*steps, *classes),
            [steps, classes] => (*steps, *classes),
            other => {
                return Err(OCRError::shape_mismatch(
                    &self.model_name,
                    "[1, steps, classes] logits",
                    other,
                ));
            }
        };
        debug!(output = %name, steps, classes, "recognizer logits extracted");
        Ok((data.to_vec(), steps, classes))
    }

    /// Recognizes a crop: preprocess, forward pass, greedy CTC decode.
    pub fn recognize(
        &self,
        crop: &RasterImage,
        rec: &RecognizerOptions,
        ignore_classes: &[usize],
    ) -> Result<DecodedText, OCRError> {
        let input = self.preprocess(crop, rec)?;
        let (logits, steps, classes) = self.run(input)?;
        self.decoder
            .decode_greedy(&logits, steps, classes, ignore_classes)
    }
}

impl std::fmt::Debug for CrnnRecognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrnnRecognizer")
            .field("model_name", &self.model_name)
            .field("charset_len", &self.charset.len())
            .finish()
    }
}
