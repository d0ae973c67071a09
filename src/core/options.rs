//! Recognized configuration for a single OCR call.
//!
//! [`OcrOptions`] is an immutable flat record with default values; callers
//! override fields with struct-update syntax or by deserializing a partial
//! JSON document over the defaults (`#[serde(default)]`). The nested
//! recognizer sub-record merges field-wise the same way. There are no
//! prototype chains and no global state.

use crate::core::constants::*;
use serde::{Deserialize, Serialize};

/// Recognizer geometry and normalization.
///
/// The recognizer is a fixed-geometry export; when the session declares a
/// static input shape, the declared height/width take precedence over these
/// values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecognizerOptions {
    /// Target input height fed to the two-stage resampler.
    pub input_height: usize,
    /// Fixed model input width; crops are replicate-padded up to it.
    pub input_width: usize,
    /// Model input channels (1 for the grayscale recognizer).
    pub input_channels: usize,
    /// Normalization mean in 0..1 space.
    pub mean: f32,
    /// Normalization standard deviation in 0..1 space.
    pub std: f32,
}

impl Default for RecognizerOptions {
    fn default() -> Self {
        Self {
            input_height: DEFAULT_REC_INPUT_HEIGHT,
            input_width: DEFAULT_REC_INPUT_WIDTH,
            input_channels: DEFAULT_REC_INPUT_CHANNELS,
            mean: DEFAULT_REC_MEAN,
            std: DEFAULT_REC_STD,
        }
    }
}

/// Per-call options for the OCR pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OcrOptions {
    /// Upper bound on the longer detector input side.
    pub canvas_size: usize,
    /// Multiplier applied to the longer side before capping.
    pub mag_ratio: f32,
    /// Stride the padded detector input must be a multiple of.
    pub align: usize,
    /// Detector normalization mean in 0..1 space (RGB order).
    pub mean: [f32; 3],
    /// Detector normalization standard deviation in 0..1 space (RGB order).
    pub std: [f32; 3],
    /// Component validity: peak text score must exceed this.
    pub text_threshold: f32,
    /// Pixel inclusion threshold into a component.
    pub low_text: f32,
    /// Pixel link-score inclusion threshold.
    pub link_threshold: f32,
    /// Minimum of `max(width, height)` after post-processing.
    pub min_size: f32,
    /// Above this slope a polygon is routed as free-form.
    pub slope_ths: f32,
    /// Line-grouping threshold on the y-center.
    pub ycenter_ths: f32,
    /// Height-similarity threshold for in-line merging.
    pub height_ths: f32,
    /// Horizontal-gap threshold for in-line merging.
    pub width_ths: f32,
    /// Box padding as a fraction of `min(width, height)`.
    pub add_margin: f32,
    /// Rotations (degrees, multiples of 90) to probe per crop.
    pub rotation_info: Vec<i32>,
    /// Languages whose character sets stay recognizable.
    pub lang_list: Vec<String>,
    /// When set, every charset character *not* in this string is ignored.
    pub allowlist: Option<String>,
    /// When set (and no allowlist), every charset character in this string is
    /// ignored.
    pub blocklist: Option<String>,
    /// Whether to merge decoded results into lines after recognition.
    pub merge_lines: bool,
    /// Post-recognition merge: gap threshold, scaled by the running line
    /// height.
    pub x_ths: f32,
    /// Post-recognition merge: y-center threshold, scaled by the line height.
    pub y_ths: f32,
    /// Post-recognition merge: boxes rotated beyond this stay unmerged.
    pub max_angle_deg: f32,
    /// Recognizer geometry and normalization; merged field-wise.
    pub recognizer: RecognizerOptions,
}

impl Default for OcrOptions {
    fn default() -> Self {
        Self {
            canvas_size: DEFAULT_CANVAS_SIZE,
            mag_ratio: DEFAULT_MAG_RATIO,
            align: DEFAULT_ALIGN,
            mean: DEFAULT_DETECTOR_MEAN,
            std: DEFAULT_DETECTOR_STD,
            text_threshold: DEFAULT_TEXT_THRESHOLD,
            low_text: DEFAULT_LOW_TEXT,
            link_threshold: DEFAULT_LINK_THRESHOLD,
            min_size: DEFAULT_MIN_SIZE,
            slope_ths: DEFAULT_SLOPE_THS,
            ycenter_ths: DEFAULT_YCENTER_THS,
            height_ths: DEFAULT_HEIGHT_THS,
            width_ths: DEFAULT_WIDTH_THS,
            add_margin: DEFAULT_ADD_MARGIN,
            rotation_info: Vec::new(),
            lang_list: vec!["en".to_string()],
            allowlist: None,
            blocklist: None,
            merge_lines: false,
            x_ths: DEFAULT_X_THS,
            y_ths: DEFAULT_Y_THS,
            max_angle_deg: DEFAULT_MAX_ANGLE_DEG,
            recognizer: RecognizerOptions::default(),
        }
    }
}

impl OcrOptions {
    /// Validates values that would otherwise fail deep inside a stage.
    pub fn validate(&self) -> Result<(), crate::core::errors::OCRError> {
        use crate::core::errors::OCRError;
        if self.canvas_size == 0 {
            return Err(OCRError::config("canvasSize must be positive"));
        }
        if self.align == 0 {
            return Err(OCRError::config("align must be positive"));
        }
        if self.mag_ratio <= 0.0 {
            return Err(OCRError::config("magRatio must be positive"));
        }
        for (i, &s) in self.std.iter().enumerate() {
            if s <= 0.0 {
                return Err(OCRError::config(format!(
                    "std[{i}] must be greater than 0, got {s}"
                )));
            }
        }
        if self.recognizer.std <= 0.0 {
            return Err(OCRError::config("recognizer.std must be greater than 0"));
        }
        if self.recognizer.input_height == 0 || self.recognizer.input_width == 0 {
            return Err(OCRError::config(
                "recognizer input dimensions must be positive",
            ));
        }
        for &angle in &self.rotation_info {
            if angle % 90 != 0 {
                return Err(OCRError::config(format!(
                    "rotationInfo supports multiples of 90 degrees, got {angle}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_easyocr_parameters() {
        let opts = OcrOptions::default();
        assert_eq!(opts.canvas_size, 2560);
        assert_eq!(opts.align, 32);
        assert_eq!(opts.mean, [0.485, 0.456, 0.406]);
        assert_eq!(opts.text_threshold, 0.7);
        assert_eq!(opts.low_text, 0.4);
        assert_eq!(opts.recognizer.input_width, 100);
        assert!(!opts.merge_lines);
        opts.validate().unwrap();
    }

    #[test]
    fn partial_json_merges_over_defaults() {
        let opts: OcrOptions =
            serde_json::from_str(r#"{"textThreshold": 0.5, "recognizer": {"inputHeight": 32}}"#)
                .unwrap();
        assert_eq!(opts.text_threshold, 0.5);
        assert_eq!(opts.recognizer.input_height, 32);
        // untouched fields keep their defaults, including nested ones
        assert_eq!(opts.low_text, 0.4);
        assert_eq!(opts.recognizer.input_width, 100);
    }

    #[test]
    fn validate_rejects_zero_align_and_odd_rotation() {
        let opts = OcrOptions {
            align: 0,
            ..Default::default()
        };
        assert!(opts.validate().is_err());

        let opts = OcrOptions {
            rotation_info: vec![45],
            ..Default::default()
        };
        assert!(opts.validate().is_err());
    }
}
