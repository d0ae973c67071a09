//! Default values shared across the pipeline.
//!
//! These mirror EasyOCR's defaults for the CRAFT/CRNN pair; all of
//! them can be overridden per call through [`crate::core::options::OcrOptions`].

/// Upper bound on the longer detector input side.
pub const DEFAULT_CANVAS_SIZE: usize = 2560;

/// Multiplier applied to the longer side before capping at the canvas size.
pub const DEFAULT_MAG_RATIO: f32 = 1.0;

/// Stride the padded detector input must be a multiple of.
pub const DEFAULT_ALIGN: usize = 32;

/// Detector normalization mean in 0..1 space (ImageNet, RGB order).
pub const DEFAULT_DETECTOR_MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// Detector normalization standard deviation in 0..1 space (ImageNet, RGB order).
pub const DEFAULT_DETECTOR_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Peak text score a component must exceed to be kept.
pub const DEFAULT_TEXT_THRESHOLD: f32 = 0.7;

/// Per-pixel text score threshold for component membership.
pub const DEFAULT_LOW_TEXT: f32 = 0.4;

/// Per-pixel link score threshold for component membership.
pub const DEFAULT_LINK_THRESHOLD: f32 = 0.4;

/// Minimum `max(width, height)` for a detection to survive grouping.
pub const DEFAULT_MIN_SIZE: f32 = 20.0;

/// Slope above which a polygon is routed as free-form.
pub const DEFAULT_SLOPE_THS: f32 = 0.1;

/// Line-membership threshold on the y-center, scaled by line height.
pub const DEFAULT_YCENTER_THS: f32 = 0.5;

/// Height-similarity threshold for merging boxes within a line.
pub const DEFAULT_HEIGHT_THS: f32 = 0.5;

/// Horizontal-gap threshold for merging boxes, scaled by box height.
pub const DEFAULT_WIDTH_THS: f32 = 0.5;

/// Box padding as a fraction of `min(width, height)`.
pub const DEFAULT_ADD_MARGIN: f32 = 0.1;

/// Post-recognition merge: gap threshold scaled by the running line height.
pub const DEFAULT_X_THS: f32 = 1.0;

/// Post-recognition merge: y-center threshold scaled by the line height.
pub const DEFAULT_Y_THS: f32 = 0.5;

/// Post-recognition merge: boxes rotated beyond this many degrees stay alone.
pub const DEFAULT_MAX_ANGLE_DEG: f32 = 10.0;

/// Recognizer input height declared by the option block. The model's own
/// declared input shape takes precedence when it is static.
pub const DEFAULT_REC_INPUT_HEIGHT: usize = 64;

/// Recognizer input width; the recognizer is a fixed-width export.
pub const DEFAULT_REC_INPUT_WIDTH: usize = 100;

/// Recognizer input channels.
pub const DEFAULT_REC_INPUT_CHANNELS: usize = 1;

/// Recognizer normalization mean in 0..1 space.
pub const DEFAULT_REC_MEAN: f32 = 0.5;

/// Recognizer normalization standard deviation in 0..1 space.
pub const DEFAULT_REC_STD: f32 = 0.5;

/// Minimum pixel count for a heatmap component to be considered.
pub const MIN_COMPONENT_AREA: usize = 10;

/// Symbols always allowed when the ignore set is synthesized from languages.
pub const DEFAULT_SYMBOL_SET: &str = "0123456789!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~ ";

/// Required directory prefix for ONNX files referenced by the model manifest.
pub const MANIFEST_ONNX_PREFIX: &str = "models/onnx/";

/// Supported model manifest schema version.
pub const MANIFEST_SCHEMA_VERSION: u32 = 1;
