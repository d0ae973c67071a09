//! Core error types for the OCR pipeline.
//!
//! One public error enum covers the whole crate. Stage functions fail fast and
//! return to the caller with enough context (which model, which path, which
//! shape was observed) to reproduce the failure. The orchestrator never
//! catches and continues: an error in any stage yields no results. An empty
//! detection list is a valid outcome, not an error.

use thiserror::Error;

/// Pipeline stage a processing error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    /// Image resampling (bilinear/bicubic resize, padding).
    Resize,
    /// Mean/variance normalization or tensor layout packing.
    Normalization,
    /// Heatmap thresholding and box decoding.
    PostProcessing,
    /// Box grouping and line merging.
    Grouping,
    /// Perspective rectification and cropping.
    Rectification,
    /// CTC decoding.
    Decode,
    /// Orchestration across stages.
    PipelineExecution,
    /// Anything else.
    Generic,
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingStage::Resize => write!(f, "resize"),
            ProcessingStage::Normalization => write!(f, "normalization"),
            ProcessingStage::PostProcessing => write!(f, "post-processing"),
            ProcessingStage::Grouping => write!(f, "grouping"),
            ProcessingStage::Rectification => write!(f, "rectification"),
            ProcessingStage::Decode => write!(f, "decode"),
            ProcessingStage::PipelineExecution => write!(f, "pipeline execution"),
            ProcessingStage::Generic => write!(f, "processing"),
        }
    }
}

/// Errors surfaced by the OCR pipeline.
///
/// The variants map onto five failure classes: bad input, model load failure,
/// model shape mismatch, unsupported configuration, and inference failure.
#[derive(Debug, Error)]
pub enum OCRError {
    /// Error occurred while decoding an image.
    #[error("image load")]
    ImageLoad(#[source] image::ImageError),

    /// The input itself is unusable (unsupported channel count, empty image,
    /// inconsistent buffer length).
    #[error("invalid input: {message}")]
    InvalidInput {
        /// A message describing the invalid input.
        message: String,
    },

    /// Error occurred inside a processing stage.
    #[error("{kind} failed: {context}")]
    Processing {
        /// The stage of processing where the error occurred.
        kind: ProcessingStage,
        /// Additional context about the error.
        context: String,
        /// The underlying error that caused this error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A configuration value is unsupported (unknown language code, recognizer
    /// without a charset, invalid manifest entry).
    #[error("configuration: {message}")]
    ConfigError {
        /// A message describing the configuration error.
        message: String,
    },

    /// A model file could not be loaded.
    #[error("model load failed for '{model_path}': {reason}")]
    ModelLoad {
        /// Path or byte-source identifier of the model that failed to load.
        model_path: String,
        /// Short reason string.
        reason: String,
        /// Underlying source error, when one exists.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A model produced (or declared) a tensor whose shape the pipeline
    /// cannot interpret.
    #[error("model '{model_name}' shape mismatch: expected {expected}, observed {actual:?}")]
    ShapeMismatch {
        /// The model whose output was rejected.
        model_name: String,
        /// Human-readable description of the accepted shapes.
        expected: String,
        /// The shape that was actually observed.
        actual: Vec<usize>,
    },

    /// Inference failed inside the runtime; the runtime's message is kept
    /// intact.
    #[error("inference failed in model '{model_name}': {context}")]
    Inference {
        /// The name of the model where inference failed.
        model_name: String,
        /// Additional context about the inference error.
        context: String,
        /// The underlying error that caused this error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Error from the ONNX Runtime session.
    #[error(transparent)]
    Session(#[from] ort::Error),

    /// Error from basic tensor operations.
    #[error("tensor operation")]
    Tensor(#[from] ndarray::ShapeError),

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),
}

impl From<image::ImageError> for OCRError {
    fn from(error: image::ImageError) -> Self {
        Self::ImageLoad(error)
    }
}

impl OCRError {
    /// Creates an invalid-input error from anything stringly.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates a configuration error from anything stringly.
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Creates a processing error with stage and context attached.
    pub fn processing(
        kind: ProcessingStage,
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Processing {
            kind,
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Creates a model-load error carrying the offending path.
    pub fn model_load(
        model_path: impl Into<String>,
        reason: impl Into<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::ModelLoad {
            model_path: model_path.into(),
            reason: reason.into(),
            source,
        }
    }

    /// Creates a shape-mismatch error for a rejected model tensor.
    pub fn shape_mismatch(
        model_name: impl Into<String>,
        expected: impl Into<String>,
        actual: &[usize],
    ) -> Self {
        Self::ShapeMismatch {
            model_name: model_name.into(),
            expected: expected.into(),
            actual: actual.to_vec(),
        }
    }

    /// Wraps a runtime error from a model forward pass.
    pub fn inference(
        model_name: impl Into<String>,
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Inference {
            model_name: model_name.into(),
            context: context.into(),
            source: Box::new(source),
        }
    }
}
