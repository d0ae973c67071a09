//! # Scribe OCR
//!
//! An end-to-end scene-text OCR pipeline built around two pre-trained ONNX
//! models: a CRAFT-style text detector and a CRNN-style recognizer with CTC
//! output. Given a decoded raster image the pipeline produces an ordered list
//! of text regions, each carrying a 4-point polygon in original image
//! coordinates, a decoded string, and a confidence score.
//!
//! The crate owns the numerical stages that surround the two ONNX sessions:
//! detector pre/post-processing, connected-component box decoding, polygon
//! grouping and line merging, perspective rectification, recognizer
//! preprocessing, and greedy CTC decoding. Image file decoding is delegated
//! to the `image` crate and graph execution to ONNX Runtime, both behind
//! small capability traits so the core stays testable without model files.
//!
//! ## Modules
//!
//! * [`core`] - Error handling, options, tensors, manifest, and inference glue
//! * [`processors`] - Pure image/signal stages (resampling, heatmap decoding,
//!   grouping, CTC)
//! * [`models`] - Detector and recognizer model wrappers
//! * [`pipeline`] - The high-level engine that composes the stages
//! * [`utils`] - Perspective rectification, cropping, language tables
//! * [`trace`] - Optional step-by-step trace sink for cross-implementation
//!   diffing

pub mod core;
pub mod models;
pub mod pipeline;
pub mod processors;
pub mod trace;
pub mod utils;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::core::errors::OCRError;
    pub use crate::core::manifest::{ModelEntry, ModelKind, ModelManifest};
    pub use crate::core::options::{OcrOptions, RecognizerOptions};
    pub use crate::pipeline::result::TextRegion;
    pub use crate::pipeline::{OcrEngine, OcrEngineBuilder};
    pub use crate::processors::geometry::{Point, Quad};
    pub use crate::processors::raster::{
        ChannelOrder, DefaultImageDecoder, ImageDecoder, ImageSource, RasterImage,
    };
    pub use crate::trace::TraceWriter;
}
