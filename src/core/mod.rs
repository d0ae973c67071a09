//! Core types for the OCR pipeline.
//!
//! This module groups the parts every stage depends on:
//! - Error handling ([`errors`])
//! - Recognized configuration ([`options`])
//! - Tensor containers and aliases ([`tensor`])
//! - The persisted model manifest ([`manifest`])
//! - ONNX Runtime integration ([`inference`])

pub mod constants;
pub mod errors;
pub mod inference;
pub mod manifest;
pub mod options;
pub mod tensor;

pub use errors::{OCRError, ProcessingStage};
pub use options::{OcrOptions, RecognizerOptions};
pub use tensor::{Tensor, Tensor2D, Tensor3D, Tensor4D};
