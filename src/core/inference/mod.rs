//! ONNX Runtime integration.
//!
//! The pipeline depends on the [`InferenceRunner`] capability trait only;
//! [`OrtRunner`] is the production implementation backed by an
//! `ort::session::Session`. Detector outputs arrive in one of three layouts
//! and are normalized to the canonical heatmap pair by [`detector_output`].

pub mod detector_output;
pub mod runner;
pub mod session;

pub use detector_output::{DetectorOutputLayout, split_detector_heatmaps};
pub use runner::{InferenceRunner, OrtRunner};
pub use session::{OrtGraphOptimizationLevel, OrtSessionConfig, load_session};
