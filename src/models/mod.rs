//! Model wrappers around the inference-runner seam.

pub mod detection;
pub mod recognition;

pub use detection::{CraftDetector, DetectorScale};
pub use recognition::CrnnRecognizer;
