//! Scene-text detection.

mod craft;

pub use craft::{CraftDetector, DetectorScale};
