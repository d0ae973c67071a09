//! Programmatic result format.

use crate::processors::geometry::Quad;
use serde::{Deserialize, Serialize};

/// One recognized text region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRegion {
    /// The region's 4-point polygon in original-image coordinates.
    #[serde(rename = "box")]
    pub box_points: [[f32; 2]; 4],
    /// The decoded text.
    pub text: String,
    /// Confidence in `[0, 1]`; 0 whenever `text` is empty.
    pub confidence: f32,
}

impl TextRegion {
    /// Builds a result from a quad and its decoded text.
    pub fn new(quad: &Quad, text: String, confidence: f32) -> Self {
        Self {
            box_points: quad.to_array(),
            text,
            confidence,
        }
    }
}
