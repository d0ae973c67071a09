//! Supporting utilities for the OCR pipeline.

pub mod charset;
pub mod crop;
pub mod lang;
pub mod transform;

pub use charset::Charset;
pub use crop::{CropRegion, build_crops};
pub use transform::warp_quad;
