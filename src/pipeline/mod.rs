//! The high-level OCR engine.

pub mod merge;
pub mod ocr;
pub mod result;

pub use ocr::{OcrEngine, OcrEngineBuilder};
pub use result::TextRegion;
