//! Text recognition.

mod crnn;

pub use crnn::CrnnRecognizer;
