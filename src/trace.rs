//! Optional step-by-step trace sink.
//!
//! Numerical parity bugs cascade, so the pipeline can emit every intermediate
//! artifact to a [`TraceWriter`] under stable step names. The names are part
//! of the observable contract: other implementations emit the same steps,
//! which makes stage-by-stage diffing possible. Passing no writer costs a
//! branch per step and nothing else.

use crate::core::errors::OCRError;
use crate::processors::geometry::Quad;
use crate::processors::raster::RasterImage;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Stable step names emitted by the pipeline.
pub mod steps {
    /// The decoded input image.
    pub const LOAD_IMAGE: &str = "load_image";
    /// The resolved option record.
    pub const OCR_OPTIONS: &str = "ocr_options";
    /// Detector input after the aspect-preserving resize.
    pub const RESIZE_ASPECT_RATIO: &str = "resize_aspect_ratio";
    /// Detector input after stride padding.
    pub const PAD_TO_STRIDE: &str = "pad_to_stride";
    /// Normalized HWC float image.
    pub const NORMALIZE_MEAN_VARIANCE: &str = "normalize_mean_variance";
    /// NCHW-packed detector input.
    pub const TO_TENSOR_LAYOUT: &str = "to_tensor_layout";
    /// Final tensor fed to the detector.
    pub const DETECTOR_INPUT_FINAL: &str = "detector_input_final";
    /// Raw text scores as returned by the model.
    pub const DETECTOR_RAW_OUTPUT_TEXT: &str = "detector_raw_output_text";
    /// Raw link scores as returned by the model.
    pub const DETECTOR_RAW_OUTPUT_LINK: &str = "detector_raw_output_link";
    /// Canonical text heatmap.
    pub const HEATMAP_TEXT: &str = "heatmap_text";
    /// Canonical link heatmap.
    pub const HEATMAP_LINK: &str = "heatmap_link";
    /// Boxes decoded in heatmap space.
    pub const THRESHOLD_AND_BOX_DECODE: &str = "threshold_and_box_decode";
    /// Boxes projected back to original-image space.
    pub const ADJUST_COORDINATES_TO_ORIGINAL: &str = "adjust_coordinates_to_original";
    /// Grouped horizontal rectangles.
    pub const DETECTOR_BOXES_HORIZONTAL: &str = "detector_boxes_horizontal";
    /// Grouped free-form quadrilaterals.
    pub const DETECTOR_BOXES_FREE: &str = "detector_boxes_free";
    /// Horizontal-then-free ordering fed to the crop builder.
    pub const DETECTOR_BOXES_ORDERED: &str = "detector_boxes_ordered";
    /// Recognized regions before line merging.
    pub const RECOGNIZER_RESULTS_PRE_MERGE: &str = "recognizer_results_pre_merge";
    /// Recognized regions after line merging.
    pub const RECOGNIZER_RESULTS_POST_MERGE: &str = "recognizer_results_post_merge";
}

/// A sink for named pipeline steps.
///
/// Implementations should be cheap; the pipeline calls them inline.
pub trait TraceWriter: Send + Sync {
    /// Records an image-valued step.
    fn write_image(&self, step: &str, image: &RasterImage) -> Result<(), OCRError>;

    /// Records a tensor-valued step.
    fn write_tensor(&self, step: &str, shape: &[usize], data: &[f32]) -> Result<(), OCRError>;

    /// Records a box-list step.
    fn write_boxes(&self, step: &str, boxes: &[Quad]) -> Result<(), OCRError>;

    /// Records a parameter-record step.
    fn write_params(&self, step: &str, params: serde_json::Value) -> Result<(), OCRError>;
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum TraceRecord<'a> {
    Image {
        step: &'a str,
        width: usize,
        height: usize,
        channels: usize,
    },
    Tensor {
        step: &'a str,
        shape: &'a [usize],
        min: f32,
        max: f32,
        mean: f32,
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<&'a [f32]>,
    },
    Boxes {
        step: &'a str,
        boxes: Vec<[[f32; 2]; 4]>,
    },
    Params {
        step: &'a str,
        params: serde_json::Value,
    },
}

/// Trace writer that appends one JSON object per step to a `.jsonl` file.
///
/// Tensor payloads are summarized by default (shape and min/max/mean);
/// construct with [`JsonlTraceWriter::with_full_tensors`] to keep full data
/// for bit-level diffing.
pub struct JsonlTraceWriter {
    file: Mutex<std::fs::File>,
    path: PathBuf,
    full_tensors: bool,
}

impl JsonlTraceWriter {
    /// Creates (truncating) the trace file.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, OCRError> {
        let path = path.as_ref().to_path_buf();
        let file = std::fs::File::create(&path)?;
        Ok(Self {
            file: Mutex::new(file),
            path,
            full_tensors: false,
        })
    }

    /// Creates a writer that stores full tensor data.
    pub fn with_full_tensors(path: impl AsRef<Path>) -> Result<Self, OCRError> {
        let mut writer = Self::create(path)?;
        writer.full_tensors = true;
        Ok(writer)
    }

    /// Path of the trace file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, record: &TraceRecord<'_>) -> Result<(), OCRError> {
        let line = serde_json::to_string(record)
            .map_err(|e| OCRError::config(format!("trace serialization failed: {e}")))?;
        let mut file = self
            .file
            .lock()
            .map_err(|_| OCRError::config("trace writer lock poisoned"))?;
        writeln!(file, "{line}")?;
        Ok(())
    }
}

impl TraceWriter for JsonlTraceWriter {
    fn write_image(&self, step: &str, image: &RasterImage) -> Result<(), OCRError> {
        self.append(&TraceRecord::Image {
            step,
            width: image.width,
            height: image.height,
            channels: image.channels(),
        })
    }

    fn write_tensor(&self, step: &str, shape: &[usize], data: &[f32]) -> Result<(), OCRError> {
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        let mut sum = 0.0f64;
        for &v in data {
            min = min.min(v);
            max = max.max(v);
            sum += v as f64;
        }
        let mean = if data.is_empty() {
            0.0
        } else {
            (sum / data.len() as f64) as f32
        };
        self.append(&TraceRecord::Tensor {
            step,
            shape,
            min,
            max,
            mean,
            data: self.full_tensors.then_some(data),
        })
    }

    fn write_boxes(&self, step: &str, boxes: &[Quad]) -> Result<(), OCRError> {
        self.append(&TraceRecord::Boxes {
            step,
            boxes: boxes.iter().map(|q| q.to_array()).collect(),
        })
    }

    fn write_params(&self, step: &str, params: serde_json::Value) -> Result<(), OCRError> {
        self.append(&TraceRecord::Params { step, params })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::raster::ChannelOrder;

    #[test]
    fn jsonl_writer_appends_one_line_per_step() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.jsonl");
        let writer = JsonlTraceWriter::create(&path).unwrap();

        let img = RasterImage::new(vec![0; 12], 2, 2, ChannelOrder::Rgb).unwrap();
        writer.write_image(steps::LOAD_IMAGE, &img).unwrap();
        writer
            .write_tensor(steps::HEATMAP_TEXT, &[2, 2], &[0.0, 1.0, 0.5, 0.5])
            .unwrap();
        writer
            .write_boxes(
                steps::DETECTOR_BOXES_ORDERED,
                &[Quad::from_rect(0.0, 0.0, 1.0, 1.0)],
            )
            .unwrap();
        writer
            .write_params(steps::OCR_OPTIONS, serde_json::json!({"align": 32}))
            .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["kind"], "image");
        assert_eq!(first["step"], "load_image");
        let tensor: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(tensor["max"], 1.0);
        assert!(tensor.get("data").is_none(), "summarized by default");
    }

    #[test]
    fn full_tensor_mode_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.jsonl");
        let writer = JsonlTraceWriter::with_full_tensors(&path).unwrap();
        writer.write_tensor("t", &[2], &[0.25, 0.75]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(text.trim()).unwrap();
        assert_eq!(value["data"][1], 0.75);
    }
}
