//! High-level OCR engine and its builder.
//!
//! [`OcrEngineBuilder`] wires the two ONNX sessions and the recognizer
//! charset together; [`OcrEngine`] runs the pipeline: detect, group, crop,
//! recognize, optionally merge lines, and emit results ordered by position.
//! Stage errors fail the whole call; an empty detection list is a valid empty
//! result.

use crate::core::errors::OCRError;
use crate::core::inference::{InferenceRunner, OrtRunner, OrtSessionConfig};
use crate::core::manifest::ModelManifest;
use crate::core::options::OcrOptions;
use crate::models::detection::CraftDetector;
use crate::models::recognition::CrnnRecognizer;
use crate::pipeline::merge::{MergeParams, RecognizedRegion, merge_lines};
use crate::pipeline::result::TextRegion;
use crate::processors::grouping::{GroupedBoxes, GroupingParams, filter_min_size, group_text_boxes};
use crate::processors::raster::RasterImage;
use crate::trace::{TraceWriter, steps};
use crate::utils::charset::Charset;
use crate::utils::crop::build_crops;
use crate::utils::lang::synthesize_ignore_classes;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Builder for [`OcrEngine`].
#[derive(Debug, Clone)]
pub struct OcrEngineBuilder {
    detector_model: PathBuf,
    recognizer_model: PathBuf,
    charset_path: PathBuf,
    ort_config: Option<OrtSessionConfig>,
}

impl OcrEngineBuilder {
    /// Creates a builder from the two model paths and the charset file.
    pub fn new(
        detector_model: impl Into<PathBuf>,
        recognizer_model: impl Into<PathBuf>,
        charset_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            detector_model: detector_model.into(),
            recognizer_model: recognizer_model.into(),
            charset_path: charset_path.into(),
            ort_config: None,
        }
    }

    /// Resolves model paths from a manifest rooted at `root`.
    pub fn from_manifest(
        root: impl AsRef<Path>,
        manifest: &ModelManifest,
        langs: &[String],
    ) -> Result<Self, OCRError> {
        let root = root.as_ref();
        let detector = manifest
            .detector()
            .ok_or_else(|| OCRError::config("manifest lists no detector model"))?;
        let recognizer = manifest.recognizer_for(langs).ok_or_else(|| {
            OCRError::config(format!(
                "manifest lists no recognizer covering languages {langs:?}"
            ))
        })?;
        let charset = recognizer.charset_file.as_ref().ok_or_else(|| {
            OCRError::config(format!(
                "recognizer '{}' has no charset file",
                recognizer.model_name
            ))
        })?;
        Ok(Self::new(
            root.join(&detector.onnx_file),
            root.join(&recognizer.onnx_file),
            root.join(charset),
        ))
    }

    /// Applies an ONNX Runtime session configuration to both models.
    pub fn ort_session(mut self, config: OrtSessionConfig) -> Self {
        self.ort_config = Some(config);
        self
    }

    /// Loads both sessions and the charset, producing a ready engine.
    pub fn build(self) -> Result<OcrEngine, OCRError> {
        let detector_runner: Arc<dyn InferenceRunner> = Arc::new(OrtRunner::from_file(
            &self.detector_model,
            self.ort_config.as_ref(),
        )?);
        let recognizer_runner: Arc<dyn InferenceRunner> = Arc::new(OrtRunner::from_file(
            &self.recognizer_model,
            self.ort_config.as_ref(),
        )?);
        let charset = Charset::from_file(&self.charset_path)?;
        OcrEngine::from_runners(detector_runner, recognizer_runner, charset)
    }
}

/// The configured OCR pipeline.
#[derive(Debug)]
pub struct OcrEngine {
    detector: CraftDetector,
    recognizer: CrnnRecognizer,
}

impl OcrEngine {
    /// Assembles an engine from inference runners and a charset.
    ///
    /// This is the seam used by tests and by callers with custom runtimes;
    /// [`OcrEngineBuilder::build`] is the ONNX-file front door.
    pub fn from_runners(
        detector: Arc<dyn InferenceRunner>,
        recognizer: Arc<dyn InferenceRunner>,
        charset: Charset,
    ) -> Result<Self, OCRError> {
        Ok(Self {
            detector: CraftDetector::new(detector),
            recognizer: CrnnRecognizer::new(recognizer, charset)?,
        })
    }

    /// The wrapped detector.
    pub fn detector(&self) -> &CraftDetector {
        &self.detector
    }

    /// The wrapped recognizer.
    pub fn recognizer(&self) -> &CrnnRecognizer {
        &self.recognizer
    }

    /// Runs detection and grouping, returning the grouped box lists.
    pub fn detect(
        &self,
        image: &RasterImage,
        options: &OcrOptions,
        trace: Option<&dyn TraceWriter>,
    ) -> Result<GroupedBoxes, OCRError> {
        options.validate()?;
        let polys = self.detector.detect(image, options, trace)?;
        let grouped = group_text_boxes(
            &polys,
            GroupingParams {
                slope_ths: options.slope_ths,
                ycenter_ths: options.ycenter_ths,
                height_ths: options.height_ths,
                width_ths: options.width_ths,
                add_margin: options.add_margin,
            },
        );
        let grouped = filter_min_size(grouped, options.min_size);
        if let Some(tw) = trace {
            tw.write_boxes(steps::DETECTOR_BOXES_HORIZONTAL, &grouped.horizontal)?;
            tw.write_boxes(steps::DETECTOR_BOXES_FREE, &grouped.free)?;
            let ordered: Vec<_> = grouped
                .horizontal
                .iter()
                .chain(grouped.free.iter())
                .copied()
                .collect();
            tw.write_boxes(steps::DETECTOR_BOXES_ORDERED, &ordered)?;
        }
        debug!(
            horizontal = grouped.horizontal.len(),
            free = grouped.free.len(),
            "detection grouped"
        );
        Ok(grouped)
    }

    /// Recognizes prepared boxes against a recognition image.
    ///
    /// The recognition image is typically the grayscale sibling of the
    /// detection image; any channel order is accepted.
    pub fn recognize(
        &self,
        recognition_image: &RasterImage,
        boxes: &GroupedBoxes,
        options: &OcrOptions,
        trace: Option<&dyn TraceWriter>,
    ) -> Result<Vec<TextRegion>, OCRError> {
        options.validate()?;
        let ignore = synthesize_ignore_classes(
            self.recognizer.decoder(),
            self.recognizer.charset().chars(),
            options,
        )?;

        let crops = build_crops(recognition_image, boxes, &options.rotation_info)?;
        let mut regions = Vec::with_capacity(crops.len());
        for crop in &crops {
            let decoded = self
                .recognizer
                .recognize(&crop.image, &options.recognizer, &ignore)?;
            regions.push(RecognizedRegion {
                quad: crop.quad,
                text: decoded.text,
                confidence: decoded.confidence,
                rotation_deg: crop.rotation_deg,
            });
        }

        if let Some(tw) = trace {
            let quads: Vec<_> = regions.iter().map(|r| r.quad).collect();
            tw.write_boxes(steps::RECOGNIZER_RESULTS_PRE_MERGE, &quads)?;
        }

        if options.merge_lines {
            regions = merge_lines(
                regions,
                MergeParams {
                    x_ths: options.x_ths,
                    y_ths: options.y_ths,
                    max_angle_deg: options.max_angle_deg,
                },
            );
            if let Some(tw) = trace {
                let quads: Vec<_> = regions.iter().map(|r| r.quad).collect();
                tw.write_boxes(steps::RECOGNIZER_RESULTS_POST_MERGE, &quads)?;
            }
        }

        regions.sort_by(|a, b| {
            let ka = (a.quad.y_min(), a.quad.x_min());
            let kb = (b.quad.y_min(), b.quad.x_min());
            ka.partial_cmp(&kb).unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(regions
            .into_iter()
            .map(|r| TextRegion::new(&r.quad, r.text, r.confidence))
            .collect())
    }

    /// Runs the full pipeline on a decoded image.
    pub fn read_text(
        &self,
        image: &RasterImage,
        options: &OcrOptions,
    ) -> Result<Vec<TextRegion>, OCRError> {
        self.read_text_with(image, None, options, None)
    }

    /// Runs the full pipeline with an optional grayscale sibling for the
    /// recognition path and an optional trace sink.
    pub fn read_text_with(
        &self,
        image: &RasterImage,
        recognition_image: Option<&RasterImage>,
        options: &OcrOptions,
        trace: Option<&dyn TraceWriter>,
    ) -> Result<Vec<TextRegion>, OCRError> {
        options.validate()?;
        if let Some(gray) = recognition_image {
            if gray.width != image.width || gray.height != image.height {
                return Err(OCRError::invalid_input(format!(
                    "recognition image {}x{} does not match detection image {}x{}",
                    gray.width, gray.height, image.width, image.height
                )));
            }
        }
        if let Some(tw) = trace {
            tw.write_image(steps::LOAD_IMAGE, image)?;
            let params = serde_json::to_value(options)
                .map_err(|e| OCRError::config(format!("options serialization failed: {e}")))?;
            tw.write_params(steps::OCR_OPTIONS, params)?;
        }

        let boxes = self.detect(image, options, trace)?;
        if boxes.is_empty() {
            return Ok(Vec::new());
        }

        let derived_gray;
        let recognition = match recognition_image {
            Some(gray) => gray,
            None => {
                derived_gray = image.to_grayscale();
                &derived_gray
            }
        };
        self.recognize(recognition, &boxes, options, trace)
    }
}
