//! Persisted model manifest.
//!
//! A JSON document lists the models available to the pipeline. The manifest
//! carries integrity metadata (`sha256`, `size`) for callers that acquire or
//! cache models; this crate parses and surfaces the fields but does not
//! verify checksums.

use crate::core::constants::{MANIFEST_ONNX_PREFIX, MANIFEST_SCHEMA_VERSION};
use crate::core::errors::OCRError;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path};

/// What a manifest entry's model does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// Scene-text detector emitting text/link heatmaps.
    Detector,
    /// Text recognizer with CTC output.
    Recognizer,
}

/// One model listed in the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelEntry {
    /// Stable name of the model.
    pub model_name: String,
    /// Detector or recognizer.
    pub kind: ModelKind,
    /// ISO-ish language codes; `*` marks a language-agnostic model.
    pub languages: Vec<String>,
    /// Relative path of the ONNX graph, constrained under `models/onnx/`.
    pub onnx_file: String,
    /// Charset file path; required when `kind` is `Recognizer`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charset_file: Option<String>,
    /// Hex SHA-256 of the ONNX file.
    pub sha256: String,
    /// Size of the ONNX file in bytes.
    pub size: u64,
}

impl ModelEntry {
    /// Whether this model covers the given language code.
    ///
    /// `*` in the entry's language list matches everything.
    pub fn supports_language(&self, lang: &str) -> bool {
        self.languages.iter().any(|l| l == "*" || l == lang)
    }

    fn validate(&self) -> Result<(), OCRError> {
        let path = Path::new(&self.onnx_file);
        if path.is_absolute() {
            return Err(OCRError::config(format!(
                "manifest entry '{}': onnxFile must be relative, got '{}'",
                self.model_name, self.onnx_file
            )));
        }
        if path
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            return Err(OCRError::config(format!(
                "manifest entry '{}': onnxFile must not traverse upward, got '{}'",
                self.model_name, self.onnx_file
            )));
        }
        if !self.onnx_file.starts_with(MANIFEST_ONNX_PREFIX) {
            return Err(OCRError::config(format!(
                "manifest entry '{}': onnxFile must live under '{}', got '{}'",
                self.model_name, MANIFEST_ONNX_PREFIX, self.onnx_file
            )));
        }
        if self.kind == ModelKind::Recognizer && self.charset_file.is_none() {
            return Err(OCRError::config(format!(
                "manifest entry '{}': recognizer entries require a charsetFile",
                self.model_name
            )));
        }
        Ok(())
    }
}

/// The manifest document, schema version 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelManifest {
    /// Schema version of the document.
    pub schema_version: u32,
    /// Listed models.
    pub models: Vec<ModelEntry>,
}

impl ModelManifest {
    /// Parses and validates a manifest from its JSON text.
    pub fn from_json(text: &str) -> Result<Self, OCRError> {
        let manifest: ModelManifest = serde_json::from_str(text)
            .map_err(|e| OCRError::config(format!("manifest parse failed: {e}")))?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Reads, parses, and validates a manifest file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, OCRError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            OCRError::config(format!(
                "manifest read failed for '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_json(&text)
    }

    fn validate(&self) -> Result<(), OCRError> {
        if self.schema_version != MANIFEST_SCHEMA_VERSION {
            return Err(OCRError::config(format!(
                "unsupported manifest schema version {}, expected {}",
                self.schema_version, MANIFEST_SCHEMA_VERSION
            )));
        }
        for entry in &self.models {
            entry.validate()?;
        }
        Ok(())
    }

    /// First detector entry, if any.
    pub fn detector(&self) -> Option<&ModelEntry> {
        self.models.iter().find(|m| m.kind == ModelKind::Detector)
    }

    /// First recognizer entry covering every requested language.
    pub fn recognizer_for(&self, langs: &[String]) -> Option<&ModelEntry> {
        self.models.iter().find(|m| {
            m.kind == ModelKind::Recognizer && langs.iter().all(|l| m.supports_language(l))
        })
    }
}
