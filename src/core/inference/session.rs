//! Helpers for constructing ONNX Runtime sessions.

use crate::core::errors::OCRError;
use ort::logging::LogLevel;
use ort::session::Session;
use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Graph optimization level, serializable for configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrtGraphOptimizationLevel {
    /// Disable all optimizations.
    DisableAll,
    /// Basic optimizations.
    Level1,
    /// Extended optimizations.
    Level2,
    /// Layout optimizations.
    Level3,
    /// Alias for the highest available level.
    All,
}

/// Session tuning knobs applied to every model in a pipeline.
///
/// All fields are optional; unset fields keep ONNX Runtime defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrtSessionConfig {
    /// Threads used within an operator.
    pub intra_threads: Option<usize>,
    /// Threads used across operators.
    pub inter_threads: Option<usize>,
    /// Whether operators may execute in parallel.
    pub parallel_execution: Option<bool>,
    /// Graph optimization level.
    pub optimization_level: Option<OrtGraphOptimizationLevel>,
}

impl OrtSessionConfig {
    pub(crate) fn apply(&self, mut builder: SessionBuilder) -> Result<SessionBuilder, ort::Error> {
        if let Some(intra) = self.intra_threads {
            builder = builder.with_intra_threads(intra)?;
        }
        if let Some(inter) = self.inter_threads {
            builder = builder.with_inter_threads(inter)?;
        }
        if let Some(par) = self.parallel_execution {
            builder = builder.with_parallel_execution(par)?;
        }
        if let Some(level) = self.optimization_level {
            let mapped = match level {
                OrtGraphOptimizationLevel::DisableAll => GraphOptimizationLevel::Disable,
                OrtGraphOptimizationLevel::Level1 => GraphOptimizationLevel::Level1,
                OrtGraphOptimizationLevel::Level2 => GraphOptimizationLevel::Level2,
                // ONNX Runtime treats "All" as an alias for the highest level.
                OrtGraphOptimizationLevel::Level3 | OrtGraphOptimizationLevel::All => {
                    GraphOptimizationLevel::Level3
                }
            };
            builder = builder.with_optimization_level(mapped)?;
        }
        Ok(builder)
    }
}

/// Loads a session from a model file, surfacing the path on failure.
pub fn load_session(
    model_path: impl AsRef<Path>,
    config: Option<&OrtSessionConfig>,
) -> Result<Session, OCRError> {
    let path = model_path.as_ref();
    if !path.exists() {
        return Err(OCRError::model_load(
            path.display().to_string(),
            "model file does not exist",
            None,
        ));
    }
    let builder = Session::builder()
        .map_err(ort::Error::<()>::from)?
        .with_log_level(LogLevel::Error)
        .map_err(ort::Error::<()>::from)?;
    let mut builder = match config {
        Some(cfg) => cfg.apply(builder)?,
        None => builder,
    };
    let session = builder.commit_from_file(path).map_err(|e| {
        OCRError::model_load(
            path.display().to_string(),
            "failed to create ONNX session",
            Some(Box::new(e)),
        )
    })?;
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_session_missing_file_names_path() {
        let err = load_session("definitely/not/here.onnx", None).unwrap_err();
        assert!(err.to_string().contains("definitely/not/here.onnx"));
    }

    #[test]
    fn session_config_roundtrips_through_json() {
        let cfg = OrtSessionConfig {
            intra_threads: Some(2),
            optimization_level: Some(OrtGraphOptimizationLevel::Level3),
            ..Default::default()
        };
        let text = serde_json::to_string(&cfg).unwrap();
        let back: OrtSessionConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(back, cfg);
    }
}
