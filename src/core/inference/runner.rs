//! The inference-runner capability trait and its ONNX Runtime implementation.

use crate::core::errors::OCRError;
use crate::core::inference::session::{OrtSessionConfig, load_session};
use crate::core::tensor::Tensor;
use ort::session::Session;
use ort::value::Value;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Executes an opaque graph: named tensors in, named tensors out.
///
/// The pipeline core depends on this trait only, so stages stay testable with
/// scripted runners and the ONNX Runtime dependency stays at the edge.
/// Implementations must be safe to call from multiple threads; the pipeline
/// holds no lock of its own around `run`.
pub trait InferenceRunner: Send + Sync {
    /// Runs the graph on the given feeds and returns all outputs.
    fn run(&self, feeds: Vec<(String, Tensor)>) -> Result<Vec<(String, Tensor)>, OCRError>;

    /// Declared graph input names, in declaration order.
    fn input_names(&self) -> &[String];

    /// Declared graph output names, in declaration order.
    fn output_names(&self) -> &[String];

    /// Identifier of the model behind this runner, for error context.
    fn source(&self) -> &str;
}

/// [`InferenceRunner`] backed by an `ort` session.
///
/// The session is guarded by a mutex because `Session::run` takes `&mut self`;
/// concurrent OCR calls serialize at this point and nowhere else.
pub struct OrtRunner {
    session: Mutex<Session>,
    model_path: PathBuf,
    source: String,
    input_names: Vec<String>,
    output_names: Vec<String>,
}

impl std::fmt::Debug for OrtRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrtRunner")
            .field("model_path", &self.model_path)
            .field("input_names", &self.input_names)
            .field("output_names", &self.output_names)
            .finish()
    }
}

impl OrtRunner {
    /// Loads a model file into a session and captures its I/O metadata.
    pub fn from_file(
        model_path: impl AsRef<Path>,
        config: Option<&OrtSessionConfig>,
    ) -> Result<Self, OCRError> {
        let path = model_path.as_ref();
        let session = load_session(path, config)?;
        let input_names: Vec<String> = session.inputs().iter().map(|i| i.name().to_string()).collect();
        let output_names: Vec<String> = session.outputs().iter().map(|o| o.name().to_string()).collect();
        if input_names.is_empty() || output_names.is_empty() {
            return Err(OCRError::model_load(
                path.display().to_string(),
                "model declares no inputs or no outputs",
                None,
            ));
        }
        Ok(Self {
            session: Mutex::new(session),
            model_path: path.to_path_buf(),
            source: path.display().to_string(),
            input_names,
            output_names,
        })
    }

    /// Path of the loaded model file.
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    fn to_value(&self, tensor: Tensor) -> Result<ort::value::DynValue, OCRError> {
        let value = match tensor {
            Tensor::F32 { shape, data } => Value::from_array((shape.as_slice(), data))
                .map_err(OCRError::Session)?
                .into_dyn(),
            Tensor::I64 { shape, data } => Value::from_array((shape.as_slice(), data))
                .map_err(OCRError::Session)?
                .into_dyn(),
            Tensor::U8 { shape, data } => Value::from_array((shape.as_slice(), data))
                .map_err(OCRError::Session)?
                .into_dyn(),
        };
        Ok(value)
    }
}

impl InferenceRunner for OrtRunner {
    fn run(&self, feeds: Vec<(String, Tensor)>) -> Result<Vec<(String, Tensor)>, OCRError> {
        if feeds.is_empty() {
            return Err(OCRError::invalid_input("no feeds provided for inference"));
        }

        let mut names = Vec::with_capacity(feeds.len());
        let mut values = Vec::with_capacity(feeds.len());
        for (name, tensor) in feeds {
            values.push(self.to_value(tensor)?);
            names.push(name);
        }

        let mut session = self.session.lock().map_err(|_| {
            OCRError::invalid_input(format!(
                "failed to acquire session lock for '{}'",
                self.source
            ))
        })?;

        // Session::run wants the feeds up front; the pipeline only ever has
        // one or two (image plus an optional text placeholder).
        let outputs = match values.len() {
            1 => {
                let v0 = values.pop().expect("one value");
                session
                    .run(ort::inputs![names[0].as_str() => v0])
                    .map_err(OCRError::Session)?
            }
            2 => {
                let v1 = values.pop().expect("two values");
                let v0 = values.pop().expect("two values");
                session
                    .run(ort::inputs![names[0].as_str() => v0, names[1].as_str() => v1])
                    .map_err(OCRError::Session)?
            }
            n => {
                return Err(OCRError::invalid_input(format!(
                    "unsupported feed count {n}; the pipeline feeds at most 2 tensors"
                )));
            }
        };

        let mut results = Vec::with_capacity(self.output_names.len());
        for name in &self.output_names {
            let value = outputs.get(name.as_str()).ok_or_else(|| {
                OCRError::inference(
                    self.source.clone(),
                    format!("declared output '{name}' missing from results"),
                    ort::Error::new("output not found"),
                )
            })?;

            let tensor = if let Ok((shape, data)) = value.try_extract_tensor::<f32>() {
                Tensor::F32 {
                    shape: shape.iter().map(|&d| d as usize).collect(),
                    data: data.to_vec(),
                }
            } else if let Ok((shape, data)) = value.try_extract_tensor::<i64>() {
                Tensor::I64 {
                    shape: shape.iter().map(|&d| d as usize).collect(),
                    data: data.to_vec(),
                }
            } else if let Ok((shape, data)) = value.try_extract_tensor::<i32>() {
                // i32 outputs are widened so callers see one integer type.
                Tensor::I64 {
                    shape: shape.iter().map(|&d| d as usize).collect(),
                    data: data.iter().map(|&v| v as i64).collect(),
                }
            } else {
                return Err(OCRError::inference(
                    self.source.clone(),
                    format!("output '{name}' has an unsupported element type"),
                    ort::Error::new("only f32, i64, and i32 outputs are supported"),
                ));
            };
            results.push((name.clone(), tensor));
        }
        Ok(results)
    }

    fn input_names(&self) -> &[String] {
        &self.input_names
    }

    fn output_names(&self) -> &[String] {
        &self.output_names
    }

    fn source(&self) -> &str {
        &self.source
    }
}
