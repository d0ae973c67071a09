//! Tensor containers used at the model boundary.
//!
//! Internally the pipeline works with `ndarray` arrays (heatmaps as
//! [`Tensor2D`], model inputs as [`Tensor4D`]). At the inference-runner seam a
//! typed, shape-carrying [`Tensor`] enum is used instead so that runners stay
//! independent of what the tensors mean.

use crate::core::errors::OCRError;

/// 2D tensor of 32-bit floats (heatmaps).
pub type Tensor2D = ndarray::Array2<f32>;
/// 3D tensor of 32-bit floats (HWC float images, recognizer logits).
pub type Tensor3D = ndarray::Array3<f32>;
/// 4D tensor of 32-bit floats (NCHW model inputs).
pub type Tensor4D = ndarray::Array4<f32>;

/// A typed, contiguous buffer plus its shape.
///
/// Invariant: `shape.iter().product() == data.len()`, enforced by the
/// constructors. Layout is shape-implied; the pipeline uses NCHW for model
/// I/O.
#[derive(Debug, Clone, PartialEq)]
pub enum Tensor {
    /// 32-bit float tensor.
    F32 {
        /// Dimensions, outermost first.
        shape: Vec<usize>,
        /// Row-major contiguous data.
        data: Vec<f32>,
    },
    /// 64-bit integer tensor (recognizer secondary text input; i32 model
    /// outputs are widened on extraction).
    I64 {
        /// Dimensions, outermost first.
        shape: Vec<usize>,
        /// Row-major contiguous data.
        data: Vec<i64>,
    },
    /// Unsigned byte tensor.
    U8 {
        /// Dimensions, outermost first.
        shape: Vec<usize>,
        /// Row-major contiguous data.
        data: Vec<u8>,
    },
}

fn check_len(shape: &[usize], len: usize) -> Result<(), OCRError> {
    let expected: usize = shape.iter().product();
    if expected != len {
        return Err(OCRError::invalid_input(format!(
            "tensor shape {shape:?} implies {expected} elements, buffer holds {len}"
        )));
    }
    Ok(())
}

impl Tensor {
    /// Creates an f32 tensor, validating the shape/length invariant.
    pub fn from_f32(shape: Vec<usize>, data: Vec<f32>) -> Result<Self, OCRError> {
        check_len(&shape, data.len())?;
        Ok(Self::F32 { shape, data })
    }

    /// Creates an i64 tensor, validating the shape/length invariant.
    pub fn from_i64(shape: Vec<usize>, data: Vec<i64>) -> Result<Self, OCRError> {
        check_len(&shape, data.len())?;
        Ok(Self::I64 { shape, data })
    }

    /// Creates a u8 tensor, validating the shape/length invariant.
    pub fn from_u8(shape: Vec<usize>, data: Vec<u8>) -> Result<Self, OCRError> {
        check_len(&shape, data.len())?;
        Ok(Self::U8 { shape, data })
    }

    /// Wraps an owned NCHW float array.
    pub fn from_array4(array: Tensor4D) -> Self {
        let shape = array.shape().to_vec();
        let (data, _) = array.into_raw_vec_and_offset();
        Self::F32 { shape, data }
    }

    /// The tensor's shape, outermost dimension first.
    pub fn shape(&self) -> &[usize] {
        match self {
            Tensor::F32 { shape, .. } | Tensor::I64 { shape, .. } | Tensor::U8 { shape, .. } => {
                shape
            }
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            Tensor::F32 { data, .. } => data.len(),
            Tensor::I64 { data, .. } => data.len(),
            Tensor::U8 { data, .. } => data.len(),
        }
    }

    /// Whether the tensor holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrows the data as f32, or fails with the observed element type.
    pub fn as_f32(&self) -> Result<(&[usize], &[f32]), OCRError> {
        match self {
            Tensor::F32 { shape, data } => Ok((shape, data)),
            other => Err(OCRError::invalid_input(format!(
                "expected f32 tensor, got {} with shape {:?}",
                other.type_name(),
                other.shape()
            ))),
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Tensor::F32 { .. } => "f32",
            Tensor::I64 { .. } => "i64",
            Tensor::U8 { .. } => "u8",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_f32_rejects_length_mismatch() {
        let err = Tensor::from_f32(vec![2, 3], vec![0.0; 5]);
        assert!(err.is_err());
    }

    #[test]
    fn from_array4_preserves_shape_and_data() {
        let array = Tensor4D::from_shape_fn((1, 2, 2, 2), |(_, c, y, x)| (c * 4 + y * 2 + x) as f32);
        let tensor = Tensor::from_array4(array);
        assert_eq!(tensor.shape(), &[1, 2, 2, 2]);
        let (_, data) = tensor.as_f32().unwrap();
        assert_eq!(data[0], 0.0);
        assert_eq!(data[7], 7.0);
    }

    #[test]
    fn as_f32_rejects_other_types() {
        let tensor = Tensor::from_i64(vec![1, 1], vec![0]).unwrap();
        assert!(tensor.as_f32().is_err());
    }
}
