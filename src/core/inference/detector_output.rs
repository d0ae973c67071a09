//! Normalization of detector output shapes.
//!
//! Exported CRAFT graphs disagree on how the two score maps come out: a
//! single `[1, H, W, 2]` tensor, a single `[1, 2, H, W]` tensor, or two named
//! tensors `text` and `link`. This module folds all three into the canonical
//! `(text, link)` heatmap pair and rejects anything else explicitly.

use crate::core::errors::OCRError;
use crate::core::tensor::{Tensor, Tensor2D};

/// Which layout the detector output arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorOutputLayout {
    /// One tensor `[1, H, W, 2]`, score channel on the last axis.
    ChannelsLast,
    /// One tensor `[1, 2, H, W]`, score channel on axis 1.
    ChannelsFirst,
    /// Two tensors named `text` and `link`.
    NamedPair,
}

/// Normalizes detector outputs to the `(text, link)` heatmap pair.
///
/// Returns the two maps indexed `[y, x]` plus the layout that was detected,
/// or a shape-mismatch error naming the observed shape.
pub fn split_detector_heatmaps(
    outputs: &[(String, Tensor)],
    model_name: &str,
) -> Result<(Tensor2D, Tensor2D, DetectorOutputLayout), OCRError> {
    let named_text = outputs.iter().find(|(name, _)| name == "text");
    let named_link = outputs.iter().find(|(name, _)| name == "link");
    if let (Some((_, text)), Some((_, link))) = (named_text, named_link) {
        let text = single_map(text, model_name)?;
        let link = single_map(link, model_name)?;
        if text.dim() != link.dim() {
            return Err(OCRError::shape_mismatch(
                model_name,
                "text and link heatmaps of equal shape",
                &[link.dim().0, link.dim().1],
            ));
        }
        return Ok((text, link, DetectorOutputLayout::NamedPair));
    }

    let (_, first) = outputs
        .iter()
        .find(|(_, t)| matches!(t, Tensor::F32 { .. }))
        .ok_or_else(|| {
            OCRError::shape_mismatch(model_name, "an f32 heatmap tensor", &[])
        })?;
    let (shape, data) = first.as_f32()?;

    match shape {
        [1, h, w, 2] => {
            let (h, w) = (*h, *w);
            let mut text = Tensor2D::zeros((h, w));
            let mut link = Tensor2D::zeros((h, w));
            for y in 0..h {
                for x in 0..w {
                    let base = (y * w + x) * 2;
                    text[[y, x]] = data[base];
                    link[[y, x]] = data[base + 1];
                }
            }
            Ok((text, link, DetectorOutputLayout::ChannelsLast))
        }
        [1, 2, h, w] => {
            let (h, w) = (*h, *w);
            let plane = h * w;
            let text = Tensor2D::from_shape_vec((h, w), data[..plane].to_vec())?;
            let link = Tensor2D::from_shape_vec((h, w), data[plane..2 * plane].to_vec())?;
            Ok((text, link, DetectorOutputLayout::ChannelsFirst))
        }
        other => Err(OCRError::shape_mismatch(
            model_name,
            "[1,H,W,2], [1,2,H,W], or named 'text'/'link' tensors",
            other,
        )),
    }
}

fn single_map(tensor: &Tensor, model_name: &str) -> Result<Tensor2D, OCRError> {
    let (shape, data) = tensor.as_f32()?;
    let (h, w) = match shape {
        [h, w] => (*h, *w),
        [1, h, w] => (*h, *w),
        [1, 1, h, w] => (*h, *w),
        other => {
            return Err(OCRError::shape_mismatch(
                model_name,
                "a single-channel heatmap",
                other,
            ));
        }
    };
    Ok(Tensor2D::from_shape_vec((h, w), data.to_vec())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channels_last_is_deinterleaved() {
        // 1x2x2x2: pairs of (text, link) per pixel
        let data = vec![0.1, 0.9, 0.2, 0.8, 0.3, 0.7, 0.4, 0.6];
        let tensor = Tensor::from_f32(vec![1, 2, 2, 2], data).unwrap();
        let (text, link, layout) =
            split_detector_heatmaps(&[("out".into(), tensor)], "craft").unwrap();
        assert_eq!(layout, DetectorOutputLayout::ChannelsLast);
        assert_eq!(text[[0, 0]], 0.1);
        assert_eq!(link[[0, 0]], 0.9);
        assert_eq!(text[[1, 1]], 0.4);
        assert_eq!(link[[1, 1]], 0.6);
    }

    #[test]
    fn channels_first_is_split_by_plane() {
        let data = vec![0.1, 0.2, 0.3, 0.4, 0.9, 0.8, 0.7, 0.6];
        let tensor = Tensor::from_f32(vec![1, 2, 2, 2], data).unwrap();
        // ambiguous [1,2,2,2] resolves as channels-last by declaration order
        let (_, _, layout) = split_detector_heatmaps(&[("out".into(), tensor)], "craft").unwrap();
        assert_eq!(layout, DetectorOutputLayout::ChannelsLast);

        let data = vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.9, 0.8, 0.7, 0.6, 0.5, 0.4];
        let tensor = Tensor::from_f32(vec![1, 2, 2, 3], data).unwrap();
        let (text, link, layout) =
            split_detector_heatmaps(&[("out".into(), tensor)], "craft").unwrap();
        assert_eq!(layout, DetectorOutputLayout::ChannelsFirst);
        assert_eq!(text[[0, 0]], 0.1);
        assert_eq!(link[[1, 2]], 0.4);
    }

    #[test]
    fn named_pair_is_matched_by_name() {
        let text = Tensor::from_f32(vec![1, 2, 2], vec![0.1; 4]).unwrap();
        let link = Tensor::from_f32(vec![1, 2, 2], vec![0.2; 4]).unwrap();
        let outputs = vec![("text".to_string(), text), ("link".to_string(), link)];
        let (t, l, layout) = split_detector_heatmaps(&outputs, "craft").unwrap();
        assert_eq!(layout, DetectorOutputLayout::NamedPair);
        assert_eq!(t[[1, 1]], 0.1);
        assert_eq!(l[[0, 0]], 0.2);
    }

    #[test]
    fn unknown_shape_is_rejected_with_observed_shape() {
        let tensor = Tensor::from_f32(vec![1, 3, 2, 2], vec![0.0; 12]).unwrap();
        let err = split_detector_heatmaps(&[("out".into(), tensor)], "craft").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("craft"));
        assert!(msg.contains("[1, 3, 2, 2]"));
    }
}
