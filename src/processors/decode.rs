//! Greedy CTC decoding.
//!
//! Converts recognizer logits into text by per-step argmax with an ignore
//! mask, blank/duplicate collapse, and a geometric-mean confidence. The
//! per-step probability is a numerically stable softmax restricted to the
//! non-ignored classes.

use crate::core::errors::OCRError;

/// Greedy CTC decoder over a fixed charset.
///
/// Class index `blank` is the CTC blank. With the conventional `blank == 0`,
/// class `i` maps to `charset[i - 1]`; for a non-zero blank, classes above it
/// shift down by one.
#[derive(Debug, Clone)]
pub struct CtcDecoder {
    charset: Vec<char>,
    blank: usize,
}

/// One decoded sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedText {
    /// Collapsed text.
    pub text: String,
    /// Geometric-mean confidence in `[0, 1]`; 0 when nothing was kept.
    pub confidence: f32,
}

impl CtcDecoder {
    /// Creates a decoder; `blank` must not collide with a charset slot.
    pub fn new(charset: Vec<char>, blank: usize) -> Result<Self, OCRError> {
        if charset.is_empty() {
            return Err(OCRError::config("charset must not be empty"));
        }
        if blank > charset.len() {
            return Err(OCRError::config(format!(
                "blank index {} outside class range 0..={}",
                blank,
                charset.len()
            )));
        }
        Ok(Self { charset, blank })
    }

    /// Number of classes the logits must carry (charset plus blank).
    pub fn num_classes(&self) -> usize {
        self.charset.len() + 1
    }

    /// The charset character behind a class index, `None` for the blank.
    pub fn char_for_class(&self, class: usize) -> Option<char> {
        if class == self.blank {
            return None;
        }
        let slot = if class > self.blank { class - 1 } else { class };
        self.charset.get(slot).copied()
    }

    /// The class index of a charset character, `None` when absent.
    pub fn class_for_char(&self, ch: char) -> Option<usize> {
        let slot = self.charset.iter().position(|&c| c == ch)?;
        Some(if slot >= self.blank { slot + 1 } else { slot })
    }

    /// Decodes a `[steps, classes]` logits buffer.
    ///
    /// `ignore` lists class indices masked out of both the argmax and the
    /// softmax denominator. Ignoring every class yields empty text.
    pub fn decode_greedy(
        &self,
        logits: &[f32],
        steps: usize,
        classes: usize,
        ignore: &[usize],
    ) -> Result<DecodedText, OCRError> {
        if classes != self.num_classes() {
            return Err(OCRError::invalid_input(format!(
                "logits declare {classes} classes, charset implies {}",
                self.num_classes()
            )));
        }
        if logits.len() != steps * classes {
            return Err(OCRError::invalid_input(format!(
                "logits length {} does not match {steps}x{classes}",
                logits.len()
            )));
        }

        let mut ignored = vec![false; classes];
        for &class in ignore {
            if let Some(slot) = ignored.get_mut(class) {
                *slot = true;
            }
        }
        if ignored.iter().all(|&i| i) {
            return Ok(DecodedText {
                text: String::new(),
                confidence: 0.0,
            });
        }

        let mut text = String::new();
        let mut kept_probs = Vec::new();
        let mut prev_index = usize::MAX;

        for t in 0..steps {
            let row = &logits[t * classes..(t + 1) * classes];
            let mut best_index = usize::MAX;
            let mut best_value = f32::NEG_INFINITY;
            for (c, &value) in row.iter().enumerate() {
                if !ignored[c] && value > best_value {
                    best_value = value;
                    best_index = c;
                }
            }

            let mut denom = 0.0f32;
            for (c, &value) in row.iter().enumerate() {
                if !ignored[c] {
                    denom += (value - best_value).exp();
                }
            }
            let prob = if denom > 0.0 { 1.0 / denom } else { 0.0 };

            if best_index != self.blank {
                // kept before duplicate collapse
                kept_probs.push(prob);
                if best_index != prev_index {
                    if let Some(ch) = self.char_for_class(best_index) {
                        text.push(ch);
                    }
                }
            }
            prev_index = best_index;
        }

        let confidence = if text.is_empty() {
            0.0
        } else {
            custom_mean(&kept_probs)
        };
        Ok(DecodedText { text, confidence })
    }
}

/// Geometric-mean confidence: `exp(sum(ln p) * 2 / sqrt(n))`.
///
/// Any non-positive probability forces 0, as does an empty list.
fn custom_mean(probs: &[f32]) -> f32 {
    if probs.is_empty() {
        return 0.0;
    }
    let mut log_sum = 0.0f64;
    for &p in probs {
        if p <= 0.0 {
            return 0.0;
        }
        log_sum += (p as f64).ln();
    }
    (log_sum * 2.0 / (probs.len() as f64).sqrt()).exp() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoder(charset: &str) -> CtcDecoder {
        CtcDecoder::new(charset.chars().collect(), 0).unwrap()
    }

    #[test]
    fn all_blank_logits_yield_empty_text_and_zero_confidence() {
        let d = decoder("abc");
        // 3 steps x 4 classes, blank dominates everywhere
        let mut logits = vec![0.0f32; 12];
        for t in 0..3 {
            logits[t * 4] = 10.0;
        }
        let out = d.decode_greedy(&logits, 3, 4, &[]).unwrap();
        assert_eq!(out.text, "");
        assert_eq!(out.confidence, 0.0);
    }

    #[test]
    fn monotone_class_collapses_to_single_char() {
        let d = decoder("abc");
        let mut logits = vec![0.0f32; 4 * 4];
        for t in 0..4 {
            logits[t * 4 + 2] = 8.0; // class 2 -> 'b'
        }
        let out = d.decode_greedy(&logits, 4, 4, &[]).unwrap();
        assert_eq!(out.text, "b");
        assert!(out.confidence > 0.0);
    }

    #[test]
    fn golden_two_char_sequence() {
        // charset "_abc" is the underscore-blank notation: blank at class 0.
        let d = decoder("abc");
        let mut logits = vec![0.0f32; 3 * 4];
        logits[2] = 5.0;
        logits[4 + 2] = 5.0;
        logits[2 * 4 + 3] = 5.0;
        // classes favored: 2, 2, 3 -> chars 'b','b','c' collapse to "bc"
        let out = d.decode_greedy(&logits, 3, 4, &[]).unwrap();
        assert_eq!(out.text, "bc");
        assert!(out.confidence > 0.0);

        // EasyOCR convention: class 2 at steps 0,1 and class 3 at step 2
        // over charset "_abc" decodes "ab" -- same logits, charset shifted
        let d = decoder("_abc");
        let mut logits = vec![0.0f32; 3 * 5];
        logits[2] = 5.0;
        logits[5 + 2] = 5.0;
        logits[2 * 5 + 3] = 5.0;
        let out = d.decode_greedy(&logits, 3, 5, &[]).unwrap();
        assert_eq!(out.text, "ab");
        assert!(out.confidence > 0.0);
    }

    #[test]
    fn ignore_set_reroutes_argmax() {
        let d = decoder("abc");
        let mut logits = vec![0.0f32; 3 * 4];
        logits[1] = 4.0; // t=0 favors class 1 ('a')
        logits[4 + 2] = 4.0; // t=1 favors class 2 ('b')
        logits[2 * 4 + 2] = 4.0; // t=2 favors class 2 ('b')
        let out = d.decode_greedy(&logits, 3, 4, &[2]).unwrap();
        assert_eq!(out.text, "a");
    }

    #[test]
    fn ignored_classes_leave_softmax_denominator() {
        let d = decoder("ab");
        // one step, classes [blank, a, b]; a and b tie, b ignored
        let logits = vec![0.0, 3.0, 3.0];
        let out = d.decode_greedy(&logits, 1, 3, &[2]).unwrap();
        assert_eq!(out.text, "a");
        // denominator is exp(0-3) + exp(3-3) over {blank, a} only
        let expected_p = 1.0 / ((-3.0f32).exp() + 1.0);
        let expected_conf = (expected_p.ln() * 2.0 / 1.0f32.sqrt()).exp();
        assert!((out.confidence - expected_conf).abs() < 1e-5);
    }

    #[test]
    fn duplicate_probs_count_toward_confidence_before_collapse() {
        let d = decoder("a");
        // two steps both favoring 'a' with different certainty
        let logits = vec![0.0, 2.0, 0.0, 6.0];
        let out = d.decode_greedy(&logits, 2, 2, &[]).unwrap();
        assert_eq!(out.text, "a");
        let p1 = 1.0 / (1.0 + (-2.0f32).exp());
        let p2 = 1.0 / (1.0 + (-6.0f32).exp());
        let expected = ((p1.ln() + p2.ln()) * 2.0 / 2.0f32.sqrt()).exp();
        assert!((out.confidence - expected).abs() < 1e-5);
    }

    #[test]
    fn non_zero_blank_shifts_mapping() {
        let d = CtcDecoder::new("abc".chars().collect(), 1).unwrap();
        assert_eq!(d.char_for_class(0), Some('a'));
        assert_eq!(d.char_for_class(1), None);
        assert_eq!(d.char_for_class(2), Some('b'));
        assert_eq!(d.class_for_char('a'), Some(0));
        assert_eq!(d.class_for_char('b'), Some(2));
        assert_eq!(d.class_for_char('c'), Some(3));
    }

    #[test]
    fn ignoring_everything_yields_empty() {
        let d = decoder("ab");
        let logits = vec![0.0; 6];
        let out = d.decode_greedy(&logits, 2, 3, &[0, 1, 2]).unwrap();
        assert_eq!(out.text, "");
        assert_eq!(out.confidence, 0.0);
    }
}
