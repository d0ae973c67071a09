//! Recognizer charset handling.
//!
//! A charset file is UTF-8 text on a single logical line (a trailing newline
//! is tolerated), one character per codepoint slot. The CTC blank is an extra
//! class that lives outside the file, conventionally at index 0.

use crate::core::errors::OCRError;
use std::path::Path;

/// The recognizer's character vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Charset {
    chars: Vec<char>,
}

impl Charset {
    /// Builds a charset from its characters.
    pub fn new(chars: Vec<char>) -> Result<Self, OCRError> {
        if chars.is_empty() {
            return Err(OCRError::config("charset must not be empty"));
        }
        Ok(Self { chars })
    }

    /// Parses charset text: one logical line, trailing newline stripped.
    pub fn from_text(text: &str) -> Result<Self, OCRError> {
        let line = text.strip_suffix('\n').unwrap_or(text);
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.contains('\n') {
            return Err(OCRError::config(
                "charset file must contain a single logical line",
            ));
        }
        Self::new(line.chars().collect())
    }

    /// Reads and parses a charset file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, OCRError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            OCRError::config(format!(
                "charset read failed for '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_text(&text)
    }

    /// The characters in slot order.
    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    /// Number of character slots (excluding the blank).
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// Whether the charset is empty (never true for a constructed value).
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn trailing_newline_is_tolerated() {
        let a = Charset::from_text("abc").unwrap();
        let b = Charset::from_text("abc\n").unwrap();
        let c = Charset::from_text("abc\r\n").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(a.len(), 3);
    }

    #[test]
    fn interior_newline_is_rejected() {
        assert!(Charset::from_text("ab\ncd").is_err());
        assert!(Charset::from_text("").is_err());
    }

    #[test]
    fn codepoints_not_bytes() {
        let cs = Charset::from_text("aé漢").unwrap();
        assert_eq!(cs.len(), 3);
        assert_eq!(cs.chars()[2], '漢');
    }

    #[test]
    fn reads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "0123456789abc \n").unwrap();
        let cs = Charset::from_file(file.path()).unwrap();
        assert_eq!(cs.len(), 14);
        assert_eq!(cs.chars()[13], ' ');
    }
}
