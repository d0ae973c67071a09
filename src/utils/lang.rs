//! Language character tables and ignore-set synthesis.
//!
//! The recognizer decodes over its full charset unless an ignore set masks
//! classes out. The set is synthesized from, in priority order: an allowlist
//! (ignore everything not listed), a blocklist (ignore what is listed), or
//! the language list (ignore charset characters outside the union of the
//! per-language sets and the default symbol set).

use crate::core::constants::DEFAULT_SYMBOL_SET;
use crate::core::errors::OCRError;
use crate::core::options::OcrOptions;
use crate::processors::decode::CtcDecoder;
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

static LANGUAGE_CHARS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut map = HashMap::new();
    map.insert(
        "en",
        "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ",
    );
    map.insert(
        "fr",
        "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZàâéèêëîïôùûüçœÀÂÉÈÊËÎÏÔÙÛÜÇŒ",
    );
    map.insert(
        "de",
        "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZäöüßÄÖÜ",
    );
    map.insert(
        "es",
        "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZáéíóúüñÁÉÍÓÚÜÑ¿¡",
    );
    map.insert(
        "it",
        "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZàèéìòùÀÈÉÌÒÙ",
    );
    map.insert(
        "pt",
        "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZàáâãçéêíóôõúÀÁÂÃÇÉÊÍÓÔÕÚ",
    );
    map
});

/// Characters recognizable under the given language codes.
///
/// `*` disables language filtering entirely and returns `None`. Unknown
/// codes are unsupported-config errors.
pub fn characters_for_languages(langs: &[String]) -> Result<Option<HashSet<char>>, OCRError> {
    if langs.iter().any(|l| l == "*") {
        return Ok(None);
    }
    let mut set: HashSet<char> = DEFAULT_SYMBOL_SET.chars().collect();
    for lang in langs {
        let chars = LANGUAGE_CHARS.get(lang.as_str()).ok_or_else(|| {
            OCRError::config(format!("unknown language code '{lang}'"))
        })?;
        set.extend(chars.chars());
    }
    Ok(Some(set))
}

/// Synthesizes the CTC class indices to ignore for the given options.
///
/// Character-level lists are translated through the decoder's blank offset.
pub fn synthesize_ignore_classes(
    decoder: &CtcDecoder,
    charset: &[char],
    options: &OcrOptions,
) -> Result<Vec<usize>, OCRError> {
    let ignored_chars: HashSet<char> = if let Some(allow) = &options.allowlist {
        let allowed: HashSet<char> = allow.chars().collect();
        charset.iter().copied().filter(|c| !allowed.contains(c)).collect()
    } else if let Some(block) = &options.blocklist {
        let blocked: HashSet<char> = block.chars().collect();
        charset.iter().copied().filter(|c| blocked.contains(c)).collect()
    } else {
        match characters_for_languages(&options.lang_list)? {
            Some(keep) => charset.iter().copied().filter(|c| !keep.contains(c)).collect(),
            None => HashSet::new(),
        }
    };

    let mut classes: Vec<usize> = ignored_chars
        .into_iter()
        .filter_map(|c| decoder.class_for_char(c))
        .collect();
    classes.sort_unstable();
    Ok(classes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoder(charset: &[char]) -> CtcDecoder {
        CtcDecoder::new(charset.to_vec(), 0).unwrap()
    }

    #[test]
    fn allowlist_wins_over_blocklist_and_languages() {
        let charset: Vec<char> = "abc1".chars().collect();
        let d = decoder(&charset);
        let opts = OcrOptions {
            allowlist: Some("a1".to_string()),
            blocklist: Some("a".to_string()),
            ..Default::default()
        };
        let ignored = synthesize_ignore_classes(&d, &charset, &opts).unwrap();
        // 'b' and 'c' are outside the allowlist; classes are charset index + 1
        assert_eq!(ignored, vec![2, 3]);
    }

    #[test]
    fn blocklist_ignores_only_listed_characters() {
        let charset: Vec<char> = "abc".chars().collect();
        let d = decoder(&charset);
        let opts = OcrOptions {
            blocklist: Some("b".to_string()),
            ..Default::default()
        };
        let ignored = synthesize_ignore_classes(&d, &charset, &opts).unwrap();
        assert_eq!(ignored, vec![2]);
    }

    #[test]
    fn language_filter_keeps_symbols_and_letters() {
        let charset: Vec<char> = "a1!é".chars().collect();
        let d = decoder(&charset);
        let opts = OcrOptions::default(); // lang_list = ["en"]
        let ignored = synthesize_ignore_classes(&d, &charset, &opts).unwrap();
        // 'é' is not English and not a symbol; charset slot 3 -> class 4
        assert_eq!(ignored, vec![4]);

        let opts = OcrOptions {
            lang_list: vec!["en".to_string(), "fr".to_string()],
            ..Default::default()
        };
        let ignored = synthesize_ignore_classes(&d, &charset, &opts).unwrap();
        assert!(ignored.is_empty());
    }

    #[test]
    fn wildcard_language_disables_filtering() {
        let charset: Vec<char> = "aé漢".chars().collect();
        let d = decoder(&charset);
        let opts = OcrOptions {
            lang_list: vec!["*".to_string()],
            ..Default::default()
        };
        let ignored = synthesize_ignore_classes(&d, &charset, &opts).unwrap();
        assert!(ignored.is_empty());
    }

    #[test]
    fn unknown_language_is_an_error() {
        let charset: Vec<char> = "a".chars().collect();
        let d = decoder(&charset);
        let opts = OcrOptions {
            lang_list: vec!["zz".to_string()],
            ..Default::default()
        };
        assert!(synthesize_ignore_classes(&d, &charset, &opts).is_err());
    }
}
