//! Transliteration normalization
//!
//! Folds IAST-style romanized Sanskrit (and whatever a speech-to-text engine
//! made of it) down to plain lowercase ASCII so that spellings like
//! `māṁ`, `mam` and `MĀṀ` compare equal.
//!
//! Steps, always in this order:
//! 0. Unicode NFC, so decomposed input (base letter + combining mark) hits
//!    the same fold entries as precomposed input
//! 1. lowercase
//! 2. diacritic folding via [`fold_table`]
//! 3. drop everything except ASCII letters, digits and whitespace
//! 4. collapse whitespace runs and trim

use std::collections::HashMap;
use std::sync::OnceLock;
use unicode_normalization::UnicodeNormalization;

const DIACRITIC_FOLDS: &[(char, &str)] = &[
    ('ā', "a"),
    ('ī', "i"),
    ('ū', "u"),
    ('ṛ', "ri"),
    ('ṝ', "ri"),
    ('ḷ', "l"),
    ('ḹ', "li"),
    ('ṭ', "t"),
    ('ḍ', "d"),
    ('ṁ', "m"),
    ('ṃ', "m"),
    ('ḥ', "h"),
    ('ṣ', "sh"),
    ('ś', "sh"),
    ('ṇ', "n"),
    ('ṅ', "n"),
    ('ñ', "n"),
];

/// Immutable fold table, built once on first use.
pub fn fold_table() -> &'static HashMap<char, &'static str> {
    static TABLE: OnceLock<HashMap<char, &'static str>> = OnceLock::new();
    TABLE.get_or_init(|| DIACRITIC_FOLDS.iter().copied().collect())
}

/// Normalize text for fuzzy comparison. Total and deterministic.
pub fn normalize(text: &str) -> String {
    let table = fold_table();
    let mut folded = String::with_capacity(text.len());

    for c in text.nfc().flat_map(char::to_lowercase) {
        if let Some(replacement) = table.get(&c) {
            folded.push_str(replacement);
        } else if c.is_ascii_alphanumeric() {
            folded.push(c);
        } else if c.is_whitespace() {
            folded.push(' ');
        }
        // anything else (punctuation, combining marks, other scripts) is dropped
    }

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Distinct normalized words of at least `min_len` characters.
pub fn keywords(normalized: &str, min_len: usize) -> std::collections::HashSet<&str> {
    normalized
        .split(' ')
        .filter(|w| w.len() >= min_len)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercase_and_fold() {
        assert_eq!(normalize("Karmaṇy"), "karmany");
        assert_eq!(normalize("MĀṀ"), "mam");
        for (input, expected) in [
            ("ā", "a"),
            ("ī", "i"),
            ("ū", "u"),
            ("ṛ", "ri"),
            ("ṣ", "sh"),
            ("ś", "sh"),
            ("ṇ", "n"),
            ("ṅ", "n"),
            ("ñ", "n"),
            ("ḍ", "d"),
            ("ṁ", "m"),
            ("ḥ", "h"),
        ] {
            assert_eq!(normalize(input), expected, "folding {input}");
        }
    }

    #[test]
    fn test_punctuation_and_spaces() {
        assert_eq!(normalize("karma-yoga"), "karmayoga");
        assert_eq!(normalize("karmaṇy   evādhikāras   te"), "karmany evadhikaras te");
        assert_eq!(normalize("  saṅgo'stv\takarmaṇi \n"), "sangostv akarmani");
        assert_eq!(normalize("text ||2-47||"), "text 247");
    }

    #[test]
    fn test_decomposed_input_folds_like_precomposed() {
        let decomposed = "kr\u{0323}s\u{0323}n\u{0323}a";
        assert_eq!(normalize(decomposed), "krishna");
        assert_eq!(normalize(decomposed), normalize("kṛṣṇa"));
        assert_eq!(normalize("S\u{0301}ri\u{0304}"), normalize("Śrī"));
        assert_eq!(normalize("ma\u{0307}m"), "mam");
    }

    #[test]
    fn test_combining_marks_dropped() {
        // "mā" written with a combining macron
        assert_eq!(normalize("ma\u{0304}"), "ma");
    }

    #[test]
    fn test_idempotent() {
        for s in [
            "",
            "   ",
            "Karmaṇy evādhikāras te mā phaleṣu kadācana",
            "man manā bhava mad-bhākto mad-yajī mam namāskuru",
            "कर्मण्येवाधिकारस्ते",
            "ṚṜḶ ṭḍ ṣś ÑṄṆ -- 12 :: x",
        ] {
            let once = normalize(s);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn test_keywords() {
        let n = normalize("man manā bhava mad-bhākto");
        let k = keywords(&n, 3);
        assert!(k.contains("man"));
        assert!(k.contains("madbhakto"));
        assert_eq!(k.len(), 4);
        assert!(keywords("", 3).is_empty());
    }
}
