//! Verse references - the canonical key of every cached verse
//!
//! Canonical form: `BG <chapter>.<verse>`
//!
//! The parser accepts the loose forms people actually type:
//! - `BG 2.47`, `bg 15-7`, `2:47`
//! - `Gita 9.34`, `Bhagavad-Gita 9.34`, `B.G. 18.66`
//!
//! Verse ranges (`2.46-47`) are rejected with their own error variant rather
//! than truncated to the first verse.

use crate::corpus;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use regex::Regex;

/// Reference parsing failures. Always a user input fault; never retried and
/// never the cause of a network call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("empty verse reference")]
    Empty,

    #[error("no chapter/verse numbers in {0:?}")]
    NoNumbers(String),

    #[error("malformed verse reference {0:?} (expected e.g. \"BG 2.47\")")]
    Malformed(String),

    #[error("chapter must be 1-18, got {0}")]
    ChapterOutOfRange(u32),

    #[error("chapter {chapter} has {max} verses, got verse {verse}")]
    VerseOutOfRange { chapter: u8, verse: u32, max: u16 },

    #[error("verse ranges are not supported: {0:?}")]
    VerseRange(String),

    #[error("unexpected trailing input {0:?}")]
    TrailingInput(String),
}

/// A validated (chapter, verse) pair.
///
/// Ordering is chapter first, then verse, which is also corpus order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VerseRef {
    pub chapter: u8,
    pub verse: u16,
}

impl VerseRef {
    /// Build a reference, checking it against the corpus table.
    pub fn new(chapter: u32, verse: u32) -> Result<Self, ParseError> {
        let chapter_num = u8::try_from(chapter)
            .ok()
            .filter(|c| corpus::verse_count(*c).is_some())
            .ok_or(ParseError::ChapterOutOfRange(chapter))?;
        let max = corpus::verse_count(chapter_num).ok_or(ParseError::ChapterOutOfRange(chapter))?;
        if verse == 0 || verse > u32::from(max) {
            return Err(ParseError::VerseOutOfRange { chapter: chapter_num, verse, max });
        }
        Ok(Self { chapter: chapter_num, verse: verse as u16 })
    }

    /// Parse a free-form reference
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        parse_reference(text)
    }

    /// Canonical key string, e.g. `BG 2.47`
    pub fn to_key(&self) -> String {
        format!("BG {}.{}", self.chapter, self.verse)
    }

    /// Every reference in the corpus, in order.
    pub fn all() -> impl Iterator<Item = VerseRef> {
        (1..=corpus::CHAPTER_COUNT).flat_map(|chapter| {
            let max = corpus::verse_count(chapter).unwrap_or(0);
            (1..=max).map(move |verse| VerseRef { chapter, verse })
        })
    }
}

fn reference_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?is)^(?:(?:bhagavad[\s-]*)?g[iī]t[aā]|b\.?\s*g\.?)?\s*([0-9]+)\s*[.:\-]\s*([0-9]+)(.*)$",
        )
        .unwrap_or_else(|e| panic!("invalid reference pattern: {e}"))
    })
}

fn range_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[\-–—,]\s*[0-9]+").unwrap_or_else(|e| panic!("invalid range pattern: {e}"))
    })
}

/// Parse a textual reference into a validated [`VerseRef`].
pub fn parse_reference(text: &str) -> Result<VerseRef, ParseError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }

    let Some(caps) = reference_regex().captures(trimmed) else {
        if !trimmed.chars().any(char::is_numeric) {
            return Err(ParseError::NoNumbers(trimmed.to_string()));
        }
        return Err(ParseError::Malformed(trimmed.to_string()));
    };

    let rest = caps.get(3).map(|m| m.as_str().trim()).unwrap_or("");
    if !rest.is_empty() {
        if range_regex().is_match(rest) {
            return Err(ParseError::VerseRange(trimmed.to_string()));
        }
        return Err(ParseError::TrailingInput(rest.to_string()));
    }

    // Overlong digit runs saturate so they surface as out-of-range.
    let chapter = caps[1].parse::<u32>().unwrap_or(u32::MAX);
    let verse = caps[2].parse::<u32>().unwrap_or(u32::MAX);
    VerseRef::new(chapter, verse)
}

impl fmt::Display for VerseRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BG {}.{}", self.chapter, self.verse)
    }
}

impl FromStr for VerseRef {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, ParseError> {
        parse_reference(s)
    }
}

impl Serialize for VerseRef {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_key())
    }
}

impl<'de> Deserialize<'de> for VerseRef {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_reference(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(text: &str) -> (u8, u16) {
        let r = parse_reference(text).unwrap();
        (r.chapter, r.verse)
    }

    #[test]
    fn test_accepted_forms() {
        assert_eq!(parsed("BG 2.47"), (2, 47));
        assert_eq!(parsed("bg 2.47"), (2, 47));
        assert_eq!(parsed("2.47"), (2, 47));
        assert_eq!(parsed("2:47"), (2, 47));
        assert_eq!(parsed("bg 15-7"), (15, 7));
        assert_eq!(parsed("Gita 9.34"), (9, 34));
        assert_eq!(parsed("Bhagavad Gita 9.34"), (9, 34));
        assert_eq!(parsed("Bhagavad-Gita 9.34"), (9, 34));
        assert_eq!(parsed("Bhagavad-gītā 9.34"), (9, 34));
        assert_eq!(parsed("B.G. 18.66"), (18, 66));
        assert_eq!(parsed("BG 9:34"), (9, 34));
        assert_eq!(parsed("BG 2 . 47"), (2, 47));
        assert_eq!(parsed("  bg2.47  "), (2, 47));
        assert_eq!(parsed("18.78"), (18, 78));
    }

    #[test]
    fn test_range_bounds() {
        assert_eq!(
            parse_reference("1.48"),
            Err(ParseError::VerseOutOfRange { chapter: 1, verse: 48, max: 47 })
        );
        assert_eq!(parse_reference("19.1"), Err(ParseError::ChapterOutOfRange(19)));
        assert_eq!(parse_reference("0.1"), Err(ParseError::ChapterOutOfRange(0)));
        assert!(matches!(parse_reference("2.0"), Err(ParseError::VerseOutOfRange { .. })));
        assert!(matches!(
            parse_reference("99999999999.1"),
            Err(ParseError::ChapterOutOfRange(_))
        ));
    }

    #[test]
    fn test_rejects_malformed() {
        assert_eq!(parse_reference(""), Err(ParseError::Empty));
        assert_eq!(parse_reference("hello"), Err(ParseError::NoNumbers("hello".into())));
        assert!(matches!(parse_reference("BG 2 47"), Err(ParseError::Malformed(_))));
        assert!(matches!(parse_reference("chapter two 2.47"), Err(ParseError::Malformed(_))));
        assert!(matches!(parse_reference("BG 2.47 please"), Err(ParseError::TrailingInput(_))));
        assert!(matches!(parse_reference("2.4.7"), Err(ParseError::TrailingInput(_))));
    }

    #[test]
    fn test_non_ascii_digits_are_malformed() {
        assert_eq!(parse_reference("२.४७"), Err(ParseError::Malformed("२.४७".into())));
        assert_eq!(parse_reference("BG ٢.٤٧"), Err(ParseError::Malformed("BG ٢.٤٧".into())));
    }

    #[test]
    fn test_verse_range_is_distinct_error() {
        assert!(matches!(parse_reference("2.46-47"), Err(ParseError::VerseRange(_))));
        assert!(matches!(parse_reference("BG 2.46 - 47"), Err(ParseError::VerseRange(_))));
        assert!(matches!(parse_reference("2.46–47"), Err(ParseError::VerseRange(_))));
        assert!(matches!(parse_reference("2.46,47"), Err(ParseError::VerseRange(_))));
    }

    #[test]
    fn test_parse_inverts_display() {
        for r in VerseRef::all() {
            assert_eq!(parse_reference(&r.to_string()), Ok(r));
        }
        assert_eq!(VerseRef::all().count(), corpus::corpus_size());
    }

    #[test]
    fn test_serde_as_key_string() {
        let r = VerseRef::new(9, 34).unwrap();
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(json, "\"BG 9.34\"");
        let back: VerseRef = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
    }
}
