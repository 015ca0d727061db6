//! Verse and chapter records
//!
//! A [`VerseRecord`] is built from one bulk-source payload and optionally
//! enriched with the authoritative translation block. Records are immutable
//! once built; a fresher fetch of the same key replaces the whole record.

use crate::corpus;
use crate::reference::VerseRef;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;

/// Keys under which the bulk source carries the trusted author's translation.
const TRUSTED_AUTHOR_KEYS: [&str; 2] = ["prabhu", "spiurp"];

/// Text fields of a translator entry, in preference order.
const COMMENTARY_TEXT_KEYS: [&str; 5] = ["et", "ec", "ht", "hc", "sc"];

/// Whether the trusted content of a record came from the authoritative source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Enrichment {
    /// Bulk data only; enrichment not attempted yet (e.g. seeded)
    Pending,
    /// Authoritative block fetched and merged
    Authoritative,
    /// Authoritative fetch failed; trusted translation is the bulk fallback
    Degraded,
}

impl Enrichment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Enrichment::Pending => "pending",
            Enrichment::Authoritative => "authoritative",
            Enrichment::Degraded => "degraded",
        }
    }

    pub fn all() -> &'static [Enrichment] {
        &[Enrichment::Pending, Enrichment::Authoritative, Enrichment::Degraded]
    }
}

impl FromStr for Enrichment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(Enrichment::Pending),
            "authoritative" => Ok(Enrichment::Authoritative),
            "degraded" => Ok(Enrichment::Degraded),
            _ => Err(Error::Payload(format!("unknown enrichment state: {}", s))),
        }
    }
}

impl std::fmt::Display for Enrichment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One translator's rendering of a verse
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commentary {
    pub author: Option<String>,
    pub text: String,
}

/// Word-for-word synonyms, translation and purport from the authoritative source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthoritativeText {
    pub synonyms: Option<String>,
    pub translation: Option<String>,
    pub purport: Option<String>,
}

impl AuthoritativeText {
    pub fn is_empty(&self) -> bool {
        self.synonyms.is_none() && self.translation.is_none() && self.purport.is_none()
    }
}

/// A resolved verse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerseRecord {
    /// Canonical reference; the cache key
    pub reference: VerseRef,
    /// Devanagari source text
    pub devanagari: Option<String>,
    /// Romanized transliteration (IAST)
    pub transliteration: Option<String>,
    /// Translator id -> translation/commentary
    pub translations: BTreeMap<String, Commentary>,
    /// Trusted translation: authoritative when enriched, else the bulk fallback
    pub translation: Option<String>,
    /// Authoritative block, when enrichment succeeded
    pub authoritative: Option<AuthoritativeText>,
    pub enrichment: Enrichment,
    /// Link to the authoritative page for this verse
    pub source_url: String,
    /// Raw bulk payload, kept verbatim
    pub raw: Value,
    pub fetched_at: DateTime<Utc>,
}

impl VerseRecord {
    /// Build a bulk-only record from a verse payload.
    pub fn from_bulk(reference: VerseRef, payload: Value, source_url: String) -> Result<Self> {
        let object = payload
            .as_object()
            .ok_or_else(|| Error::Payload(format!("{}: verse payload is not an object", reference)))?;

        let mut translations = BTreeMap::new();
        for (key, value) in object {
            if let Some(commentary) = commentary_from(value) {
                translations.insert(key.clone(), commentary);
            }
        }

        Ok(Self {
            reference,
            devanagari: non_empty_str(object.get("slok")),
            transliteration: non_empty_str(object.get("transliteration")),
            translations,
            translation: trusted_author_translation(&payload),
            authoritative: None,
            enrichment: Enrichment::Pending,
            source_url,
            raw: payload,
            fetched_at: Utc::now(),
        })
    }

    /// Merge the authoritative block. Fields it lacks keep their bulk values.
    pub fn enriched(mut self, text: AuthoritativeText) -> Self {
        if let Some(translation) = &text.translation {
            self.translation = Some(translation.clone());
        }
        self.authoritative = Some(text);
        self.enrichment = Enrichment::Authoritative;
        self
    }

    /// Mark that enrichment was attempted and failed.
    pub fn degraded(mut self) -> Self {
        self.enrichment = Enrichment::Degraded;
        self
    }

    pub fn synonyms(&self) -> Option<&str> {
        self.authoritative.as_ref().and_then(|a| a.synonyms.as_deref())
    }

    pub fn purport(&self) -> Option<&str> {
        self.authoritative.as_ref().and_then(|a| a.purport.as_deref())
    }
}

/// Best-effort trusted translation from a bulk payload.
///
/// Looks at `prabhu` then `spiurp`, top-level or nested under `commentaries`,
/// preferring English over Hindi.
pub fn trusted_author_translation(payload: &Value) -> Option<String> {
    TRUSTED_AUTHOR_KEYS.iter().find_map(|key| {
        let entry = payload
            .get(key)
            .filter(|v| !v.is_null())
            .or_else(|| payload.get("commentaries").and_then(|c| c.get(key)))?;
        non_empty_str(entry.get("et")).or_else(|| non_empty_str(entry.get("ht")))
    })
}

fn commentary_from(value: &Value) -> Option<Commentary> {
    let entry = value.as_object()?;
    let author = entry.get("author")?.as_str().map(str::to_string);
    let text = COMMENTARY_TEXT_KEYS
        .iter()
        .find_map(|k| non_empty_str(entry.get(*k)))?;
    Some(Commentary { author, text })
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Chapter metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterRecord {
    pub number: u8,
    /// Sanskrit name (Devanagari)
    pub name: Option<String>,
    pub name_transliterated: Option<String>,
    pub name_meaning: Option<String>,
    pub verses_count: u16,
    pub summary: Option<String>,
    pub raw: Value,
}

impl ChapterRecord {
    /// Build from a chapter payload, checking it against the corpus table.
    pub fn from_bulk(payload: Value) -> Result<Self> {
        let number = payload
            .get("chapter_number")
            .and_then(Value::as_u64)
            .and_then(|n| u8::try_from(n).ok())
            .ok_or_else(|| Error::Payload("chapter payload without chapter_number".to_string()))?;
        let expected = corpus::verse_count(number)
            .ok_or_else(|| Error::Payload(format!("chapter {} outside the corpus", number)))?;

        let verses_count = payload.get("verses_count").and_then(Value::as_u64);
        if verses_count != Some(u64::from(expected)) {
            return Err(Error::Payload(format!(
                "chapter {} reports {:?} verses, corpus has {}",
                number, verses_count, expected
            )));
        }

        Ok(Self {
            number,
            name: non_empty_str(payload.get("name")),
            name_transliterated: non_empty_str(payload.get("transliteration")),
            name_meaning: english_text(payload.get("meaning")),
            verses_count: expected,
            summary: english_text(payload.get("summary")),
            raw: payload,
        })
    }
}

/// `{"en": ..., "hi": ...}` or a plain string
fn english_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Object(map) => non_empty_str(map.get("en")),
        other => non_empty_str(Some(other)),
    }
}
