//! Storage Layer - the verse cache
//!
//! System of record is SQLite with tables:
//! - verses(ref, chapter, verse, devanagari, transliteration, translations, translation,
//!   authoritative, enrichment, source_url, raw_json, fetched_at)
//! - chapters(chapter_number, name, name_transliterated, name_meaning, verses_count, summary, raw_json)
//!
//! The resolver and matcher only see the [`CacheStore`] trait.

pub mod schema;
pub mod sqlite;

pub use sqlite::SqliteStore;

use crate::corpus;
use crate::reference::VerseRef;
use crate::verse::{ChapterRecord, VerseRecord};
use crate::Result;
use serde::Serialize;
use std::collections::BTreeMap;

/// Key-addressed verse/chapter cache.
///
/// Implementations must allow concurrent readers, serialize writers, and make
/// every `put` atomic per key: readers see the old record or the new one,
/// never a mix.
pub trait CacheStore: Send + Sync {
    fn get(&self, reference: VerseRef) -> Result<Option<VerseRecord>>;

    /// Insert or replace the record for its reference
    fn put(&self, record: &VerseRecord) -> Result<()>;

    fn get_chapter(&self, number: u8) -> Result<Option<ChapterRecord>>;

    /// Insert or replace chapter metadata
    fn put_chapter(&self, chapter: &ChapterRecord) -> Result<()>;

    fn count_verses(&self) -> Result<usize>;

    fn count_chapters(&self) -> Result<usize>;

    /// Every cached verse, in corpus order
    fn all_verses(&self) -> Result<Vec<VerseRecord>>;

    fn contains(&self, reference: VerseRef) -> Result<bool> {
        Ok(self.get(reference)?.is_some())
    }

    /// Case-insensitive substring search over transliteration, translation and source text
    fn search(&self, query: &str, limit: usize) -> Result<Vec<VerseRecord>>;

    fn stats(&self) -> Result<CacheStats>;
}

/// Cache statistics
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub verses: usize,
    pub chapters: usize,
    pub corpus_size: usize,
    pub by_enrichment: BTreeMap<String, usize>,
}

impl CacheStats {
    pub fn is_complete(&self) -> bool {
        self.verses >= self.corpus_size && self.chapters >= corpus::CHAPTER_COUNT as usize
    }
}

impl std::fmt::Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Cache Statistics:")?;
        writeln!(f, "  Verses: {}/{}", self.verses, self.corpus_size)?;
        writeln!(f, "  Chapters: {}/{}", self.chapters, corpus::CHAPTER_COUNT)?;
        for (state, count) in &self.by_enrichment {
            writeln!(f, "  {}: {}", state, count)?;
        }
        Ok(())
    }
}
