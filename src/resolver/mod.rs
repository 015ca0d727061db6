//! Resolver - cache-first verse resolution over the two upstream providers
//!
//! Lookup policy for one key:
//! - cache hit that is already enriched (or degraded): return it as `Cache`
//! - cache hit still `Pending` (seeded): try the authoritative provider now
//! - miss: the bulk provider is required; if it fails the call fails. Then try
//!   the authoritative provider and fall back to the bulk trusted-author
//!   translation, marked `Degraded`, when that fails.
//!
//! Whatever record is built is persisted before it is returned.

pub mod seed;

pub use seed::{SeedFailure, SeedOutcome, SeedProgress, SeedReport, SeedStatus};

use crate::corpus;
use crate::matcher::{MatchCandidate, Matcher};
use crate::reference::{parse_reference, ParseError, VerseRef};
use crate::source::{AuthoritativeProvider, BulkProvider, FetchOutcome};
use crate::storage::{CacheStats, CacheStore};
use crate::verse::{ChapterRecord, Enrichment, VerseRecord};
use crate::{Error, Result};
use serde::Serialize;
use std::sync::Arc;

/// Where the trusted content of a returned record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Cache,
    Bulk,
    Authoritative,
    Degraded,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::Cache => "cache",
            Provenance::Bulk => "bulk",
            Provenance::Authoritative => "authoritative",
            Provenance::Degraded => "degraded",
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Provenance::Degraded)
    }
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A resolved record and its provenance
#[derive(Debug, Clone, Serialize)]
pub struct Resolution<T = VerseRecord> {
    pub record: T,
    pub provenance: Provenance,
}

/// Keyword search hits plus how much of the corpus was searched
#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    pub verses: Vec<VerseRecord>,
    pub cached: usize,
    pub corpus_size: usize,
}

impl SearchResults {
    /// Only part of the corpus is cached, so a miss may not be a real miss.
    pub fn is_partial(&self) -> bool {
        self.cached < self.corpus_size
    }
}

/// Orchestrates the cache and the upstream providers.
pub struct Resolver {
    cache: Arc<dyn CacheStore>,
    bulk: Arc<dyn BulkProvider>,
    authoritative: Arc<dyn AuthoritativeProvider>,
    enrich: bool,
}

impl Resolver {
    pub fn new(
        cache: Arc<dyn CacheStore>,
        bulk: Arc<dyn BulkProvider>,
        authoritative: Arc<dyn AuthoritativeProvider>,
    ) -> Self {
        Self { cache, bulk, authoritative, enrich: true }
    }

    /// Turn authoritative enrichment on or off. When off, fresh records are
    /// returned as `Bulk` and stay `Pending`.
    pub fn with_enrichment(mut self, enrich: bool) -> Self {
        self.enrich = enrich;
        self
    }

    pub fn cache(&self) -> &dyn CacheStore {
        self.cache.as_ref()
    }

    /// Parse a free-form reference and resolve it. Parse errors never reach the network.
    pub async fn resolve_reference(&self, text: &str) -> Result<Resolution> {
        let reference = parse_reference(text)?;
        self.resolve_verse(reference).await
    }

    pub async fn resolve_verse(&self, reference: VerseRef) -> Result<Resolution> {
        if let Some(record) = self.cache.get(reference)? {
            if record.enrichment != Enrichment::Pending || !self.enrich {
                tracing::debug!(reference = %reference, "Cache hit");
                return Ok(Resolution { record, provenance: Provenance::Cache });
            }
            tracing::debug!(reference = %reference, "Cache hit pending enrichment");
            return self.enrich_and_store(record).await;
        }

        self.fetch_fresh(reference).await
    }

    /// Fetch one key again regardless of what is cached and overwrite it.
    pub async fn refresh_verse(&self, reference: VerseRef) -> Result<Resolution> {
        tracing::info!(reference = %reference, "Refreshing verse");
        self.fetch_fresh(reference).await
    }

    async fn fetch_fresh(&self, reference: VerseRef) -> Result<Resolution> {
        let record = self.fetch_bulk_record(reference).await?;

        if !self.enrich {
            self.cache.put(&record)?;
            return Ok(Resolution { record, provenance: Provenance::Bulk });
        }
        self.enrich_and_store(record).await
    }

    /// Bulk fetch for one verse, as a `Pending` record. Not persisted.
    pub(crate) async fn fetch_bulk_record(&self, reference: VerseRef) -> Result<VerseRecord> {
        let (chapter, verse) = (reference.chapter, reference.verse);
        match self.bulk.fetch_verse(chapter, verse).await {
            FetchOutcome::Success(payload) => VerseRecord::from_bulk(
                reference,
                payload,
                self.authoritative.verse_url(chapter, verse),
            ),
            FetchOutcome::Missing => Err(Error::NotFound(reference.to_key())),
            FetchOutcome::Unavailable(reason) => Err(Error::SourceUnavailable {
                reference: reference.to_key(),
                reason,
            }),
        }
    }

    async fn enrich_and_store(&self, record: VerseRecord) -> Result<Resolution> {
        let reference = record.reference;
        let outcome = self
            .authoritative
            .fetch_authoritative(reference.chapter, reference.verse)
            .await;

        let (record, provenance) = match outcome {
            FetchOutcome::Success(text) => {
                tracing::info!(reference = %reference, "Enriched from authoritative source");
                (record.enriched(text), Provenance::Authoritative)
            }
            FetchOutcome::Missing => {
                tracing::warn!(reference = %reference, "Authoritative page missing, using bulk translation");
                (record.degraded(), Provenance::Degraded)
            }
            FetchOutcome::Unavailable(reason) => {
                tracing::warn!(reference = %reference, reason = %reason, "Enrichment failed, using bulk translation");
                (record.degraded(), Provenance::Degraded)
            }
        };

        self.cache.put(&record)?;
        Ok(Resolution { record, provenance })
    }

    pub async fn resolve_chapter(&self, number: u32) -> Result<Resolution<ChapterRecord>> {
        let number = u8::try_from(number)
            .ok()
            .filter(|n| corpus::verse_count(*n).is_some())
            .ok_or(ParseError::ChapterOutOfRange(number))?;

        if let Some(record) = self.cache.get_chapter(number)? {
            return Ok(Resolution { record, provenance: Provenance::Cache });
        }

        let record = match self.bulk.fetch_chapter(number).await {
            FetchOutcome::Success(payload) => ChapterRecord::from_bulk(payload)?,
            FetchOutcome::Missing => return Err(Error::NotFound(format!("chapter {}", number))),
            FetchOutcome::Unavailable(reason) => {
                return Err(Error::SourceUnavailable {
                    reference: format!("chapter {}", number),
                    reason,
                });
            }
        };
        if record.number != number {
            return Err(Error::Payload(format!(
                "asked for chapter {}, got chapter {}",
                number, record.number
            )));
        }

        self.cache.put_chapter(&record)?;
        Ok(Resolution { record, provenance: Provenance::Bulk })
    }

    /// Substring search over cached verses.
    pub fn search(&self, query: &str, limit: usize) -> Result<SearchResults> {
        let cached = self.cache.count_verses()?;
        if cached == 0 {
            return Err(Error::CorpusEmpty);
        }
        Ok(SearchResults {
            verses: self.cache.search(query, limit)?,
            cached,
            corpus_size: corpus::corpus_size(),
        })
    }

    /// Rank cached verses against a garbled transliteration.
    pub fn match_text(&self, garbled: &str, top_n: usize) -> Result<Vec<MatchCandidate>> {
        Matcher::new(self.cache.as_ref()).match_text(garbled, top_n)
    }

    pub fn stats(&self) -> Result<CacheStats> {
        self.cache.stats()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::source::UnavailableReason;
    use crate::storage::SqliteStore;
    use crate::verse::test_support::{sample_chapter_payload, sample_payload};
    use crate::verse::AuthoritativeText;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Bulk provider serving the sample payload for every valid key.
    #[derive(Default)]
    pub struct FakeBulk {
        pub verse_calls: AtomicUsize,
        pub chapter_calls: AtomicUsize,
        pub down: bool,
        pub chapters_down: bool,
        pub failing: HashSet<(u8, u16)>,
        pub missing: HashSet<(u8, u16)>,
    }

    impl FakeBulk {
        pub fn calls(&self) -> usize {
            self.verse_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl BulkProvider for FakeBulk {
        async fn fetch_verse(&self, chapter: u8, verse: u16) -> FetchOutcome<Value> {
            self.verse_calls.fetch_add(1, Ordering::SeqCst);
            if self.down || self.failing.contains(&(chapter, verse)) {
                return FetchOutcome::Unavailable(UnavailableReason::Timeout);
            }
            if !corpus::is_valid(chapter, verse) || self.missing.contains(&(chapter, verse)) {
                return FetchOutcome::Missing;
            }
            FetchOutcome::Success(sample_payload(chapter, verse, &format!("verse {} {}", chapter, verse)))
        }

        async fn fetch_chapter(&self, chapter: u8) -> FetchOutcome<Value> {
            self.chapter_calls.fetch_add(1, Ordering::SeqCst);
            if self.down {
                return FetchOutcome::Unavailable(UnavailableReason::Http(502));
            }
            FetchOutcome::Success(sample_chapter_payload(chapter))
        }

        async fn fetch_all_chapters(&self) -> FetchOutcome<Value> {
            self.chapter_calls.fetch_add(1, Ordering::SeqCst);
            if self.down || self.chapters_down {
                return FetchOutcome::Unavailable(UnavailableReason::Http(502));
            }
            FetchOutcome::Success(Value::Array(
                (1..=corpus::CHAPTER_COUNT).map(sample_chapter_payload).collect(),
            ))
        }
    }

    /// Authoritative provider that always succeeds, is always blocked, or
    /// never has the page.
    #[derive(Default)]
    pub struct FakeAuthoritative {
        pub calls: AtomicUsize,
        pub blocked: bool,
        pub missing: bool,
    }

    impl FakeAuthoritative {
        pub fn blocked() -> Self {
            Self { blocked: true, ..Self::default() }
        }

        pub fn missing() -> Self {
            Self { missing: true, ..Self::default() }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AuthoritativeProvider for FakeAuthoritative {
        async fn fetch_authoritative(&self, _chapter: u8, _verse: u16) -> FetchOutcome<AuthoritativeText> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.blocked {
                return FetchOutcome::Unavailable(UnavailableReason::Blocked(403));
            }
            if self.missing {
                return FetchOutcome::Missing;
            }
            FetchOutcome::Success(AuthoritativeText {
                synonyms: Some("karmaṇi — in prescribed duties".into()),
                translation: Some("Authoritative translation".into()),
                purport: Some("Purport text".into()),
            })
        }

        fn verse_url(&self, chapter: u8, verse: u16) -> String {
            format!("https://vedabase.io/en/library/bg/{}/{}/", chapter, verse)
        }
    }

    /// Cache wrapper counting writes.
    pub struct CountingStore {
        pub inner: SqliteStore,
        pub puts: AtomicUsize,
        pub written: Mutex<Vec<VerseRef>>,
    }

    impl CountingStore {
        pub fn new() -> Self {
            Self {
                inner: SqliteStore::open_in_memory().unwrap(),
                puts: AtomicUsize::new(0),
                written: Mutex::new(Vec::new()),
            }
        }

        pub fn puts(&self) -> usize {
            self.puts.load(Ordering::SeqCst)
        }
    }

    impl CacheStore for CountingStore {
        fn get(&self, reference: VerseRef) -> Result<Option<VerseRecord>> {
            self.inner.get(reference)
        }

        fn put(&self, record: &VerseRecord) -> Result<()> {
            self.puts.fetch_add(1, Ordering::SeqCst);
            self.written.lock().unwrap().push(record.reference);
            self.inner.put(record)
        }

        fn get_chapter(&self, number: u8) -> Result<Option<ChapterRecord>> {
            self.inner.get_chapter(number)
        }

        fn put_chapter(&self, chapter: &ChapterRecord) -> Result<()> {
            self.puts.fetch_add(1, Ordering::SeqCst);
            self.inner.put_chapter(chapter)
        }

        fn count_verses(&self) -> Result<usize> {
            self.inner.count_verses()
        }

        fn count_chapters(&self) -> Result<usize> {
            self.inner.count_chapters()
        }

        fn all_verses(&self) -> Result<Vec<VerseRecord>> {
            self.inner.all_verses()
        }

        fn contains(&self, reference: VerseRef) -> Result<bool> {
            self.inner.contains(reference)
        }

        fn search(&self, query: &str, limit: usize) -> Result<Vec<VerseRecord>> {
            self.inner.search(query, limit)
        }

        fn stats(&self) -> Result<CacheStats> {
            self.inner.stats()
        }
    }

    pub struct Harness {
        pub store: Arc<CountingStore>,
        pub bulk: Arc<FakeBulk>,
        pub authoritative: Arc<FakeAuthoritative>,
        pub resolver: Resolver,
    }

    pub fn harness(bulk: FakeBulk, authoritative: FakeAuthoritative) -> Harness {
        let store = Arc::new(CountingStore::new());
        let bulk = Arc::new(bulk);
        let authoritative = Arc::new(authoritative);
        let resolver = Resolver::new(store.clone(), bulk.clone(), authoritative.clone());
        Harness { store, bulk, authoritative, resolver }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::source::UnavailableReason;
    use crate::verse::test_support::sample_record;
    use std::collections::HashSet;

    #[tokio::test]
    async fn test_second_lookup_comes_from_cache() {
        let h = harness(FakeBulk::default(), FakeAuthoritative::default());

        let first = h.resolver.resolve_reference("BG 2.47").await.unwrap();
        assert_ne!(first.provenance, Provenance::Cache);
        assert_eq!(first.provenance, Provenance::Authoritative);
        assert_eq!(first.record.translation.as_deref(), Some("Authoritative translation"));
        assert_eq!(first.record.source_url, "https://vedabase.io/en/library/bg/2/47/");

        let second = h.resolver.resolve_reference("2:47").await.unwrap();
        assert_eq!(second.provenance, Provenance::Cache);
        assert_eq!(second.record, first.record);
        assert_eq!(h.bulk.calls(), 1);
        assert_eq!(h.authoritative.calls(), 1);
    }

    #[tokio::test]
    async fn test_degraded_when_authoritative_fails() {
        let h = harness(FakeBulk::default(), FakeAuthoritative::blocked());

        let resolution = h.resolver.resolve_reference("bg 15-7").await.unwrap();
        assert_eq!(resolution.provenance, Provenance::Degraded);
        assert_eq!(resolution.record.enrichment, Enrichment::Degraded);
        assert_eq!(
            resolution.record.translation.as_deref(),
            Some("You have a right to perform your prescribed duty")
        );

        // degraded records are cached and not re-scraped on every hit
        let again = h.resolver.resolve_reference("BG 15.7").await.unwrap();
        assert_eq!(again.provenance, Provenance::Cache);
        assert_eq!(h.authoritative.calls(), 1);
    }

    #[tokio::test]
    async fn test_bulk_unavailable_is_fatal() {
        let h = harness(FakeBulk { down: true, ..FakeBulk::default() }, FakeAuthoritative::default());

        match h.resolver.resolve_reference("BG 2.47").await {
            Err(Error::SourceUnavailable { reference, reason }) => {
                assert_eq!(reference, "BG 2.47");
                assert_eq!(reason, UnavailableReason::Timeout);
            }
            other => panic!("expected SourceUnavailable, got {:?}", other.map(|r| r.provenance)),
        }
        assert_eq!(h.authoritative.calls(), 0);
        assert_eq!(h.store.puts(), 0);
    }

    #[tokio::test]
    async fn test_missing_upstream_verse_is_not_found() {
        let bulk = FakeBulk { missing: HashSet::from([(3, 5)]), ..FakeBulk::default() };
        let h = harness(bulk, FakeAuthoritative::default());

        match h.resolver.resolve_reference("BG 3.5").await {
            Err(Error::NotFound(reference)) => assert_eq!(reference, "BG 3.5"),
            other => panic!("expected NotFound, got {:?}", other.map(|r| r.provenance)),
        }
        assert_eq!(h.bulk.calls(), 1);
        assert_eq!(h.authoritative.calls(), 0);
        assert_eq!(h.store.puts(), 0);
    }

    #[tokio::test]
    async fn test_missing_authoritative_page_degrades() {
        let h = harness(FakeBulk::default(), FakeAuthoritative::missing());

        let resolution = h.resolver.resolve_reference("BG 4.7").await.unwrap();
        assert_eq!(resolution.provenance, Provenance::Degraded);
        assert_eq!(resolution.record.enrichment, Enrichment::Degraded);
        assert!(resolution.record.purport().is_none());
        assert_eq!(h.store.puts(), 1);
    }

    #[tokio::test]
    async fn test_parse_error_skips_network() {
        let h = harness(FakeBulk::default(), FakeAuthoritative::default());

        assert!(matches!(
            h.resolver.resolve_reference("BG 1.48").await,
            Err(Error::Parse(ParseError::VerseOutOfRange { .. }))
        ));
        assert!(matches!(
            h.resolver.resolve_reference("BG 2.46-47").await,
            Err(Error::Parse(ParseError::VerseRange(_)))
        ));
        assert_eq!(h.bulk.calls(), 0);
    }

    #[tokio::test]
    async fn test_pending_hit_is_enriched_lazily() {
        let h = harness(FakeBulk::default(), FakeAuthoritative::default());
        h.store.put(&sample_record(9, 34, "manmanā bhava")).unwrap();

        let resolution = h.resolver.resolve_verse(VerseRef::new(9, 34).unwrap()).await.unwrap();
        assert_eq!(resolution.provenance, Provenance::Authoritative);
        assert_eq!(resolution.record.purport(), Some("Purport text"));
        assert_eq!(h.bulk.calls(), 0);

        let stored = h.store.get(VerseRef::new(9, 34).unwrap()).unwrap().unwrap();
        assert_eq!(stored.enrichment, Enrichment::Authoritative);
    }

    #[tokio::test]
    async fn test_enrichment_disabled() {
        let h = harness(FakeBulk::default(), FakeAuthoritative::default());
        let resolver = Resolver::new(h.store.clone(), h.bulk.clone(), h.authoritative.clone())
            .with_enrichment(false);

        let resolution = resolver.resolve_verse(VerseRef::new(2, 13).unwrap()).await.unwrap();
        assert_eq!(resolution.provenance, Provenance::Bulk);
        assert_eq!(resolution.record.enrichment, Enrichment::Pending);

        let again = resolver.resolve_verse(VerseRef::new(2, 13).unwrap()).await.unwrap();
        assert_eq!(again.provenance, Provenance::Cache);
        assert_eq!(h.authoritative.calls(), 0);
    }

    #[tokio::test]
    async fn test_refresh_overwrites() {
        let h = harness(FakeBulk::default(), FakeAuthoritative::blocked());
        let reference = VerseRef::new(2, 47).unwrap();

        h.resolver.resolve_verse(reference).await.unwrap();
        let refreshed = h.resolver.refresh_verse(reference).await.unwrap();
        assert_eq!(refreshed.provenance, Provenance::Degraded);
        assert_eq!(h.bulk.calls(), 2);
        assert_eq!(h.store.puts(), 2);
    }

    #[tokio::test]
    async fn test_resolve_chapter() {
        let h = harness(FakeBulk::default(), FakeAuthoritative::default());

        let first = h.resolver.resolve_chapter(2).await.unwrap();
        assert_eq!(first.provenance, Provenance::Bulk);
        assert_eq!(first.record.verses_count, 72);

        let second = h.resolver.resolve_chapter(2).await.unwrap();
        assert_eq!(second.provenance, Provenance::Cache);
        assert_eq!(h.bulk.chapter_calls.load(std::sync::atomic::Ordering::SeqCst), 1);

        assert!(matches!(
            h.resolver.resolve_chapter(19).await,
            Err(Error::Parse(ParseError::ChapterOutOfRange(19)))
        ));
        assert!(matches!(
            h.resolver.resolve_chapter(0).await,
            Err(Error::Parse(ParseError::ChapterOutOfRange(0)))
        ));
    }

    #[tokio::test]
    async fn test_search_and_match_need_corpus() {
        let h = harness(FakeBulk::default(), FakeAuthoritative::default());
        assert!(matches!(h.resolver.search("duty", 5), Err(Error::CorpusEmpty)));
        assert!(matches!(h.resolver.match_text("karma", 3), Err(Error::CorpusEmpty)));

        h.store
            .put(&sample_record(9, 34, "manmanā bhava madbhakto madyājī māṁ namaskuru"))
            .unwrap();
        let results = h.resolver.search("prescribed duty", 5).unwrap();
        assert_eq!(results.verses.len(), 1);
        assert!(results.is_partial());

        let matches = h
            .resolver
            .match_text("man manā bhava mad-bhākto mad-yajī mam namāskuru", 3)
            .unwrap();
        assert_eq!(matches[0].reference.to_string(), "BG 9.34");
        assert!(matches[0].score >= 0.6);
    }
}
