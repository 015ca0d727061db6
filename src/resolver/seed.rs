//! Corpus seeding from the bulk provider
//!
//! Walks every reference in corpus order, skipping keys that are already
//! cached, so a stopped seed picks up where it left off. The authoritative
//! provider is never called here; seeded records stay `Pending` until a
//! direct lookup enriches them.

use super::Resolver;
use crate::corpus;
use crate::reference::VerseRef;
use crate::source::FetchOutcome;
use crate::verse::ChapterRecord;
use crate::Result;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

/// How a seed run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedOutcome {
    /// Every reference was visited (some may have failed)
    Completed,
    /// The cache already held the full corpus; nothing was fetched
    AlreadyComplete,
    /// Stopped between items by the caller
    Cancelled,
}

/// One key that could not be seeded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeedFailure {
    pub reference: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub outcome: SeedOutcome,
    pub seeded: usize,
    pub skipped: usize,
    pub chapters_seeded: usize,
    pub failures: Vec<SeedFailure>,
}

impl SeedReport {
    fn new(outcome: SeedOutcome) -> Self {
        Self { outcome, seeded: 0, skipped: 0, chapters_seeded: 0, failures: Vec::new() }
    }

    /// Completed with no failures
    pub fn is_clean(&self) -> bool {
        self.outcome != SeedOutcome::Cancelled && self.failures.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedStatus {
    Seeded,
    Skipped,
    Failed,
}

/// Per-item progress event
#[derive(Debug, Clone, Copy)]
pub struct SeedProgress {
    pub reference: VerseRef,
    pub status: SeedStatus,
    pub done: usize,
    pub total: usize,
}

impl Resolver {
    /// Seed the whole corpus without cancellation or progress reporting.
    pub async fn seed_all(&self) -> Result<SeedReport> {
        self.seed_all_with(&CancellationToken::new(), |_| {}).await
    }

    /// Seed the whole corpus. `cancel` is checked between items and
    /// `on_progress` is called after each one.
    pub async fn seed_all_with<F>(&self, cancel: &CancellationToken, mut on_progress: F) -> Result<SeedReport>
    where
        F: FnMut(&SeedProgress) + Send,
    {
        let total = corpus::corpus_size();
        let cached_verses = self.cache.count_verses()?;
        let cached_chapters = self.cache.count_chapters()?;

        let chapters_complete = cached_chapters >= corpus::CHAPTER_COUNT as usize;

        if cached_verses >= total {
            tracing::info!(verses = cached_verses, "Cache already holds every verse");
            let mut report = SeedReport::new(SeedOutcome::AlreadyComplete);
            report.skipped = cached_verses;
            if !chapters_complete {
                self.seed_chapters(&mut report).await?;
            }
            return Ok(report);
        }

        let mut report = SeedReport::new(SeedOutcome::Completed);
        tracing::info!(cached = cached_verses, total, "Seeding corpus from bulk source");

        if !chapters_complete {
            self.seed_chapters(&mut report).await?;
        }

        for (index, reference) in VerseRef::all().enumerate() {
            if cancel.is_cancelled() {
                tracing::info!(seeded = report.seeded, "Seed cancelled");
                report.outcome = SeedOutcome::Cancelled;
                break;
            }

            let status = if self.cache.contains(reference)? {
                report.skipped += 1;
                SeedStatus::Skipped
            } else {
                match self.fetch_bulk_record(reference).await {
                    Ok(record) => {
                        self.cache.put(&record)?;
                        report.seeded += 1;
                        SeedStatus::Seeded
                    }
                    Err(e) => {
                        tracing::warn!(reference = %reference, error = %e, "Skipping verse");
                        report.failures.push(SeedFailure {
                            reference: reference.to_key(),
                            reason: e.to_string(),
                        });
                        SeedStatus::Failed
                    }
                }
            };

            on_progress(&SeedProgress { reference, status, done: index + 1, total });
            if (index + 1) % 100 == 0 {
                tracing::info!(done = index + 1, total, seeded = report.seeded, "Seed progress");
            }
            tokio::task::yield_now().await;
        }

        tracing::info!(
            seeded = report.seeded,
            skipped = report.skipped,
            failed = report.failures.len(),
            outcome = ?report.outcome,
            "Seed finished"
        );
        Ok(report)
    }

    /// Store metadata for every chapter. Failures are recorded, never fatal.
    async fn seed_chapters(&self, report: &mut SeedReport) -> Result<()> {
        let payloads = match self.bulk.fetch_all_chapters().await {
            FetchOutcome::Success(Value::Array(payloads)) => payloads,
            FetchOutcome::Success(_) => {
                self.record_chapter_failure(report, "chapters payload is not an array".to_string());
                return Ok(());
            }
            FetchOutcome::Missing => {
                self.record_chapter_failure(report, "chapters not found".to_string());
                return Ok(());
            }
            FetchOutcome::Unavailable(reason) => {
                self.record_chapter_failure(report, reason.to_string());
                return Ok(());
            }
        };

        for payload in payloads {
            match ChapterRecord::from_bulk(payload) {
                Ok(chapter) => {
                    self.cache.put_chapter(&chapter)?;
                    report.chapters_seeded += 1;
                }
                Err(e) => self.record_chapter_failure(report, e.to_string()),
            }
        }
        Ok(())
    }

    fn record_chapter_failure(&self, report: &mut SeedReport, reason: String) {
        tracing::warn!(reason = %reason, "Chapter metadata not seeded");
        report.failures.push(SeedFailure { reference: "chapters".to_string(), reason });
    }
}
