//! Markdown rendering for MCP tool output

use crate::corpus;
use crate::matcher::MatchCandidate;
use crate::resolver::{Resolution, SearchResults, SeedOutcome, SeedReport};
use crate::verse::{ChapterRecord, VerseRecord};
use crate::Error;

pub const PURPORT_LIMIT: usize = 2000;
const SEARCH_TRANSLITERATION_LIMIT: usize = 100;
const SEARCH_TRANSLATION_LIMIT: usize = 150;
const SEED_FAILURES_SHOWN: usize = 10;

/// Cut `text` to at most `limit` characters, marking the cut with `...`.
pub fn truncate(text: &str, limit: usize) -> (String, bool) {
    match text.char_indices().nth(limit) {
        Some((byte_index, _)) => (format!("{}...", &text[..byte_index]), true),
        None => (text.to_string(), false),
    }
}

pub fn verse(resolution: &Resolution) -> String {
    let record = &resolution.record;
    let mut parts = vec![format!("## {}\n", record.reference)];

    if let Some(devanagari) = &record.devanagari {
        parts.push(format!("**Sanskrit:**\n{}\n", devanagari));
    }
    if let Some(transliteration) = &record.transliteration {
        parts.push(format!("**Transliteration:**\n_{}_\n", transliteration));
    }
    if let Some(synonyms) = record.synonyms() {
        parts.push(format!("**Synonyms:**\n{}\n", synonyms));
    }
    if let Some(translation) = &record.translation {
        parts.push(format!("**Translation (Srila Prabhupada):**\n{}\n", translation));
    }
    if let Some(purport) = record.purport() {
        let (purport, truncated) = truncate(purport, PURPORT_LIMIT);
        let note = if truncated {
            "\n\n_(Purport truncated. See full text on Vedabase.)_"
        } else {
            ""
        };
        parts.push(format!("**Purport:**\n{}{}\n", purport, note));
    }
    if resolution.provenance.is_degraded() {
        parts.push(
            "_Note: Vedabase was unreachable; translation is the bulk-source fallback._\n".to_string(),
        );
    }
    parts.push(format!("[Read on Vedabase]({})", record.source_url));

    parts.join("\n")
}

pub fn search(query: &str, results: &SearchResults) -> String {
    if results.verses.is_empty() {
        return format!("No verses found matching '{}'.", query);
    }

    let mut parts = vec![format!("**Found {} result(s) for '{}':**\n", results.verses.len(), query)];
    for record in &results.verses {
        let (transliteration, _) = truncate(
            record.transliteration.as_deref().unwrap_or(""),
            SEARCH_TRANSLITERATION_LIMIT,
        );
        let (translation, _) = truncate(record.translation.as_deref().unwrap_or(""), SEARCH_TRANSLATION_LIMIT);
        parts.push(format!("### {}\n_{}_\n{}\n", record.reference, transliteration, translation));
    }

    if results.is_partial() {
        parts.push(format!(
            "\n_Note: Only {}/{} verses cached. Run `seed_database` for complete results._",
            results.cached, results.corpus_size
        ));
    }
    parts.join("\n")
}

/// Ranked matches, with the top match's translation and link when cached.
pub fn matches(query: &str, candidates: &[MatchCandidate], top: Option<&VerseRecord>) -> String {
    if candidates.is_empty() {
        return format!("No matches found for: '{}'", query);
    }

    let mut parts = vec![format!("**Top {} match(es) for:** _{}_\n", candidates.len(), query)];
    for (i, candidate) in candidates.iter().enumerate() {
        parts.push(format!(
            "{}. **{}** (score: {:.2})\n   _{}_",
            i + 1,
            candidate.reference,
            candidate.score,
            candidate.transliteration
        ));
    }

    if let Some(record) = top {
        if let Some(translation) = &record.translation {
            parts.push(format!("\n**Top match translation ({}):**\n{}", record.reference, translation));
        }
        parts.push(format!("\n[Read on Vedabase]({})", record.source_url));
    }
    parts.join("\n")
}

pub fn chapter(record: &ChapterRecord) -> String {
    let mut parts = vec![
        format!("## Chapter {}: {}", record.number, record.name.as_deref().unwrap_or("")),
        format!("**Transliteration:** {}", record.name_transliterated.as_deref().unwrap_or("")),
        format!("**Meaning:** {}", record.name_meaning.as_deref().unwrap_or("")),
        format!("**Verses:** {}", record.verses_count),
    ];
    if let Some(summary) = &record.summary {
        parts.push(format!("\n**Summary:**\n{}", summary));
    }
    parts.join("\n")
}

pub fn seed(report: &SeedReport) -> String {
    let mut out = match report.outcome {
        SeedOutcome::AlreadyComplete => format!(
            "Database already seeded with {} verses. No action needed.",
            report.skipped
        ),
        SeedOutcome::Completed => format!("Seeded {} verses into local cache.", report.seeded),
        SeedOutcome::Cancelled => format!("Seeding cancelled after {} verses.", report.seeded),
    };

    if report.skipped > 0 && report.outcome != SeedOutcome::AlreadyComplete {
        out.push_str(&format!(" {} already cached.", report.skipped));
    }
    if report.chapters_seeded > 0 {
        out.push_str(&format!(" Stored {} chapter summaries.", report.chapters_seeded));
    }

    if !report.failures.is_empty() {
        out.push_str(&format!("\n{} error(s):", report.failures.len()));
        for failure in report.failures.iter().take(SEED_FAILURES_SHOWN) {
            out.push_str(&format!("\n{}: {}", failure.reference, failure.reason));
        }
        if report.failures.len() > SEED_FAILURES_SHOWN {
            out.push_str(&format!(
                "\n... and {} more.",
                report.failures.len() - SEED_FAILURES_SHOWN
            ));
        }
    }
    out
}

/// User-facing message for a failed tool call.
pub fn error(err: &Error) -> String {
    match err {
        Error::CorpusEmpty => format!(
            "No verses cached yet. Please run the `seed_database` tool first \
             to download all {} Bhagavad Gita verses.",
            corpus::corpus_size()
        ),
        other => format!("Error: {}", other),
    }
}
