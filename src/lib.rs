//! # Vedabase - Bhagavad Gita verse resolution
//!
//! Resolves a verse reference or a garbled phonetic transliteration into an
//! authoritative verse record.
//!
//! Vedabase provides:
//! - Reference parsing against the fixed 18-chapter corpus
//! - SQLite-backed verse/chapter cache (concurrent readers, single writer)
//! - Tiered lookup: cache, then the bulk API, then lazy authoritative enrichment
//! - Fuzzy matching of speech-to-text transliterations to ranked verses
//! - MCP (stdio) and HTTP surfaces over the same core

pub mod corpus;
pub mod reference;
pub mod normalize;
pub mod verse;
pub mod storage;
pub mod source;
pub mod matcher;
pub mod resolver;
pub mod config;
pub mod server;
pub mod ui;

// Re-exports for convenient access
pub use reference::{parse_reference, ParseError, VerseRef};
pub use verse::{ChapterRecord, Enrichment, VerseRecord};
pub use storage::{CacheStore, SqliteStore};
pub use source::{FetchOutcome, UnavailableReason};
pub use matcher::{MatchCandidate, Matcher};
pub use resolver::{Provenance, Resolution, Resolver, SeedReport};

/// Result type alias for Vedabase operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Vedabase operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid reference: {0}")]
    Parse(#[from] ParseError),

    #[error("Bulk source unavailable for {reference}: {reason}")]
    SourceUnavailable {
        reference: String,
        reason: UnavailableReason,
    },

    #[error("No data found for {0}")]
    NotFound(String),

    #[error("No verses cached yet; seed the database first")]
    CorpusEmpty,

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed payload: {0}")]
    Payload(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
