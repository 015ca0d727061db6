//! Source Gateway - upstream verse providers
//!
//! Two providers with different trade-offs:
//! - bulk ([`BulkProvider`]): complete structured corpus, fast, required
//! - authoritative ([`AuthoritativeProvider`]): trusted translation, synonyms
//!   and purport scraped from the verse page; slow and may be blocked
//!
//! Every call returns a [`FetchOutcome`] instead of an error so the resolver's
//! fallback is an explicit `match`.

pub mod bulk;
pub mod html;
pub mod vedabase;

pub use bulk::VedicScripturesClient;
pub use vedabase::VedabaseClient;

use crate::verse::AuthoritativeText;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::time::Duration;

/// Result of one upstream call
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    Success(T),
    /// The source answered, and it has nothing under this key
    Missing,
    Unavailable(UnavailableReason),
}

impl<T> FetchOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success(_))
    }

    /// Chain a step that can itself come back missing or unusable.
    pub fn and_then<U>(self, f: impl FnOnce(T) -> FetchOutcome<U>) -> FetchOutcome<U> {
        match self {
            FetchOutcome::Success(v) => f(v),
            FetchOutcome::Missing => FetchOutcome::Missing,
            FetchOutcome::Unavailable(reason) => FetchOutcome::Unavailable(reason),
        }
    }
}

/// Why an upstream call produced nothing usable
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnavailableReason {
    #[error("request timed out")]
    Timeout,

    #[error("blocked by anti-automation defenses (HTTP {0})")]
    Blocked(u16),

    #[error("HTTP {0}")]
    Http(u16),

    #[error("network error: {0}")]
    Network(String),

    #[error("unusable response: {0}")]
    Malformed(String),
}

impl UnavailableReason {
    /// Transient failures are worth another attempt; a block or a page we
    /// cannot read will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        match self {
            UnavailableReason::Timeout | UnavailableReason::Network(_) => true,
            UnavailableReason::Http(status) => *status >= 500,
            UnavailableReason::Blocked(_) | UnavailableReason::Malformed(_) => false,
        }
    }

    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            UnavailableReason::Timeout
        } else if err.is_decode() {
            UnavailableReason::Malformed(err.to_string())
        } else if let Some(status) = err.status() {
            UnavailableReason::Http(status.as_u16())
        } else {
            UnavailableReason::Network(err.to_string())
        }
    }
}

/// Bulk structured-data provider
#[async_trait]
pub trait BulkProvider: Send + Sync {
    /// Raw verse payload
    async fn fetch_verse(&self, chapter: u8, verse: u16) -> FetchOutcome<Value>;

    /// Raw chapter metadata payload
    async fn fetch_chapter(&self, chapter: u8) -> FetchOutcome<Value>;

    /// Raw metadata payload for every chapter (a JSON array)
    async fn fetch_all_chapters(&self) -> FetchOutcome<Value>;
}

/// Authoritative-content provider
#[async_trait]
pub trait AuthoritativeProvider: Send + Sync {
    async fn fetch_authoritative(&self, chapter: u8, verse: u16) -> FetchOutcome<AuthoritativeText>;

    /// Link to the authoritative page for a verse
    fn verse_url(&self, chapter: u8, verse: u16) -> String;
}

/// Retry policy for one provider
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, backoff: Duration) -> Self {
        Self { attempts: attempts.max(1), backoff }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2, Duration::from_millis(500))
    }
}

/// Run `call` up to `policy.attempts` times while it fails with a retryable reason.
pub async fn with_retries<T, F, Fut>(policy: RetryPolicy, what: &str, mut call: F) -> FetchOutcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = FetchOutcome<T>>,
{
    let mut attempt = 1;
    loop {
        match call().await {
            FetchOutcome::Unavailable(reason) if reason.is_retryable() && attempt < policy.attempts => {
                tracing::debug!(target_call = what, attempt, reason = %reason, "Retrying upstream call");
                tokio::time::sleep(policy.backoff * attempt).await;
                attempt += 1;
            }
            outcome => return outcome,
        }
    }
}

impl fmt::Display for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} attempt(s), {:?} backoff", self.attempts, self.backoff)
    }
}
