//! vedicscriptures.github.io client (bulk provider)

use super::{with_retries, BulkProvider, FetchOutcome, RetryPolicy, UnavailableReason};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_BULK_BASE_URL: &str = "https://vedicscriptures.github.io";
const USER_AGENT: &str = concat!("vedabase/", env!("CARGO_PKG_VERSION"));

/// JSON API with the complete corpus. No auth, no rate limit.
pub struct VedicScripturesClient {
    http_client: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl VedicScripturesClient {
    pub fn new(base_url: &str, timeout: Duration, retry: RetryPolicy) -> reqwest::Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry,
        })
    }

    pub fn verse_url(&self, chapter: u8, verse: u16) -> String {
        format!("{}/slok/{}/{}", self.base_url, chapter, verse)
    }

    pub fn chapter_url(&self, chapter: u8) -> String {
        format!("{}/chapter/{}", self.base_url, chapter)
    }

    pub fn chapters_url(&self) -> String {
        format!("{}/chapters", self.base_url)
    }

    async fn get_json(&self, url: &str) -> FetchOutcome<Value> {
        tracing::debug!(url = %url, "Querying bulk API");

        let response = match self.http_client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return FetchOutcome::Unavailable(UnavailableReason::from_reqwest(&e)),
        };

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return FetchOutcome::Missing;
        }
        if !status.is_success() {
            return FetchOutcome::Unavailable(UnavailableReason::Http(status.as_u16()));
        }

        match response.json::<Value>().await {
            Ok(Value::Null) => FetchOutcome::Missing,
            Ok(value) => FetchOutcome::Success(value),
            Err(e) => FetchOutcome::Unavailable(UnavailableReason::Malformed(e.to_string())),
        }
    }
}

#[async_trait]
impl BulkProvider for VedicScripturesClient {
    async fn fetch_verse(&self, chapter: u8, verse: u16) -> FetchOutcome<Value> {
        let url = self.verse_url(chapter, verse);
        with_retries(self.retry, "bulk verse", || self.get_json(&url)).await
    }

    async fn fetch_chapter(&self, chapter: u8) -> FetchOutcome<Value> {
        let url = self.chapter_url(chapter);
        with_retries(self.retry, "bulk chapter", || self.get_json(&url)).await
    }

    async fn fetch_all_chapters(&self) -> FetchOutcome<Value> {
        let url = self.chapters_url();
        match with_retries(self.retry, "bulk chapters", || self.get_json(&url)).await {
            FetchOutcome::Success(value) if !value.is_array() => FetchOutcome::Unavailable(
                UnavailableReason::Malformed("chapters payload is not an array".to_string()),
            ),
            outcome => outcome,
        }
    }
}
