//! vedabase.io scraper (authoritative provider)
//!
//! Fetches the verse page and pulls the synonyms, translation and purport
//! blocks. The site sits behind bot protection, so failures are expected:
//! a challenge page or 403/429/503 is reported as `Blocked` and not retried.

use super::html;
use super::{with_retries, AuthoritativeProvider, FetchOutcome, RetryPolicy, UnavailableReason};
use crate::verse::AuthoritativeText;
use async_trait::async_trait;
use std::time::Duration;

pub const DEFAULT_AUTHORITATIVE_BASE_URL: &str = "https://vedabase.io/en/library/bg";

pub const DEFAULT_BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const BLOCKING_STATUSES: [u16; 3] = [403, 429, 503];

/// Scraper for the authoritative verse pages
pub struct VedabaseClient {
    http_client: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl VedabaseClient {
    pub fn new(
        base_url: &str,
        user_agent: &str,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> reqwest::Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry,
        })
    }

    async fn fetch_page(&self, url: &str) -> FetchOutcome<String> {
        tracing::debug!(url = %url, "Fetching authoritative verse page");

        let response = match self.http_client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return FetchOutcome::Unavailable(UnavailableReason::from_reqwest(&e)),
        };

        let status = response.status().as_u16();
        if status == 404 {
            return FetchOutcome::Missing;
        }
        if BLOCKING_STATUSES.contains(&status) {
            return FetchOutcome::Unavailable(UnavailableReason::Blocked(status));
        }
        if !response.status().is_success() {
            return FetchOutcome::Unavailable(UnavailableReason::Http(status));
        }

        match response.text().await {
            Ok(body) => FetchOutcome::Success(body),
            Err(e) => FetchOutcome::Unavailable(UnavailableReason::from_reqwest(&e)),
        }
    }
}

/// Pull the three authoritative blocks out of a verse page.
pub fn parse_verse_page(page: &str) -> FetchOutcome<AuthoritativeText> {
    if html::looks_like_challenge(page) {
        return FetchOutcome::Unavailable(UnavailableReason::Blocked(200));
    }

    let text = AuthoritativeText {
        synonyms: html::extract_block(page, "av-synonyms").and_then(|b| html::to_text(b, " ", " ")),
        translation: html::extract_block(page, "av-translation")
            .and_then(|b| html::to_text(b, "", "\n\n")),
        purport: html::extract_block(page, "av-purport").and_then(|b| html::to_text(b, "", "\n\n")),
    };

    if text.is_empty() {
        return FetchOutcome::Unavailable(UnavailableReason::Malformed(
            "no synonyms, translation or purport blocks on page".to_string(),
        ));
    }
    FetchOutcome::Success(text)
}

#[async_trait]
impl AuthoritativeProvider for VedabaseClient {
    async fn fetch_authoritative(&self, chapter: u8, verse: u16) -> FetchOutcome<AuthoritativeText> {
        let url = self.verse_url(chapter, verse);
        let outcome = with_retries(self.retry, "authoritative verse", || async {
            self.fetch_page(&url).await.and_then(|page| parse_verse_page(&page))
        })
        .await;

        if let FetchOutcome::Unavailable(reason) = &outcome {
            tracing::warn!(chapter, verse, reason = %reason, "Authoritative fetch failed");
        }
        outcome
    }

    fn verse_url(&self, chapter: u8, verse: u16) -> String {
        format!("{}/{}/{}/", self.base_url, chapter, verse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> VedabaseClient {
        VedabaseClient::new(
            "https://vedabase.io/en/library/bg/",
            DEFAULT_BROWSER_USER_AGENT,
            Duration::from_secs(5),
            RetryPolicy::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_verse_url() {
        assert_eq!(client().verse_url(2, 47), "https://vedabase.io/en/library/bg/2/47/");
    }

    #[test]
    fn test_parse_page() {
        let page = r#"<div class="av-translation"><p>Always think of Me.</p></div>
                      <div class="av-purport"><p>One.</p><p>Two.</p></div>"#;
        match parse_verse_page(page) {
            FetchOutcome::Success(text) => {
                assert_eq!(text.translation.as_deref(), Some("Always think of Me."));
                assert_eq!(text.purport.as_deref(), Some("One.\n\nTwo."));
                assert!(text.synonyms.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_challenge_page_is_blocked() {
        let page = "<html><head><title>Just a moment...</title></head></html>";
        assert_eq!(
            parse_verse_page(page),
            FetchOutcome::Unavailable(UnavailableReason::Blocked(200))
        );
    }

    #[test]
    fn test_page_without_blocks_is_malformed() {
        assert!(matches!(
            parse_verse_page("<html><body>Not a verse</body></html>"),
            FetchOutcome::Unavailable(UnavailableReason::Malformed(_))
        ));
    }
}
