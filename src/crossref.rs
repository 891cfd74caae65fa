//! Crossref API client for DOI-based link lookup.
//!
//! Resolves each DOI to its Crossref work record and collects the
//! `application/pdf` links publishers declare there. The link list feeds a
//! downstream browser-driven download step that is outside this crate.

use crate::error::{CuratorError, Result};
use futures::future::join_all;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// Crossref API base URL
const CROSSREF_API_URL: &str = "https://api.crossref.org/works";

/// Polite pool email for Crossref API
const MAILTO: &str = "litcurator@example.com";

/// A resolved Crossref work with its downloadable links.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CrossrefWork {
    /// DOI as registered with Crossref
    pub doi: String,
    /// Title from Crossref
    pub title: String,
    /// Declared `application/pdf` link URLs
    pub pdf_urls: Vec<String>,
    /// Article abstract (HTML tags stripped)
    pub abstract_text: String,
}

/// Crossref API client with rate limiting and concurrency control
pub struct CrossrefClient {
    client: reqwest::Client,
    semaphore: Arc<Semaphore>,
    max_retries: u32,
}

impl CrossrefClient {
    /// Create a new client with the given number of concurrent workers.
    pub fn new(max_workers: usize) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!("litcurator/1.0 (mailto:{})", MAILTO))
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| CuratorError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            semaphore: Arc::new(Semaphore::new(max_workers)),
            max_retries: 3,
        })
    }

    /// Resolve one DOI, with exponential backoff on rate limits.
    ///
    /// Returns `None` for DOIs Crossref does not know or that keep failing;
    /// link retrieval is best-effort.
    pub async fn lookup_by_doi(&self, doi: &str) -> Option<CrossrefWork> {
        let doi = doi.trim();
        if doi.is_empty() {
            return None;
        }

        let _permit = self.semaphore.acquire().await.ok()?;

        let mut backoff = Duration::from_millis(500);

        for attempt in 0..self.max_retries {
            match self.do_lookup(doi).await {
                Ok(work) => return work,
                Err(CuratorError::RateLimited(secs)) => {
                    let wait = Duration::from_secs(secs).max(backoff);
                    warn!(
                        doi = doi,
                        attempt = attempt + 1,
                        wait_secs = wait.as_secs(),
                        "Rate limited, waiting"
                    );
                    tokio::time::sleep(wait).await;
                    backoff *= 2;
                }
                Err(e) => {
                    debug!(doi = doi, attempt = attempt + 1, error = %e, "Lookup failed");
                    if attempt < self.max_retries - 1 {
                        tokio::time::sleep(backoff).await;
                        backoff *= 2;
                    }
                }
            }
        }

        None
    }

    /// Internal lookup implementation
    async fn do_lookup(&self, doi: &str) -> Result<Option<CrossrefWork>> {
        let url = format!("{}/{}", CROSSREF_API_URL, doi);
        let response = self
            .client
            .get(&url)
            .query(&[("mailto", MAILTO)])
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(CuratorError::RateLimited(5));
        }

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(CuratorError::Api {
                code: response.status().as_u16() as i32,
                message: format!("Crossref API error: {}", response.status()),
            });
        }

        let data: CrossrefResponse = response.json().await?;
        Ok(Some(parse_work_item(data.message)))
    }

    /// Resolve multiple DOIs concurrently.
    ///
    /// Returns a vector with the same length as the input, `None` for DOIs
    /// that could not be resolved.
    pub async fn lookup_batch(&self, dois: &[String]) -> Vec<Option<CrossrefWork>> {
        info!(count = dois.len(), "Starting batch Crossref lookup");

        let futures: Vec<_> = dois.iter().map(|doi| self.lookup_by_doi(doi)).collect();
        let results = join_all(futures).await;

        let matched = results.iter().filter(|r| r.is_some()).count();
        info!(total = dois.len(), matched = matched, "Batch lookup complete");

        results
    }
}

// === Crossref API Response Types ===

#[derive(Debug, Deserialize)]
struct CrossrefResponse {
    message: CrossrefItem,
}

#[derive(Debug, Deserialize)]
struct CrossrefItem {
    #[serde(rename = "DOI", default)]
    doi: String,
    #[serde(default)]
    title: Vec<String>,
    #[serde(default)]
    link: Vec<CrossrefLink>,
    #[serde(rename = "abstract", default)]
    abstract_text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CrossrefLink {
    #[serde(rename = "URL", default)]
    url: String,
    #[serde(rename = "content-type", default)]
    content_type: String,
}

/// Parse a Crossref work item into our link-list struct
fn parse_work_item(item: CrossrefItem) -> CrossrefWork {
    let pdf_urls = item
        .link
        .into_iter()
        .filter(|l| l.content_type == "application/pdf")
        .map(|l| l.url)
        .collect();

    let abstract_text = item
        .abstract_text
        .map(|s| strip_html_tags(&s))
        .unwrap_or_default();

    CrossrefWork {
        doi: item.doi,
        title: item.title.into_iter().next().unwrap_or_default(),
        pdf_urls,
        abstract_text,
    }
}

/// Strip HTML tags from text
fn strip_html_tags(text: &str) -> String {
    let re = Regex::new(r"<[^>]+>").unwrap_or_else(|_| Regex::new(r"").expect("Empty regex"));
    re.replace_all(text, "").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_html_tags() {
        assert_eq!(strip_html_tags("<p>Hello</p>"), "Hello");
        assert_eq!(strip_html_tags("No tags"), "No tags");
    }

    #[test]
    fn test_parse_work_item_filters_pdf_links() {
        let item = CrossrefItem {
            doi: "10.1234/test".to_string(),
            title: vec!["Test Title".to_string()],
            link: vec![
                CrossrefLink {
                    url: "https://example.org/a.pdf".to_string(),
                    content_type: "application/pdf".to_string(),
                },
                CrossrefLink {
                    url: "https://example.org/a.html".to_string(),
                    content_type: "text/html".to_string(),
                },
            ],
            abstract_text: Some("<jats:p>An abstract</jats:p>".to_string()),
        };

        let work = parse_work_item(item);
        assert_eq!(work.doi, "10.1234/test");
        assert_eq!(work.title, "Test Title");
        assert_eq!(work.pdf_urls, vec!["https://example.org/a.pdf"]);
        assert_eq!(work.abstract_text, "An abstract");
    }

    #[test]
    fn test_parse_work_item_without_links() {
        let item = CrossrefItem {
            doi: "10.1/x".to_string(),
            title: vec![],
            link: vec![],
            abstract_text: None,
        };
        let work = parse_work_item(item);
        assert!(work.pdf_urls.is_empty());
        assert!(work.title.is_empty());
    }
}
