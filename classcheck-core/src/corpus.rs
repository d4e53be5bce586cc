//! Third-party reference corpus.
//!
//! Class names used only by a CSS framework or a script loaded from a CDN
//! never show up in local files. The configured URLs are fetched once and
//! their text is searched after the local files.
//!
//! A refresh builds a complete new [`CorpusState`]; callers swap it in as a
//! whole so a check never sees a half-updated list. A URL that fails to load
//! is skipped with a warning and reported back, the others are still used.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::error::{ClassCheckError, ClassCheckResult};
use crate::finder::ReferenceCorpus;

/// Text fetched from one URL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CorpusEntry {
    pub url: String,
    pub text: String,
}

/// A complete corpus and the URL list it was built from.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CorpusState {
    /// [`url_fingerprint`] of the configured URLs at fetch time.
    #[serde(default)]
    pub fingerprint: String,
    #[serde(default)]
    pub fetched_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub entries: Vec<CorpusEntry>,
}

impl CorpusState {
    /// Texts in configuration order, as an immutable snapshot.
    pub fn snapshot(&self) -> ReferenceCorpus {
        self.entries.iter().map(|e| e.text.clone()).collect()
    }

    /// True if the corpus was built from a different URL list.
    pub fn is_stale(&self, urls: &[String]) -> bool {
        self.fingerprint != url_fingerprint(urls)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// SHA-256 of the URL list, order-sensitive.
pub fn url_fingerprint(urls: &[String]) -> String {
    let mut sha = Sha256::new();
    for url in urls {
        sha.update(url.as_bytes());
        sha.update(b"\n");
    }
    format!("{:x}", sha.finalize())
}

/// HTTP GET primitive used to populate the corpus.
pub trait CorpusFetcher {
    fn fetch_text(&self, url: &str) -> ClassCheckResult<String>;
}

/// Blocking HTTP fetcher.
#[cfg(feature = "fetch")]
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

#[cfg(feature = "fetch")]
impl HttpFetcher {
    pub fn new() -> ClassCheckResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(format!("classcheck/{}", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| ClassCheckError::fetch("<client>", e.to_string()))?;
        Ok(Self { client })
    }
}

#[cfg(feature = "fetch")]
impl CorpusFetcher for HttpFetcher {
    fn fetch_text(&self, url: &str) -> ClassCheckResult<String> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| ClassCheckError::fetch(url, e.to_string()))?;

        if !response.status().is_success() {
            return Err(ClassCheckError::fetch(
                url,
                format!("HTTP request failed with status {}", response.status()),
            ));
        }

        response
            .text()
            .map_err(|e| ClassCheckError::fetch(url, e.to_string()))
    }
}

/// Outcome of a refresh: the new corpus plus the URLs that were skipped.
#[derive(Debug)]
pub struct CorpusRefresh {
    pub state: CorpusState,
    pub failures: Vec<ClassCheckError>,
}

/// Fetch every URL in order and build a new corpus.
pub fn refresh_corpus(urls: &[String], fetcher: &dyn CorpusFetcher) -> CorpusRefresh {
    let mut entries = Vec::with_capacity(urls.len());
    let mut failures = Vec::new();

    for url in urls {
        match fetcher.fetch_text(url) {
            Ok(text) => {
                info!(url = %url, bytes = text.len(), "fetched reference source");
                entries.push(CorpusEntry {
                    url: url.clone(),
                    text,
                });
            }
            Err(e) => {
                warn!(url = %url, error = %e, "skipping reference source");
                failures.push(e);
            }
        }
    }

    CorpusRefresh {
        state: CorpusState {
            fingerprint: url_fingerprint(urls),
            fetched_at: Some(Utc::now()),
            entries,
        },
        failures,
    }
}
