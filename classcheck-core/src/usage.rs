//! Class usage search over local files and reference texts.
//!
//! Each token is used as a regular expression exactly as written, without
//! escaping. Tokens coming from [`crate::extract`] only contain `[a-z0-9_-]`
//! and therefore match literally; a token that does not compile falls back to
//! plain substring search.
//!
//! Once a token has been found it is never searched again, so the work is
//! bounded by `tokens x blobs` and shrinks as tokens get resolved.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use regex::Regex;
use tracing::{debug, warn};

/// Files read in parallel before pending tokens are pruned.
const FILE_BATCH_SIZE: usize = 32;

enum Matcher {
    Pattern(Regex),
    Literal,
}

struct TokenMatcher {
    token: String,
    matcher: Matcher,
}

impl TokenMatcher {
    fn new(token: &str) -> Self {
        let matcher = match Regex::new(token) {
            Ok(re) => Matcher::Pattern(re),
            Err(e) => {
                warn!(token = %token, error = %e, "class is not a valid pattern, matching literally");
                Matcher::Literal
            }
        };
        Self {
            token: token.to_string(),
            matcher,
        }
    }

    fn is_match(&self, text: &str) -> bool {
        match &self.matcher {
            Matcher::Pattern(re) => re.is_match(text),
            Matcher::Literal => text.contains(&self.token),
        }
    }
}

/// Incremental usage search.
///
/// Feed it blobs with [`search_text`](Self::search_text) or
/// [`search_files`](Self::search_files), then collect the used tokens with
/// [`finish`](Self::finish).
pub struct UsageSearcher {
    pending: Vec<TokenMatcher>,
    used: HashSet<String>,
}

impl UsageSearcher {
    /// Create a searcher for `tokens`.
    pub fn new<'a>(tokens: impl IntoIterator<Item = &'a str>) -> Self {
        let mut seen = HashSet::new();
        let pending = tokens
            .into_iter()
            .filter(|t| seen.insert(*t))
            .map(TokenMatcher::new)
            .collect();
        Self {
            pending,
            used: HashSet::new(),
        }
    }

    /// True once every token has been found.
    pub fn is_done(&self) -> bool {
        self.pending.is_empty()
    }

    /// Number of tokens not found yet.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Search one blob, resolving every pending token it mentions.
    pub fn search_text(&mut self, text: &str) {
        if self.pending.is_empty() {
            return;
        }
        let hits: Vec<usize> = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_match(text))
            .map(|(i, _)| i)
            .collect();
        self.resolve(hits);
    }

    /// Search local files, reading each batch in parallel.
    ///
    /// Unreadable files are skipped with a warning. Returns the number of
    /// files actually searched.
    pub fn search_files(&mut self, files: &[PathBuf]) -> usize {
        let mut searched = 0;

        for batch in files.chunks(FILE_BATCH_SIZE) {
            if self.pending.is_empty() {
                break;
            }

            let pending = &self.pending;
            let batch_hits: Vec<Vec<usize>> = batch
                .par_iter()
                .filter_map(|path| read_lossy(path))
                .map(|text| {
                    pending
                        .iter()
                        .enumerate()
                        .filter(|(_, m)| m.is_match(&text))
                        .map(|(i, _)| i)
                        .collect()
                })
                .collect();

            searched += batch_hits.len();
            let hits: Vec<usize> = batch_hits.into_iter().flatten().collect();
            self.resolve(hits);
        }

        searched
    }

    /// Move the matchers at `hits` from pending to used.
    fn resolve(&mut self, hits: Vec<usize>) {
        if hits.is_empty() {
            return;
        }
        let hit_set: HashSet<usize> = hits.into_iter().collect();
        let mut index = 0;
        let used = &mut self.used;
        self.pending.retain(|m| {
            let keep = !hit_set.contains(&index);
            if !keep {
                debug!(class = %m.token, "class is used");
                used.insert(m.token.clone());
            }
            index += 1;
            keep
        });
    }

    /// Tokens found at least once.
    pub fn finish(self) -> HashSet<String> {
        self.used
    }
}

/// Read a file as text, replacing invalid UTF-8.
fn read_lossy(path: &Path) -> Option<String> {
    match fs::read(path) {
        Ok(bytes) => Some(match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        }),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "skipping unreadable file");
            None
        }
    }
}

/// Tokens from `tokens` that occur in any of `blobs`.
pub fn find_used_tokens<'a, 'b>(
    tokens: impl IntoIterator<Item = &'a str>,
    blobs: impl IntoIterator<Item = &'b str>,
) -> HashSet<String> {
    let mut searcher = UsageSearcher::new(tokens);
    for blob in blobs {
        if searcher.is_done() {
            break;
        }
        searcher.search_text(blob);
    }
    searcher.finish()
}
