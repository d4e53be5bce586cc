//! Builder pattern API for one unused-class check.
//!
//! ```rust,ignore
//! use classcheck_core::prelude::*;
//!
//! let outcome = ClassCheck::new("/site/src/pages/index.html")
//!     .project_roots(["/site"])
//!     .default_index(state.default_scope)
//!     .corpus(state.corpus_snapshot())
//!     .run()?;
//!
//! state.set_default(outcome.scope.default_index);
//! println!("Unused: {:?}", outcome.report.unused);
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::error::{ClassCheckError, IoResultExt};
use crate::finder::{find_unused, ReferenceCorpus, UnusedReport};
use crate::logging::log_check_event;
use crate::scan::ScanOptions;
use crate::scope::{
    find_project_root, list_scopes, normalize_path, resolve_choice, ResolvedScope, ScopeSelection,
};

/// Builder for configuring one check.
#[derive(Debug, Clone)]
pub struct ClassCheck {
    /// HTML document being checked
    active_file: PathBuf,

    /// Document text supplied by the host (unsaved buffer)
    html_text: Option<String>,

    /// Known project roots, first match wins
    project_roots: Vec<PathBuf>,

    /// Scope picked by the user; `None` means the remembered default, or the
    /// project root when nothing is remembered
    selection: Option<ScopeSelection>,

    /// Remembered default scope index
    default_index: Option<usize>,

    /// Reference corpus snapshot
    corpus: ReferenceCorpus,

    /// File discovery options
    scan_options: ScanOptions,
}

/// Result of a check.
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    pub report: UnusedReport,
    /// Scope that was searched, including the default index to persist.
    pub scope: ResolvedScope,
    pub project_root: PathBuf,
}

impl ClassCheck {
    /// Create a check for the given HTML file.
    pub fn new(active_file: impl Into<PathBuf>) -> Self {
        Self {
            active_file: active_file.into(),
            html_text: None,
            project_roots: Vec::new(),
            selection: None,
            default_index: None,
            corpus: ReferenceCorpus::from(Vec::new()),
            scan_options: ScanOptions::default(),
        }
    }

    /// Use this text instead of reading the file.
    pub fn html_text(mut self, text: impl Into<String>) -> Self {
        self.html_text = Some(text.into());
        self
    }

    /// Add project roots.
    pub fn project_roots(mut self, roots: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        self.project_roots.extend(roots.into_iter().map(Into::into));
        self
    }

    /// Search the scope picked by the user.
    pub fn scope(mut self, selection: ScopeSelection) -> Self {
        self.selection = Some(selection);
        self
    }

    /// Remembered default scope index.
    pub fn default_index(mut self, index: Option<usize>) -> Self {
        self.default_index = index;
        self
    }

    /// Reference corpus snapshot to search after local files.
    pub fn corpus(mut self, corpus: ReferenceCorpus) -> Self {
        self.corpus = corpus;
        self
    }

    /// Override file discovery options.
    pub fn scan_options(mut self, options: ScanOptions) -> Self {
        self.scan_options = options;
        self
    }

    fn document_label(&self) -> String {
        self.active_file.display().to_string()
    }

    /// Run the check.
    pub fn run(&self) -> Result<CheckOutcome> {
        let document = self.document_label();

        if !is_html(&self.active_file) {
            log_check_event("abort", &document, "not an HTML document");
            return Err(ClassCheckError::no_active_document(document).into());
        }

        let text = match &self.html_text {
            Some(text) => text.clone(),
            None => fs::read_to_string(&self.active_file)
                .with_path(&self.active_file)
                .map_err(|e| {
                    log_check_event("abort", &document, "document unreadable");
                    ClassCheckError::no_active_document(e.to_string())
                })?,
        };

        let project_root = find_project_root(&self.active_file, &self.project_roots)
            .inspect_err(|_| log_check_event("abort", &document, "file not in workspace"))?;
        let project_root = normalize_path(project_root);

        let scopes = list_scopes(&self.active_file, &project_root)?;
        let selection = match (&self.selection, self.default_index) {
            (Some(selection), _) => selection.clone(),
            (None, Some(_)) => ScopeSelection::Default,
            (None, None) => ScopeSelection::Index(scopes.len() - 1),
        };
        if let (ScopeSelection::Default, Some(recorded)) = (&selection, self.default_index) {
            if recorded >= scopes.len() {
                log_check_event(
                    "stale",
                    &document,
                    &format!(
                        "remembered scope {} is out of range for this file, using project root",
                        recorded
                    ),
                );
            }
        }
        let mut scope = resolve_choice(&selection, &scopes, self.default_index)?;
        if self.selection.is_none() && self.default_index.is_none() {
            // Nothing was picked, so nothing new to remember
            scope.default_index = None;
        }

        log_check_event("start", &document, &format!("searching {}", scope.label));
        let report = find_unused(&text, &scope.path, &self.corpus, &self.scan_options)?;

        if report.declared.is_empty() {
            log_check_event("empty", &document, "no classes declared");
        } else if report.is_clean() {
            log_check_event("clean", &document, "no unused classes");
        } else {
            log_check_event(
                "done",
                &document,
                &format!("{} unused classes", report.unused.len()),
            );
        }

        Ok(CheckOutcome {
            report,
            scope,
            project_root,
        })
    }
}

/// True for `.html` files.
pub fn is_html(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("html"))
}
