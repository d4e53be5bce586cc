//! classcheck-core: unused HTML class detection library
//!
//! Finds the class names declared in an HTML document's `class="..."`
//! attributes that are never mentioned in the project's scripts and
//! stylesheets, nor in a set of third-party reference sources.
//!
//! # Features
//!
//! - **Class extraction**: Distinct class tokens in first-declared order
//! - **Scope selection**: Search any ancestor directory of the document, with a
//!   remembered default
//! - **Usage search**: Parallel scan of JS/TS/CSS/SCSS files plus a reference
//!   corpus
//! - **Occurrence spans**: Exact positions for highlighting or deleting a class
//! - **Review loop**: Step through unused classes and delete them one by one
//! - **Session state**: Default scope and corpus persisted per project
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use classcheck_core::prelude::*;
//!
//! let outcome = ClassCheck::new("/site/src/index.html")
//!     .project_roots(["/site"])
//!     .run()?;
//!
//! for class in &outcome.report.unused {
//!     println!("Unused class: {}", class);
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`extract`]: Class attribute parsing
//! - [`scope`]: Project root matching and scope resolution
//! - [`scan`]: Parallel file discovery
//! - [`usage`]: Token usage search
//! - [`finder`]: Unused-class orchestration
//! - [`locate`]: Occurrence spans with and without surrounding context
//! - [`review`]: Review state machine
//! - [`fix`]: Removal of unused classes
//! - [`state`]: Persisted session state
//! - [`corpus`]: Reference corpus refresh
//! - [`builder`]: Fluent builder API for one check
//! - [`error`]: Typed error handling
//!
//! # Cargo Features
//!
//! - `fix` (default): Enable removal of unused classes
//! - `fetch` (default): Enable the HTTP reference corpus fetcher
//! - `full`: Enable all optional features

// Core modules (always available)
pub mod builder;
pub mod config;
pub mod corpus;
pub mod error;
pub mod extract;
pub mod finder;
pub mod locate;
pub mod logging;
pub mod prelude;
pub mod report;
pub mod review;
pub mod scan;
pub mod scope;
pub mod state;
pub mod usage;

// Feature-gated modules
#[cfg(feature = "fix")]
pub mod fix;

// ============================================================================
// Explicit Re-exports (avoiding glob imports for clear API surface)
// ============================================================================

// Error types
pub use error::{ClassCheckError, ClassCheckResult, IoResultExt};

// Builder API
pub use builder::{is_html, CheckOutcome, ClassCheck};

// Configuration
pub use config::{load_config, ClassCheckConfig, OutputConfig, ScanConfig, CONFIG_FILE_NAME};

// Corpus
pub use corpus::{
    refresh_corpus, url_fingerprint, CorpusEntry, CorpusFetcher, CorpusRefresh, CorpusState,
};
#[cfg(feature = "fetch")]
pub use corpus::HttpFetcher;

// Extraction and search
pub use extract::{extract_classes, DeclaredClasses};
pub use finder::{find_unused, ReferenceCorpus, UnusedReport};
pub use usage::{find_used_tokens, UsageSearcher};

// Occurrence spans
pub use locate::{
    find_bounds, find_bounds_with_context, find_context_matches, ContextMatch, ContextRule,
    OccurrenceSpan, Position,
};

// Logging
pub use logging::{init_structured_logging, log_check_event};

// Reporting
pub use report::{format_plain, format_spans, print_json, print_plain, print_spans, report_json};

// Review loop
pub use review::{ReviewEvent, ReviewItem, ReviewSession, ReviewState};

// File scanning
pub use scan::{gather_candidate_files, ScanOptions, DEFAULT_EXTENSIONS, EXCLUDED_DIRS};

// Scope resolution
pub use scope::{
    find_project_root, list_scopes, normalize_path, resolve_choice, scope_options, ResolvedScope, ScopeChoice,
    ScopeOption, ScopeSelection, DEFAULT_SUFFIX, ROOT_LABEL,
};

// Session state
pub use state::{
    load_state, load_state_or_default, save_state, state_path, SessionState, StateMetadata,
    STATE_DIR,
};

// Feature-gated re-exports
#[cfg(feature = "fix")]
pub use fix::{remove_class, remove_spans, remove_unused_classes, write_document, FixResult};

#[cfg(test)]
mod tests;
