//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use classcheck_core::prelude::*;
//! ```
//!
//! Covers what a host needs to run a check and act on its result.

// Errors
pub use crate::error::{ClassCheckError, ClassCheckResult};

// Builder API
pub use crate::builder::{CheckOutcome, ClassCheck};

// Scope resolution
pub use crate::scope::{list_scopes, scope_options, ResolvedScope, ScopeChoice, ScopeSelection};

// Checking
pub use crate::finder::{find_unused, ReferenceCorpus, UnusedReport};
pub use crate::locate::{find_bounds, find_bounds_with_context, OccurrenceSpan, Position};

// Review loop
pub use crate::review::{ReviewEvent, ReviewSession, ReviewState};

// Configuration and persisted state
pub use crate::config::{load_config, ClassCheckConfig};
pub use crate::state::{load_state_or_default, save_state, SessionState};

// Corpus
pub use crate::corpus::{refresh_corpus, CorpusFetcher};

#[cfg(feature = "fix")]
pub use crate::fix::{remove_class, remove_unused_classes, FixResult};
