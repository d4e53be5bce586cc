//! Step-by-step review of unused classes.
//!
//! The host shows one class at a time and lets the user keep it (`Next`) or
//! delete it (`Delete`, then `Applied` once the host has edited the
//! document). The session only tracks where the user is; spans are computed
//! against whatever text the host currently holds, so earlier deletions never
//! leave stale positions behind.
//!
//! ```text
//!            Next                   Next (last)
//!   Showing(i) ──────► Showing(i+1) ─────────► Done
//!       │                    ▲
//!       │ Delete             │ Applied
//!       ▼                    │
//!   Deleting(i) ─────────────┘
//! ```

use serde::Serialize;

use crate::error::{ClassCheckError, ClassCheckResult};
use crate::locate::{find_bounds, find_bounds_with_context, OccurrenceSpan};

/// Where the review currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReviewState {
    Showing(usize),
    Deleting(usize),
    Done,
}

/// Host-driven transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewEvent {
    /// Keep the current class and move on.
    Next,
    /// Ask the host to delete the current class.
    Delete,
    /// The host finished deleting the current class.
    Applied,
    /// Stop reviewing.
    Close,
}

/// Everything the host needs to present one class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewItem {
    pub index: usize,
    pub total: usize,
    pub class: String,
    /// Spans to highlight.
    pub bounds: Vec<OccurrenceSpan>,
    /// Spans to delete.
    pub deletion: Vec<OccurrenceSpan>,
    pub is_last: bool,
}

/// Review session over an ordered list of unused classes.
#[derive(Debug, Clone)]
pub struct ReviewSession {
    classes: Vec<String>,
    state: ReviewState,
}

impl ReviewSession {
    pub fn new(classes: Vec<String>) -> Self {
        let state = if classes.is_empty() {
            ReviewState::Done
        } else {
            ReviewState::Showing(0)
        };
        Self { classes, state }
    }

    pub fn state(&self) -> ReviewState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == ReviewState::Done
    }

    fn advance(&self, index: usize) -> ReviewState {
        if index + 1 < self.classes.len() {
            ReviewState::Showing(index + 1)
        } else {
            ReviewState::Done
        }
    }

    /// Apply `event` and return the new state.
    pub fn handle(&mut self, event: ReviewEvent) -> ClassCheckResult<ReviewState> {
        let next = match (self.state, event) {
            (ReviewState::Done, _) => ReviewState::Done,
            (_, ReviewEvent::Close) => ReviewState::Done,
            (ReviewState::Showing(i), ReviewEvent::Next) => self.advance(i),
            (ReviewState::Showing(i), ReviewEvent::Delete) => ReviewState::Deleting(i),
            (ReviewState::Deleting(i), ReviewEvent::Applied) => self.advance(i),
            (state, event) => {
                return Err(ClassCheckError::invalid_argument(format!(
                    "cannot handle {:?} while {:?}",
                    event, state
                )))
            }
        };
        self.state = next;
        Ok(next)
    }

    /// The class under review, with spans computed against `text`.
    pub fn current_item(&self, text: &str) -> Option<ReviewItem> {
        let index = match self.state {
            ReviewState::Showing(i) | ReviewState::Deleting(i) => i,
            ReviewState::Done => return None,
        };
        let class = self.classes.get(index)?;
        Some(ReviewItem {
            index,
            total: self.classes.len(),
            class: class.clone(),
            bounds: find_bounds(class, text),
            deletion: find_bounds_with_context(class, text),
            is_last: index + 1 == self.classes.len(),
        })
    }
}
