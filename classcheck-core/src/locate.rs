//! Occurrence spans of a class inside an HTML document.
//!
//! Two queries are offered:
//!
//! - [`find_bounds`]: the token characters only, for highlighting.
//! - [`find_bounds_with_context`]: the token plus the whitespace (or the
//!   whole `class="..."` attribute) that has to go with it so the remaining
//!   classes stay single-space separated after deletion.
//!
//! Both work line by line and consider a line only if the token appears
//! delimited by a space or a double quote on both sides. At most one span is
//! reported per line.
//!
//! Like the usage search, the token is interpolated into the patterns as
//! written. A token that produces an invalid pattern has no spans.

use regex::Regex;
use serde::Serialize;
use tracing::warn;

/// A position in a document: 0-based line, 0-based byte column in that line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// A half-open region `[start, end)` of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct OccurrenceSpan {
    pub start: Position,
    pub end: Position,
}

impl OccurrenceSpan {
    /// Span on a single line.
    pub fn on_line(line: usize, start: usize, end: usize) -> Self {
        Self {
            start: Position::new(line, start),
            end: Position::new(line, end),
        }
    }
}

/// Which deletion rule produced a with-context span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ContextRule {
    /// The class is the only one in its attribute; the attribute goes.
    SoleClass,
    /// Spaces on both sides; one trailing space is kept.
    BetweenTokens,
    /// Last class before the closing quote; the leading spaces go.
    LastToken,
    /// First class after the opening quote; the trailing spaces go.
    FirstToken,
}

/// A with-context span together with the rule that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContextMatch {
    pub rule: ContextRule,
    pub span: OccurrenceSpan,
}

/// One row of the rule table: `prefix token suffix`, then shift the match.
struct RuleSpec {
    rule: ContextRule,
    prefix: &'static str,
    suffix: &'static str,
    /// Characters dropped from the start of the match.
    start_shift: usize,
    /// Characters dropped from the end of the match.
    end_trim: usize,
}

/// Evaluated in order; the first rule matching a line wins.
static CONTEXT_RULES: [RuleSpec; 4] = [
    RuleSpec {
        rule: ContextRule::SoleClass,
        prefix: r#" class=" *"#,
        suffix: r#" *""#,
        start_shift: 0,
        end_trim: 0,
    },
    RuleSpec {
        rule: ContextRule::BetweenTokens,
        prefix: " +",
        suffix: " +",
        start_shift: 0,
        end_trim: 1,
    },
    RuleSpec {
        rule: ContextRule::LastToken,
        prefix: " +",
        suffix: "\"",
        start_shift: 0,
        end_trim: 1,
    },
    RuleSpec {
        rule: ContextRule::FirstToken,
        prefix: "\"",
        suffix: " +",
        start_shift: 1,
        end_trim: 0,
    },
];

/// Delimited-token pattern shared by both queries.
fn delimited_pattern(token: &str) -> Option<Regex> {
    compile(&format!(r#"[ "]{}[ "]"#, token), token)
}

fn compile(pattern: &str, token: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!(class = %token, error = %e, "cannot build occurrence pattern");
            None
        }
    }
}

/// Compiled rule table for one token.
struct ContextPatterns {
    gate: Regex,
    rules: Vec<(&'static RuleSpec, Regex)>,
}

impl ContextPatterns {
    fn for_token(token: &str) -> Option<Self> {
        let gate = delimited_pattern(token)?;
        let mut rules = Vec::with_capacity(CONTEXT_RULES.len());
        for row in &CONTEXT_RULES {
            let re = compile(&format!("{}{}{}", row.prefix, token, row.suffix), token)?;
            rules.push((row, re));
        }
        Some(Self { gate, rules })
    }

    fn classify(&self, line_no: usize, line: &str) -> Option<ContextMatch> {
        if !self.gate.is_match(line) {
            return None;
        }
        self.rules.iter().find_map(|(row, re)| {
            re.find(line).map(|m| ContextMatch {
                rule: row.rule,
                span: OccurrenceSpan::on_line(
                    line_no,
                    m.start() + row.start_shift,
                    m.end() - row.end_trim,
                ),
            })
        })
    }
}

/// Spans covering exactly the token, one per matching line.
pub fn find_bounds(token: &str, text: &str) -> Vec<OccurrenceSpan> {
    let Some(gate) = delimited_pattern(token) else {
        return Vec::new();
    };

    text.split('\n')
        .enumerate()
        .filter_map(|(line_no, line)| {
            gate.find(line)
                .map(|m| OccurrenceSpan::on_line(line_no, m.start() + 1, m.end() - 1))
        })
        .collect()
}

/// With-context spans and the rule that produced each of them.
pub fn find_context_matches(token: &str, text: &str) -> Vec<ContextMatch> {
    let Some(patterns) = ContextPatterns::for_token(token) else {
        return Vec::new();
    };

    text.split('\n')
        .enumerate()
        .filter_map(|(line_no, line)| patterns.classify(line_no, line))
        .collect()
}

/// Spans to delete so that the token disappears cleanly.
pub fn find_bounds_with_context(token: &str, text: &str) -> Vec<OccurrenceSpan> {
    find_context_matches(token, text)
        .into_iter()
        .map(|m| m.span)
        .collect()
}
