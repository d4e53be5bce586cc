//! Structured logging using **tracing**.
//!
//! Library code only emits events; the binaries decide where they go. The
//! JSON subscriber keeps stdout free for the unused-class report.

use tracing::{error, info, warn};

/// Initializes the global tracing subscriber.
///
/// Call once at startup. Output is JSON on stderr.
///
/// # Environment Variables
/// - `RUST_LOG`: Controls log filtering (e.g., `RUST_LOG=classcheck_core=debug`)
pub fn init_structured_logging() {
    tracing_subscriber::fmt()
        .json()
        .with_ansi(false)
        .with_level(true)
        .with_target(true)
        .with_current_span(true)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

/// Logs a check lifecycle event with the HTML document it concerns.
///
/// `abort` is logged as an error; `empty` (no classes declared) and `stale`
/// (remembered default out of range) as warnings; anything else as info.
pub fn log_check_event(event: &str, document: &str, detail: &str) {
    match event {
        "abort" => error!(event = %event, document = %document, detail = %detail),
        "empty" | "stale" => warn!(event = %event, document = %document, detail = %detail),
        _ => info!(event = %event, document = %document, detail = %detail),
    }
}
