//! Output formatting - plaintext and JSON.

use serde_json::json;

use crate::finder::UnusedReport;
use crate::locate::OccurrenceSpan;
use crate::scope::ResolvedScope;

/// Plain text summary of a check.
pub fn format_plain(report: &UnusedReport) -> String {
    if report.is_clean() {
        return "No unused classes found!".to_string();
    }
    let mut out = format!("Found {} unused classes!", report.unused.len());
    for class in &report.unused {
        out.push_str("\n- ");
        out.push_str(class);
    }
    out
}

/// Prints the unused classes in plain text format.
pub fn print_plain(report: &UnusedReport) {
    println!("{}", format_plain(report));
}

/// JSON document for a check.
pub fn report_json(report: &UnusedReport, scope: &ResolvedScope) -> serde_json::Value {
    json!({
        "scope": {
            "label": scope.label,
            "index": scope.index,
            "path": scope.path.display().to_string(),
        },
        "declared": report.declared,
        "unused": report.unused,
        "files_scanned": report.files_scanned,
        "corpus_blobs": report.corpus_blobs,
    })
}

/// Prints the check result in JSON format.
///
/// Falls back to a minimal document if serialization fails.
pub fn print_json(report: &UnusedReport, scope: &ResolvedScope) {
    match serde_json::to_string_pretty(&report_json(report, scope)) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("[WARN] JSON serialization failed: {}", e);
            println!("{{\"unused\": {:?}}}", report.unused);
        }
    }
}

/// Plain text listing of occurrence spans, one `line:col-line:col` per row.
pub fn format_spans(class: &str, spans: &[OccurrenceSpan]) -> String {
    if spans.is_empty() {
        return format!("No occurrences of {}", class);
    }
    let mut out = format!("{} ({} occurrences):", class, spans.len());
    for span in spans {
        out.push_str(&format!(
            "\n  {}:{}-{}:{}",
            span.start.line + 1,
            span.start.column,
            span.end.line + 1,
            span.end.column
        ));
    }
    out
}

/// Prints occurrence spans of one class.
pub fn print_spans(class: &str, spans: &[OccurrenceSpan], json_output: bool) {
    if !json_output {
        println!("{}", format_spans(class, spans));
        return;
    }
    match serde_json::to_string_pretty(&json!({ "class": class, "spans": spans })) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("[WARN] JSON serialization failed: {}", e),
    }
}
