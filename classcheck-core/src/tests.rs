//! Comprehensive test suite for classcheck-core.

use crate::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

fn write_file(file: &Path, content: &str) {
    fs::create_dir_all(file.parent().unwrap()).unwrap();
    fs::write(file, content).unwrap();
}

fn setup_temp_project() -> PathBuf {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir()
        .join("classcheck_tests")
        .join(format!("{}_{}", timestamp, id));

    if dir.exists() {
        fs::remove_dir_all(&dir).ok();
    }
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn corpus(blobs: &[&str]) -> ReferenceCorpus {
    blobs.iter().map(|s| s.to_string()).collect()
}

const SCENARIO_HTML: &str = r#"<div class="foo bar"></div><span class="bar baz"></span>"#;

// Core Test 1: Declared minus used, in first-declared order
#[test]
fn test_unused_in_declared_order() {
    let root = setup_temp_project();
    write_file(&root.join("styles/site.css"), ".foo{}");

    let report = find_unused(SCENARIO_HTML, &root, &[], &ScanOptions::default()).unwrap();
    assert_eq!(report.declared, vec!["foo", "bar", "baz"]);
    assert_eq!(report.unused, vec!["bar", "baz"]);
    assert_eq!(report.files_scanned, 1);
}

// Core Test 2: Empty document
#[test]
fn test_empty_document() {
    let root = setup_temp_project();
    write_file(&root.join("app.js"), "foo bar");

    let report = find_unused("", &root, &[], &ScanOptions::default()).unwrap();
    assert!(report.declared.is_empty());
    assert!(report.is_clean());
    assert_eq!(report.files_scanned, 0);
}

// Core Test 3: Unused is always a subset of declared
#[test]
fn test_unused_subset_of_declared() {
    let root = setup_temp_project();
    write_file(&root.join("a.ts"), "const x = 'card';");
    let html = r#"<a class="card hero"></a><b class="hero-title card"></b><i class="x"></i>"#;

    let report = find_unused(html, &root, &[], &ScanOptions::default()).unwrap();
    let declared = extract_classes(html);
    assert!(report.unused.iter().all(|c| declared.contains(c)));
    assert!(!report.unused.contains(&"card".to_string()));
}

// Core Test 4: Corpus usage counts as used
#[test]
fn test_corpus_marks_class_used() {
    let root = setup_temp_project();
    write_file(&root.join("site.css"), ".foo{}");

    let blobs = corpus(&[".bar{color:red}", "el.classList.add('baz')"]);
    let report = find_unused(SCENARIO_HTML, &root, &blobs, &ScanOptions::default()).unwrap();
    assert!(report.is_clean());
    assert_eq!(report.corpus_blobs, 2);
}

// Core Test 5: Corpus is not consulted once every class is found locally
#[test]
fn test_corpus_skipped_when_all_used_locally() {
    let root = setup_temp_project();
    write_file(&root.join("site.scss"), ".foo .bar .baz {}");

    let blobs = corpus(&["unrelated"]);
    let report = find_unused(SCENARIO_HTML, &root, &blobs, &ScanOptions::default()).unwrap();
    assert!(report.is_clean());
    assert_eq!(report.corpus_blobs, 0);
}

// Core Test 6: Idempotence
#[test]
fn test_find_unused_idempotent() {
    let root = setup_temp_project();
    write_file(&root.join("js/app.js"), "document.querySelector('.bar')");
    let options = ScanOptions::default();

    let first = find_unused(SCENARIO_HTML, &root, &[], &options).unwrap();
    let second = find_unused(SCENARIO_HTML, &root, &[], &options).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.unused, vec!["foo", "baz"]);
}

// Core Test 7: node_modules and other extensions are ignored
#[test]
fn test_excluded_locations_do_not_count() {
    let root = setup_temp_project();
    write_file(&root.join("node_modules/lib/index.js"), "foo bar baz");
    write_file(&root.join("notes.md"), "foo bar baz");
    write_file(&root.join("index.html"), SCENARIO_HTML);

    let report = find_unused(SCENARIO_HTML, &root, &[], &ScanOptions::default()).unwrap();
    assert_eq!(report.unused, vec!["foo", "bar", "baz"]);
    assert_eq!(report.files_scanned, 0);
}

// Core Test 8: Scope limits the search
#[test]
fn test_scope_limits_search() {
    let root = setup_temp_project();
    let page = root.join("src/pages/index.html");
    write_file(&page, SCENARIO_HTML);
    write_file(&root.join("src/pages/page.css"), ".foo{}");
    write_file(&root.join("src/shared.css"), ".bar{}");
    write_file(&root.join("vendor.js"), "baz");

    let roots = vec![root.clone()];
    let run = |selection| {
        ClassCheck::new(&page)
            .project_roots(roots.clone())
            .scope(selection)
            .run()
            .unwrap()
    };

    let nearest = run(ScopeSelection::Index(0));
    assert_eq!(nearest.scope.label, "src/pages");
    assert_eq!(nearest.report.unused, vec!["bar", "baz"]);

    let middle = run(ScopeSelection::Label("src".into()));
    assert_eq!(middle.scope.path, root.join("src"));
    assert_eq!(middle.report.unused, vec!["baz"]);

    let whole = run(ScopeSelection::Index(2));
    assert_eq!(whole.scope.label, ROOT_LABEL);
    assert!(whole.report.is_clean());
}

// Core Test 9: Picking a scope records it as the default, reusing it keeps it
#[test]
fn test_default_scope_flow() {
    let root = setup_temp_project();
    let page = root.join("web/index.html");
    write_file(&page, SCENARIO_HTML);

    let first = ClassCheck::new(&page)
        .project_roots([&root])
        .scope(ScopeSelection::Index(0))
        .run()
        .unwrap();
    assert_eq!(first.scope.default_index, Some(0));

    let mut state = load_state_or_default(&first.project_root);
    state.set_default(first.scope.default_index);
    save_state(&first.project_root, &state).unwrap();

    let state = load_state_or_default(&root);
    let options = scope_options(
        &list_scopes(&page, &root).unwrap(),
        state.default_scope,
    );
    assert_eq!(options[0].label, "web (default)");
    assert_eq!(options[0].selection, ScopeSelection::Default);

    let second = ClassCheck::new(&page)
        .project_roots([&root])
        .default_index(state.default_scope)
        .run()
        .unwrap();
    assert_eq!(second.scope.label, "web");
    assert_eq!(second.scope.default_index, Some(0));
}

// Core Test 10: No selection and no default searches the whole project
#[test]
fn test_builder_defaults_to_project_root() {
    let root = setup_temp_project();
    let page = root.join("a/b/index.html");
    write_file(&page, r#"<p class="lead"></p>"#);
    write_file(&root.join("main.css"), ".lead{}");

    let outcome = ClassCheck::new(&page).project_roots([&root]).run().unwrap();
    assert_eq!(outcome.scope.label, ROOT_LABEL);
    assert_eq!(outcome.scope.index, 2);
    assert_eq!(outcome.scope.default_index, None);
    assert!(outcome.report.is_clean());
}

// Core Test 11: Stale default is clamped to the project root
#[test]
fn test_stale_default_clamped() {
    let root = setup_temp_project();
    let page = root.join("index.html");
    write_file(&page, r#"<p class="lead"></p>"#);

    let outcome = ClassCheck::new(&page)
        .project_roots([&root])
        .default_index(Some(4))
        .run()
        .unwrap();
    assert_eq!(outcome.scope.label, ROOT_LABEL);
    assert_eq!(outcome.report.unused, vec!["lead"]);
}

// Core Test 11b: Roots and files spelled with `..` resolve to the same tree
#[test]
fn test_builder_with_parent_dir_components() {
    let root = setup_temp_project();
    let page = root.join("web/index.html");
    write_file(&page, r#"<p class="lead"></p>"#);
    write_file(&root.join("web/site.css"), ".lead{}");

    let dotted_root = root.join("web/..");
    let outcome = ClassCheck::new(&page)
        .project_roots([&dotted_root])
        .run()
        .unwrap();
    assert_eq!(outcome.project_root, root);
    assert_eq!(outcome.scope.path, root);
    assert!(outcome.report.is_clean());

    let dotted_page = root.join("web/../web/index.html");
    let outcome = ClassCheck::new(&dotted_page)
        .project_roots([&root])
        .scope(ScopeSelection::Index(0))
        .run()
        .unwrap();
    assert_eq!(outcome.scope.label, "web");
    assert_eq!(outcome.scope.path, root.join("web"));
}

// Core Test 12: Host-supplied text wins over the file on disk
#[test]
fn test_builder_uses_unsaved_text() {
    let root = setup_temp_project();
    let page = root.join("index.html");
    write_file(&page, r#"<p class="saved"></p>"#);

    let outcome = ClassCheck::new(&page)
        .project_roots([&root])
        .html_text(r#"<p class="unsaved"></p>"#)
        .run()
        .unwrap();
    assert_eq!(outcome.report.declared, vec!["unsaved"]);
}

// Core Test 13: Abort conditions
#[test]
fn test_builder_abort_conditions() {
    let root = setup_temp_project();
    let other = setup_temp_project();
    let page = other.join("index.html");
    write_file(&page, SCENARIO_HTML);

    let err = ClassCheck::new(&page).project_roots([&root]).run().unwrap_err();
    let typed = err.downcast_ref::<ClassCheckError>().unwrap();
    assert!(matches!(typed, ClassCheckError::ScopeResolution { .. }));
    assert!(typed.aborts_check());

    let missing = root.join("missing.html");
    let err = ClassCheck::new(&missing).project_roots([&root]).run().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ClassCheckError>(),
        Some(ClassCheckError::NoActiveDocument { .. })
    ));
}

// Core Test 14: Corpus snapshot survives a refresh
#[test]
fn test_corpus_snapshot_isolated_from_refresh() {
    struct Fixed(&'static str);
    impl CorpusFetcher for Fixed {
        fn fetch_text(&self, _url: &str) -> ClassCheckResult<String> {
            Ok(self.0.to_string())
        }
    }

    let urls = vec!["https://cdn.example.com/ui.css".to_string()];
    let mut state = SessionState::default();
    state.corpus = refresh_corpus(&urls, &Fixed(".bar{}")).state;
    let snapshot = state.corpus_snapshot();

    state.corpus = refresh_corpus(&urls, &Fixed(".baz{}")).state;
    assert_eq!(&*snapshot, [".bar{}".to_string()].as_slice());
    assert_eq!(Arc::strong_count(&snapshot), 1);

    let root = setup_temp_project();
    let report = find_unused(SCENARIO_HTML, &root, &snapshot, &ScanOptions::default()).unwrap();
    assert_eq!(report.unused, vec!["foo", "baz"]);
}

// Core Test 15: Config feeds scan options and library URLs
#[test]
fn test_config_loading() {
    let root = setup_temp_project();
    write_file(
        &root.join(CONFIG_FILE_NAME),
        r#"
third_party_libraries = ["https://cdn.example.com/ui.css"]

[scan]
extensions = [".vue"]
exclude = ["dist"]

[output]
format = "json"
"#,
    );
    write_file(&root.join("App.vue"), "<template class-name='foo'>");
    write_file(&root.join("dist/bundle.vue"), "bar");

    let cfg = load_config(&root).unwrap().unwrap();
    assert_eq!(cfg.library_urls(), ["https://cdn.example.com/ui.css"]);
    assert!(cfg.wants_json());

    let report = find_unused(SCENARIO_HTML, &root, &[], &cfg.scan_options()).unwrap();
    assert_eq!(report.unused, vec!["bar", "baz"]);
}

// Test 16: Config Not Found
#[test]
fn test_config_not_found() {
    let root = setup_temp_project();
    assert!(load_config(&root).unwrap().is_none());
}

// Test 17: Logging Module
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run `f` with a JSON subscriber on this thread and return what it logged.
fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_writer(logs.clone())
        .with_max_level(tracing::Level::INFO)
        .finish();
    let out = tracing::subscriber::with_default(subscriber, f);
    let text = String::from_utf8_lossy(&logs.0.lock().unwrap()).to_string();
    (out, text)
}

#[test]
fn test_check_event_levels() {
    let ((), logs) = capture_logs(|| {
        log_check_event("abort", "index.html", "gone");
        log_check_event("stale", "index.html", "clamped");
        log_check_event("custom", "index.html", "custom detail");
    });
    let lines: Vec<_> = logs.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains("\"level\":\"ERROR\""));
    assert!(lines[1].contains("\"level\":\"WARN\""));
    assert!(lines[2].contains("\"level\":\"INFO\""));
}

#[test]
fn test_document_without_classes_logs_empty() {
    let root = setup_temp_project();
    let page = root.join("index.html");
    write_file(&page, "<p>plain</p>");

    let (outcome, logs) =
        capture_logs(|| ClassCheck::new(&page).project_roots([&root]).run().unwrap());
    assert!(outcome.report.declared.is_empty());
    assert!(logs.contains("\"event\":\"empty\""));
    assert!(!logs.contains("\"event\":\"clean\""));
}

#[test]
fn test_stale_default_logs_stale() {
    let root = setup_temp_project();
    let page = root.join("index.html");
    write_file(&page, r#"<p class="lead"></p>"#);

    let (outcome, logs) = capture_logs(|| {
        ClassCheck::new(&page)
            .project_roots([&root])
            .default_index(Some(4))
            .run()
            .unwrap()
    });
    assert_eq!(outcome.scope.default_index, Some(0));
    assert!(logs.contains("\"event\":\"stale\""));

    // An explicit pick does not touch the remembered default
    let (_, logs) = capture_logs(|| {
        ClassCheck::new(&page)
            .project_roots([&root])
            .default_index(Some(4))
            .scope(ScopeSelection::Index(0))
            .run()
            .unwrap()
    });
    assert!(!logs.contains("\"event\":\"stale\""));
}

// ============================================================================
// LOCATE AND FIX
// ============================================================================

#[test]
fn test_sole_class_span_covers_attribute() {
    let line = r#"<div class="foo">"#;
    assert_eq!(
        find_bounds_with_context("foo", line),
        vec![OccurrenceSpan::on_line(0, 4, 16)]
    );
    assert_eq!(find_bounds("foo", line), vec![OccurrenceSpan::on_line(0, 12, 15)]);
}

#[cfg(feature = "fix")]
#[test]
fn test_delete_first_of_two() {
    let text = r#"<div class="foo bar">"#;
    let (out, count) = fix::remove_spans(text, &find_bounds_with_context("foo", text));
    assert_eq!(out, r#"<div class="bar">"#);
    assert_eq!(count, 1);
}

#[test]
fn test_locate_partial_token_does_not_match() {
    let text = r#"<div class="foobar">"#;
    assert!(find_bounds("foo", text).is_empty());
    assert!(find_bounds_with_context("foo", text).is_empty());
}

#[cfg(feature = "fix")]
#[test]
fn test_review_and_delete_every_unused_class() {
    let root = setup_temp_project();
    let page = root.join("index.html");
    let mut text = "<div class=\"foo bar\">\n  <span class=\"bar baz qux\"></span>\n</div>\n".to_string();
    write_file(&page, &text);
    write_file(&root.join("app.js"), "qux");

    let outcome = ClassCheck::new(&page).project_roots([&root]).run().unwrap();
    assert_eq!(outcome.report.unused, vec!["foo", "bar", "baz"]);

    let mut session = ReviewSession::new(outcome.report.unused.clone());
    while let Some(item) = session.current_item(&text) {
        session.handle(ReviewEvent::Delete).unwrap();
        text = fix::remove_spans(&text, &item.deletion).0;
        session.handle(ReviewEvent::Applied).unwrap();
    }

    assert!(session.is_done());
    assert_eq!(text, "<div>\n  <span class=\"qux\"></span>\n</div>\n");
    assert!(extract_classes(&text).iter().all(|c| c == "qux"));
}

#[cfg(feature = "fix")]
#[test]
fn test_fix_file_then_recheck_is_clean() {
    let root = setup_temp_project();
    let page = root.join("index.html");
    write_file(&page, "<div class=\"foo bar\"></div>\n<span class=\"bar baz\"></span>\n");
    write_file(&root.join("site.css"), ".foo{}");

    let outcome = ClassCheck::new(&page).project_roots([&root]).run().unwrap();
    let fixed = remove_unused_classes(&page, &outcome.report.unused, false).unwrap();
    assert!(fixed.written);
    assert_eq!(
        fs::read_to_string(&page).unwrap(),
        "<div class=\"foo\"></div>\n<span></span>\n"
    );

    let again = ClassCheck::new(&page).project_roots([&root]).run().unwrap();
    assert!(again.report.is_clean());
}

// ============================================================================
// EDGE CASES
// ============================================================================

#[test]
fn test_uppercase_classes_are_not_declared() {
    assert!(extract_classes(r#"<div class="Foo"></div>"#).is_empty());
}

#[test]
fn test_duplicate_classes_declared_once() {
    let html = r#"<a class="x"></a><b class="x y"></b><i class="y x"></i>"#;
    let declared: Vec<_> = extract_classes(html).into_iter().collect();
    assert_eq!(declared, vec!["x", "y"]);
}

#[test]
fn test_token_used_as_pattern() {
    // Tokens match anywhere, so `col-1` is found inside `col-10`
    let used = find_used_tokens(["a-b", "col-1"], ["a-b col-10"]);
    assert!(used.contains("a-b"));
    assert!(used.contains("col-1"));
}

#[test]
fn test_binary_file_does_not_panic() {
    let root = setup_temp_project();
    fs::write(root.join("blob.js"), [0xff, 0xfe, b'f', b'o', b'o', 0x00]).unwrap();

    let report = find_unused(SCENARIO_HTML, &root, &[], &ScanOptions::default()).unwrap();
    assert_eq!(report.unused, vec!["bar", "baz"]);
}

#[test]
fn test_path_with_spaces() {
    let root = setup_temp_project();
    let page = root.join("my site/index.html");
    write_file(&page, r#"<p class="lead"></p>"#);
    write_file(&root.join("my site/css/main.css"), ".lead{}");

    let outcome = ClassCheck::new(&page)
        .project_roots([&root])
        .scope(ScopeSelection::Index(0))
        .run()
        .unwrap();
    assert_eq!(outcome.scope.label, "my site");
    assert!(outcome.report.is_clean());
}

#[test]
fn test_many_files_parallel_determinism() {
    let root = setup_temp_project();
    for i in 0..100 {
        write_file(&root.join(format!("js/m{}.js", i)), &format!("const c{} = 1;", i));
    }
    write_file(&root.join("js/m77.js"), "bar");

    let options = ScanOptions::default();
    let first = find_unused(SCENARIO_HTML, &root, &[], &options).unwrap();
    for _ in 0..5 {
        assert_eq!(find_unused(SCENARIO_HTML, &root, &[], &options).unwrap(), first);
    }
    assert_eq!(first.unused, vec!["foo", "baz"]);
}
