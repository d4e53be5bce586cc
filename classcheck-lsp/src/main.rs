//! classcheck LSP Server - unused CSS class diagnostics for HTML documents.
//!
//! Provides IDE integration with:
//! - Diagnostics on every occurrence of an unused class, on open and save
//! - A quick fix that deletes an unused class
//! - Reference corpus refresh on startup and on configuration change
//!
//! Never panics on bad input; failures are reported through `window/logMessage`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tower_lsp::jsonrpc::Result as LspResult;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService, Server};

use classcheck_core::{
    find_bounds, find_bounds_with_context, init_structured_logging, is_html, load_config,
    load_state_or_default, normalize_path, refresh_corpus, save_state, ClassCheck, ClassCheckError,
    HttpFetcher, OccurrenceSpan, ReferenceCorpus,
};

/// Diagnostic code attached to every unused-class warning.
const DIAGNOSTIC_CODE: &str = "unused-class";

/// Payload carried by each diagnostic so the quick fix knows the class.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
struct UnusedClassData {
    class: String,
}

/// UTF-16 column of byte offset `byte_col` in `line`.
fn utf16_column(line: &str, byte_col: usize) -> u32 {
    let end = byte_col.min(line.len());
    let prefix = line.get(..end).unwrap_or(line);
    prefix.encode_utf16().count() as u32
}

/// Convert a byte-offset span into an LSP range.
fn to_range(lines: &[&str], span: &OccurrenceSpan) -> Range {
    let convert = |line: usize, column: usize| {
        let text = lines.get(line).copied().unwrap_or("");
        tower_lsp::lsp_types::Position::new(line as u32, utf16_column(text, column))
    };
    Range::new(
        convert(span.start.line, span.start.column),
        convert(span.end.line, span.end.column),
    )
}

/// One warning per occurrence of every unused class.
fn unused_diagnostics(text: &str, unused: &[String]) -> Vec<Diagnostic> {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut diagnostics = Vec::new();

    for class in unused {
        let data = serde_json::to_value(UnusedClassData {
            class: class.clone(),
        })
        .ok();
        for span in find_bounds(class, text) {
            diagnostics.push(Diagnostic {
                range: to_range(&lines, &span),
                severity: Some(DiagnosticSeverity::WARNING),
                code: Some(NumberOrString::String(DIAGNOSTIC_CODE.to_string())),
                source: Some("classcheck".to_string()),
                message: format!("Unused class `{}`", class),
                tags: Some(vec![DiagnosticTag::UNNECESSARY]),
                data: data.clone(),
                ..Default::default()
            });
        }
    }

    diagnostics
}

/// Edit deleting every occurrence of `class`, or `None` if it cannot be
/// deleted cleanly.
fn removal_edit(uri: &Url, text: &str, class: &str) -> Option<WorkspaceEdit> {
    let spans = find_bounds_with_context(class, text);
    if spans.is_empty() {
        return None;
    }
    let lines: Vec<&str> = text.split('\n').collect();
    let edits = spans
        .iter()
        .map(|span| TextEdit::new(to_range(&lines, span), String::new()))
        .collect();

    Some(WorkspaceEdit {
        changes: Some(HashMap::from([(uri.clone(), edits)])),
        ..Default::default()
    })
}

/// Class named by one of our diagnostics.
fn diagnostic_class(diagnostic: &Diagnostic) -> Option<String> {
    if diagnostic.code != Some(NumberOrString::String(DIAGNOSTIC_CODE.to_string())) {
        return None;
    }
    let data: UnusedClassData = serde_json::from_value(diagnostic.data.clone()?).ok()?;
    Some(data.class)
}

/// Reference URLs configured across all roots, first occurrence kept.
fn configured_urls(roots: &[PathBuf]) -> Result<Vec<String>> {
    let mut urls: Vec<String> = Vec::new();
    for root in roots {
        if let Some(config) = load_config(root)? {
            for url in config.library_urls() {
                if !urls.contains(url) {
                    urls.push(url.clone());
                }
            }
        }
    }
    Ok(urls)
}

/// Corpus for `roots`: the stored one if still current, otherwise fetched and
/// stored under the first root. Returns the snapshot and the skipped URLs.
fn load_corpus(roots: &[PathBuf], force: bool) -> Result<(ReferenceCorpus, Vec<String>)> {
    let Some(primary) = roots.first() else {
        return Ok((ReferenceCorpus::from(Vec::new()), Vec::new()));
    };
    let urls = configured_urls(roots)?;
    let mut state = load_state_or_default(primary);

    if !force && !state.corpus.is_stale(&urls) {
        return Ok((state.corpus_snapshot(), Vec::new()));
    }

    let fetcher = HttpFetcher::new()?;
    let refresh = refresh_corpus(&urls, &fetcher);
    let failures = refresh.failures.iter().map(|e| e.to_string()).collect();

    state.corpus = refresh.state;
    save_state(primary, &state)?;
    Ok((state.corpus_snapshot(), failures))
}

/// classcheck Language Server state.
struct ClassCheckLsp {
    client: Client,
    /// Workspace folders, in the order the client sent them.
    roots: Arc<RwLock<Vec<PathBuf>>>,
    /// Latest text of open documents.
    documents: Arc<RwLock<HashMap<Url, String>>>,
    /// Current corpus snapshot, replaced as a whole on refresh.
    corpus: Arc<RwLock<ReferenceCorpus>>,
}

impl ClassCheckLsp {
    fn new(client: Client) -> Self {
        Self {
            client,
            roots: Arc::new(RwLock::new(Vec::new())),
            documents: Arc::new(RwLock::new(HashMap::new())),
            corpus: Arc::new(RwLock::new(ReferenceCorpus::from(Vec::new()))),
        }
    }

    /// Check one document and publish its diagnostics.
    async fn check_document(&self, uri: Url) {
        let path = match uri.to_file_path() {
            Ok(p) => p,
            Err(_) => {
                self.log_error("Invalid file URI").await;
                return;
            }
        };
        if !is_html(&path) {
            return;
        }

        let text = self.documents.read().await.get(&uri).cloned();
        let roots = self.roots.read().await.clone();
        let corpus = self.corpus.read().await.clone();

        let task = tokio::task::spawn_blocking(move || run_check(&path, text, roots, corpus));
        match task.await {
            Ok(Ok(Some((text, unused)))) => {
                let diagnostics = unused_diagnostics(&text, &unused);
                self.log_info(&format!(
                    "{}: {} unused classes",
                    uri.path(),
                    unused.len()
                ))
                .await;
                self.client.publish_diagnostics(uri, diagnostics, None).await;
            }
            Ok(Ok(None)) => {
                self.log_info(&format!("{} is not in the workspace, skipping", uri.path()))
                    .await;
            }
            Ok(Err(e)) => self.log_failure("Check failed", &e).await,
            Err(e) => self.log_error(&format!("Check task failed: {}", e)).await,
        }
    }

    /// Rebuild the corpus and recheck open documents.
    async fn reload_corpus(&self, force: bool) {
        let roots = self.roots.read().await.clone();
        match tokio::task::spawn_blocking(move || load_corpus(&roots, force)).await {
            Ok(Ok((snapshot, failures))) => {
                for failure in &failures {
                    self.client.log_message(MessageType::WARNING, failure).await;
                }
                let blobs = snapshot.len();
                *self.corpus.write().await = snapshot;
                self.log_info(&format!("Reference corpus ready ({} sources)", blobs))
                    .await;
            }
            Ok(Err(e)) => self.log_failure("Corpus refresh failed", &e).await,
            Err(e) => self.log_error(&format!("Corpus task failed: {}", e)).await,
        }

        let open: Vec<Url> = self.documents.read().await.keys().cloned().collect();
        for uri in open {
            self.check_document(uri).await;
        }
    }

    async fn log_info(&self, message: &str) {
        tracing::info!(detail = %message);
        self.client.log_message(MessageType::INFO, message).await;
    }

    async fn log_error(&self, message: &str) {
        tracing::error!(detail = %message);
        self.client.log_message(MessageType::ERROR, message).await;
    }

    /// Report a failed check or refresh at the severity its cause deserves.
    async fn log_failure(&self, context: &str, err: &anyhow::Error) {
        let message = format!("{}: {:#}", context, err);
        let kind = failure_message_type(err);
        if kind == MessageType::WARNING {
            tracing::warn!(detail = %message);
        } else {
            tracing::error!(detail = %message);
        }
        self.client.log_message(kind, message).await;
    }
}

/// Fetch and state failures only degrade the corpus or the remembered scope,
/// so they are warnings. Everything else is an error.
fn failure_message_type(err: &anyhow::Error) -> MessageType {
    let typed = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<ClassCheckError>());
    match typed {
        Some(e) if !e.aborts_check() => MessageType::WARNING,
        _ => MessageType::ERROR,
    }
}

/// Run a check with the remembered default scope, or the whole project.
///
/// Returns `None` when the file is outside every root.
fn run_check(
    path: &Path,
    text: Option<String>,
    roots: Vec<PathBuf>,
    corpus: ReferenceCorpus,
) -> Result<Option<(String, Vec<String>)>> {
    let text = match text {
        Some(t) => t,
        None => std::fs::read_to_string(path)?,
    };
    let normalized = normalize_path(path);
    let Some(root) = roots
        .iter()
        .find(|r| normalized.starts_with(normalize_path(r)))
    else {
        return Ok(None);
    };
    let state = load_state_or_default(root);
    let config = load_config(root)?.unwrap_or_default();

    let outcome = ClassCheck::new(path)
        .project_roots(roots.iter())
        .html_text(text.clone())
        .default_index(state.default_scope)
        .corpus(corpus)
        .scan_options(config.scan_options())
        .run();

    match outcome {
        Ok(outcome) => Ok(Some((text, outcome.report.unused))),
        Err(e) if matches!(
            e.downcast_ref::<ClassCheckError>(),
            Some(ClassCheckError::ScopeResolution { .. })
        ) =>
        {
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for ClassCheckLsp {
    async fn initialize(&self, params: InitializeParams) -> LspResult<InitializeResult> {
        let mut roots: Vec<PathBuf> = params
            .workspace_folders
            .unwrap_or_default()
            .iter()
            .filter_map(|f| f.uri.to_file_path().ok())
            .collect();
        #[allow(deprecated)]
        let root_uri = params.root_uri;
        if roots.is_empty() {
            if let Some(path) = root_uri.and_then(|u| u.to_file_path().ok()) {
                roots.push(path);
            }
        }
        *self.roots.write().await = roots;

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Options(
                    TextDocumentSyncOptions {
                        open_close: Some(true),
                        change: Some(TextDocumentSyncKind::FULL),
                        save: Some(TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
                            include_text: Some(false),
                        })),
                        ..Default::default()
                    },
                )),
                code_action_provider: Some(CodeActionProviderCapability::Simple(true)),
                ..ServerCapabilities::default()
            },
            server_info: Some(ServerInfo {
                name: "classcheck-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.log_info("classcheck LSP server initialized").await;
        self.reload_corpus(false).await;
    }

    async fn shutdown(&self) -> LspResult<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        self.documents
            .write()
            .await
            .insert(uri.clone(), params.text_document.text);
        self.check_document(uri).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        // Full sync: the last change holds the whole document
        if let Some(change) = params.content_changes.into_iter().last() {
            self.documents
                .write()
                .await
                .insert(params.text_document.uri, change.text);
        }
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        self.check_document(params.text_document.uri).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        self.documents.write().await.remove(&uri);
        self.client.publish_diagnostics(uri, vec![], None).await;
    }

    async fn did_change_configuration(&self, _: DidChangeConfigurationParams) {
        self.reload_corpus(true).await;
    }

    async fn code_action(&self, params: CodeActionParams) -> LspResult<Option<CodeActionResponse>> {
        let uri = params.text_document.uri;
        let Some(text) = self.documents.read().await.get(&uri).cloned() else {
            return Ok(None);
        };

        let mut actions: CodeActionResponse = Vec::new();
        let mut seen: Vec<String> = Vec::new();
        for diagnostic in &params.context.diagnostics {
            let Some(class) = diagnostic_class(diagnostic) else {
                continue;
            };
            if seen.contains(&class) {
                continue;
            }
            if let Some(edit) = removal_edit(&uri, &text, &class) {
                actions.push(CodeActionOrCommand::CodeAction(CodeAction {
                    title: format!("Remove unused class `{}`", class),
                    kind: Some(CodeActionKind::QUICKFIX),
                    diagnostics: Some(vec![diagnostic.clone()]),
                    edit: Some(edit),
                    ..Default::default()
                }));
            }
            seen.push(class);
        }

        Ok(Some(actions))
    }
}

#[tokio::main]
async fn main() {
    // Set up panic hook for graceful error handling
    std::panic::set_hook(Box::new(|info| {
        eprintln!("[PANIC] classcheck-lsp internal error: {}", info);
    }));

    // stdout carries the protocol, logs go to stderr
    init_structured_logging();

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(ClassCheckLsp::new);
    Server::new(stdin, stdout, socket).serve(service).await;
}
