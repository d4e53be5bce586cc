//! classcheck CLI - finds CSS classes declared in an HTML file that nothing uses.
//!
//! Features:
//! - Interactive scope prompt with a remembered default per project
//! - Third-party reference corpus fetched from configured URLs
//! - Occurrence spans for editors and scripts
//! - Step-by-step review loop and bulk removal of unused classes

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

use classcheck_core::{
    find_bounds, find_bounds_with_context, find_project_root, init_structured_logging, list_scopes,
    load_config, load_state_or_default, normalize_path, print_json, print_plain, print_spans,
    refresh_corpus, remove_spans, remove_unused_classes, save_state, scope_options,
    write_document, ClassCheck, ClassCheckConfig, HttpFetcher, ReferenceCorpus, ReviewEvent,
    ReviewSession, ScopeOption, ScopeSelection, SessionState,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Find unused CSS classes in an HTML file")]
pub struct Cli {
    /// HTML file to check
    file: PathBuf,

    /// Project root (repeatable); defaults to the current directory
    #[arg(long = "root", value_name = "DIR")]
    roots: Vec<PathBuf>,

    /// Scope to search, by label or index (skips the prompt)
    #[arg(long, value_name = "LABEL|INDEX")]
    scope: Option<String>,

    /// Search the remembered default scope (skips the prompt)
    #[arg(long, conflicts_with = "scope")]
    use_default: bool,

    /// List the available scopes and exit
    #[arg(long)]
    list_scopes: bool,

    /// Output results in JSON format
    #[arg(long)]
    json: bool,

    /// Do not search the third-party reference corpus
    #[arg(long)]
    no_corpus: bool,

    /// Fetch the reference corpus again even if it is up to date
    #[arg(long, conflicts_with = "no_corpus")]
    reload_corpus: bool,

    /// Forget the remembered default scope
    #[arg(long)]
    reset_default: bool,

    /// Print the occurrence spans of one class and exit
    #[arg(long, value_name = "TOKEN")]
    locate: Option<String>,

    /// With --locate, print the spans that would be deleted
    #[arg(long, requires = "locate")]
    with_context: bool,

    /// Step through unused classes and delete them one by one
    #[arg(long)]
    review: bool,

    /// Remove every unused class from the file
    #[arg(long, conflicts_with = "review")]
    fix: bool,

    /// Show what --fix would remove without writing the file
    #[arg(long, conflicts_with_all = ["fix", "review"])]
    fix_dry_run: bool,
}

/// Make `path` absolute against the current directory, with `.` and `..`
/// collapsed.
fn absolute(path: &Path) -> Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .context("Failed to read current directory")?
            .join(path)
    };
    Ok(normalize_path(&joined))
}

/// `--scope` value: a number is an index, anything else a label.
fn parse_scope_arg(value: &str) -> ScopeSelection {
    match value.trim().parse::<usize>() {
        Ok(index) => ScopeSelection::Index(index),
        Err(_) => ScopeSelection::Label(value.trim().to_string()),
    }
}

/// Ask the user to pick one of `options`.
///
/// Accepts a 1-based number or a label; an empty answer picks the first
/// entry (the remembered default when there is one).
fn prompt_scope<R: BufRead, W: Write>(
    options: &[ScopeOption],
    input: &mut R,
    out: &mut W,
) -> Result<ScopeSelection> {
    writeln!(out, "Pick a directory to search:")?;
    for (n, option) in options.iter().enumerate() {
        writeln!(out, "  {}) {}", n + 1, option.label)?;
    }
    write!(out, "> ")?;
    out.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    let answer = answer.trim();

    if answer.is_empty() {
        return options
            .first()
            .map(|o| o.selection.clone())
            .context("No scopes to choose from");
    }
    if let Ok(n) = answer.parse::<usize>() {
        return options
            .get(n.wrapping_sub(1))
            .map(|o| o.selection.clone())
            .with_context(|| format!("No scope numbered {}", n));
    }
    Ok(ScopeSelection::Label(answer.to_string()))
}

/// Refresh the stored corpus if the configured URLs changed or a reload was
/// asked for. Fetch failures never abort the check.
fn update_corpus(state: &mut SessionState, config: &ClassCheckConfig, force: bool) {
    let urls = config.library_urls();
    if !force && !state.corpus.is_stale(urls) {
        return;
    }
    if urls.is_empty() {
        state.corpus = refresh_corpus(urls, &NoFetch).state;
        return;
    }

    let fetcher = match HttpFetcher::new() {
        Ok(f) => f,
        Err(e) => {
            warn!(error = %e, "reference corpus unavailable");
            return;
        }
    };
    eprintln!("Loading {} third-party libraries...", urls.len());
    let refresh = refresh_corpus(urls, &fetcher);
    for failure in &refresh.failures {
        eprintln!("WARN: {}", failure);
    }
    state.corpus = refresh.state;
}

/// Fetcher for an empty URL list.
struct NoFetch;

impl classcheck_core::CorpusFetcher for NoFetch {
    fn fetch_text(&self, url: &str) -> classcheck_core::ClassCheckResult<String> {
        Err(classcheck_core::ClassCheckError::fetch(url, "fetching disabled"))
    }
}

/// Outcome of the interactive review.
#[derive(Debug, Default, PartialEq, Eq)]
struct ReviewOutcome {
    text: String,
    deleted: Vec<String>,
}

/// Walk the unused classes, deleting the ones the user asks for.
fn review_loop<R: BufRead, W: Write>(
    classes: Vec<String>,
    text: String,
    input: &mut R,
    out: &mut W,
) -> Result<ReviewOutcome> {
    let mut session = ReviewSession::new(classes);
    let mut outcome = ReviewOutcome {
        text,
        deleted: Vec::new(),
    };

    while let Some(item) = session.current_item(&outcome.text) {
        let lines: Vec<String> = item
            .bounds
            .iter()
            .map(|s| (s.start.line + 1).to_string())
            .collect();
        writeln!(
            out,
            "[{}/{}] {} (line {})",
            item.index + 1,
            item.total,
            item.class,
            if lines.is_empty() { "-".to_string() } else { lines.join(", ") }
        )?;
        let next_label = if item.is_last { "done" } else { "next" };
        write!(out, "  (n) {}  (d) delete  (q) quit > ", next_label)?;
        out.flush()?;

        let mut answer = String::new();
        if input.read_line(&mut answer)? == 0 {
            session.handle(ReviewEvent::Close)?;
            break;
        }

        match answer.trim() {
            "d" | "delete" => {
                if item.deletion.is_empty() {
                    writeln!(out, "  {} cannot be deleted automatically", item.class)?;
                    session.handle(ReviewEvent::Next)?;
                    continue;
                }
                session.handle(ReviewEvent::Delete)?;
                let (updated, _) = remove_spans(&outcome.text, &item.deletion);
                outcome.text = updated;
                outcome.deleted.push(item.class);
                session.handle(ReviewEvent::Applied)?;
            }
            "q" | "quit" => {
                session.handle(ReviewEvent::Close)?;
            }
            _ => {
                session.handle(ReviewEvent::Next)?;
            }
        }
    }

    Ok(outcome)
}

fn run(cli: &Cli) -> Result<i32> {
    let file = absolute(&cli.file)?;

    // Span lookup only needs the document
    if let Some(token) = &cli.locate {
        let text = fs::read_to_string(&file)
            .with_context(|| format!("Failed to read: {}", file.display()))?;
        let spans = if cli.with_context {
            find_bounds_with_context(token, &text)
        } else {
            find_bounds(token, &text)
        };
        print_spans(token, &spans, cli.json);
        return Ok(0);
    }

    let roots = if cli.roots.is_empty() {
        vec![absolute(Path::new("."))?]
    } else {
        cli.roots
            .iter()
            .map(|r| absolute(r))
            .collect::<Result<Vec<_>>>()?
    };
    let project_root = find_project_root(&file, &roots)?.to_path_buf();

    let config = load_config(&project_root)?.unwrap_or_default();
    let json_output = cli.json || config.wants_json();

    let mut state = load_state_or_default(&project_root);
    if cli.reset_default {
        state.clear_default();
        eprintln!("Default scope cleared.");
    }

    if cli.list_scopes {
        let scopes = list_scopes(&file, &project_root)?;
        if json_output {
            let listing: Vec<_> = scopes
                .iter()
                .map(|s| {
                    serde_json::json!({
                        "index": s.index,
                        "label": s.label,
                        "path": s.path.display().to_string(),
                        "default": state.default_scope == Some(s.index),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&listing)?);
        } else {
            for option in scope_options(&scopes, state.default_scope) {
                println!("{}", option.label);
            }
        }
        if cli.reset_default {
            save_state(&project_root, &state)?;
        }
        return Ok(0);
    }

    let corpus: ReferenceCorpus = if cli.no_corpus {
        ReferenceCorpus::from(Vec::new())
    } else {
        update_corpus(&mut state, &config, cli.reload_corpus);
        state.corpus_snapshot()
    };

    let selection = if let Some(value) = &cli.scope {
        Some(parse_scope_arg(value))
    } else if cli.use_default {
        Some(ScopeSelection::Default)
    } else if io::stdin().is_terminal() {
        let scopes = list_scopes(&file, &project_root)?;
        let options = scope_options(&scopes, state.default_scope);
        let stdin = io::stdin();
        Some(prompt_scope(&options, &mut stdin.lock(), &mut io::stderr())?)
    } else {
        // Non-interactive: remembered default, else the whole project
        None
    };

    let mut check = ClassCheck::new(&file)
        .project_roots([&project_root])
        .default_index(state.default_scope)
        .corpus(corpus)
        .scan_options(config.scan_options());
    if let Some(selection) = selection {
        check = check.scope(selection);
    }
    let outcome = check.run()?;

    state.set_default(outcome.scope.default_index);
    if let Err(e) = save_state(&project_root, &state) {
        warn!(error = %e, "session state not saved");
    }

    let report = &outcome.report;
    if json_output {
        print_json(report, &outcome.scope);
    } else {
        eprintln!("Searched {} ({} files)", outcome.scope.label, report.files_scanned);
        print_plain(report);
    }

    if report.is_clean() {
        return Ok(0);
    }

    if cli.review {
        let text = fs::read_to_string(&file)
            .with_context(|| format!("Failed to read: {}", file.display()))?;
        let stdin = io::stdin();
        let reviewed = review_loop(
            report.unused.clone(),
            text.clone(),
            &mut stdin.lock(),
            &mut io::stderr(),
        )?;
        if reviewed.text != text {
            write_document(&file, &reviewed.text)?;
        }
        eprintln!("Deleted {} of {} unused classes.", reviewed.deleted.len(), report.unused.len());
    } else if cli.fix || cli.fix_dry_run {
        let result = remove_unused_classes(&file, &report.unused, cli.fix_dry_run)?;
        if json_output {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            let verb = if cli.fix_dry_run { "Would remove" } else { "Removed" };
            eprintln!("{} {} classes ({} occurrences).", verb, result.removed.len(), result.spans_removed);
            for class in &result.not_removable {
                eprintln!("WARN: {} could not be removed automatically", class);
            }
        }
    }

    Ok(1)
}

fn main() {
    // Global panic guard
    std::panic::set_hook(Box::new(|info| {
        eprintln!("[PANIC] classcheck internal error: {}", info);
        eprintln!("[PANIC] The process will exit safely with code 2.");
    }));

    // Initialize structured logging (JSON to stderr, respects RUST_LOG)
    init_structured_logging();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("ERROR: {:#}", e);
            std::process::exit(2);
        }
    }
}
