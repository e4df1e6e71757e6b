//! CLI definition and command dispatch for qmatch.
//!
//! This module defines the command-line interface using `clap` and provides
//! the `run()` function that dispatches commands to the match engine.
//!
//! ## Configuration Precedence
//!
//! Configuration is resolved with the following precedence (highest to lowest):
//! 1. CLI flags (`--config`, `--corpus`, `--seed`, `--verbose`)
//! 2. Environment variables (`QMATCH_CONFIG`, `QMATCH_CORPUS`, `QMATCH_SEED`, ...)
//! 3. Config file (`~/.qmatch/config.yaml` or path from `--config`/`QMATCH_CONFIG`)
//! 4. Built-in defaults

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::json;

use qmatch_core::constants::BUILTIN_PACK_NAME;
use qmatch_core::normalize::Normalizer;
use qmatch_core::stages::fallback::FallbackGenerator;
use qmatch_core::stages::intent::IntentMatcher;
use qmatch_core::{
    BrowseFilter, Conversation, Corpus, GlobalConfig, KnowledgePack, MatchEngine, QmatchError,
};

use crate::ui::table::{self, CountRow};
use crate::ui::{color, format, ColorMode, MessageType, Style};

// ============================================================================
// CLI Definition
// ============================================================================

/// Version string including git commit hash
const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")");

/// Number of suggestions shown when a chat session opens.
const CHAT_SUGGESTIONS: usize = 4;

/// Query matcher – answers free-text questions from a FAQ knowledge pack
#[derive(Parser, Debug)]
#[command(name = "qmatch")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true, env = "QMATCH_VERBOSE")]
    pub verbose: bool,

    /// Suppress informational messages
    #[arg(short, long, global = true, env = "QMATCH_QUIET")]
    pub quiet: bool,

    /// Path to configuration file (default: ~/.qmatch/config.yaml)
    #[arg(long, global = true, env = "QMATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Knowledge pack to answer from (.json, .yaml or .yml)
    #[arg(long, global = true, env = "QMATCH_CORPUS")]
    pub corpus: Option<PathBuf>,

    /// Seed for greeting and fallback selection (reproducible output)
    #[arg(long, global = true, env = "QMATCH_SEED")]
    pub seed: Option<u64>,

    /// Color output mode
    #[arg(long, global = true, env = "QMATCH_COLOR", value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Answer a single question
    #[command(after_help = r#"EXAMPLES:
    # Ask a question (quotes are optional)
    qmatch ask "What are your technical skills?"
    qmatch ask tel me about ur aws experiance

    # Show which stage answered and why
    qmatch ask --explain "top 3 qualities"

    # Full match outcome as JSON
    qmatch ask --json "what is your current company"
"#)]
    Ask {
        /// The question to answer
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Output the match outcome in JSON format
        #[arg(long)]
        json: bool,

        /// Show the normalized query, the answering stage and the matched entry
        #[arg(long, conflicts_with = "json")]
        explain: bool,
    },

    /// Start an interactive chat session over stdin
    #[command(after_help = r#"EXAMPLES:
    # Chat until EOF (Ctrl-D) or `exit`
    qmatch chat

    # Save the conversation as JSON lines
    qmatch chat --transcript ./chat.jsonl

    # Scripted session with reproducible greetings
    printf 'who are you\nquit\n' | qmatch chat --seed 7
"#)]
    Chat {
        /// Write the conversation to this file as JSON lines on exit
        #[arg(long, value_name = "FILE")]
        transcript: Option<PathBuf>,
    },

    /// Print one greeting
    Greet,

    /// List example questions
    #[command(after_help = r#"EXAMPLES:
    qmatch suggestions
    qmatch suggestions --json
"#)]
    Suggestions {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show how a query is corrected and expanded before matching
    #[command(after_help = r#"EXAMPLES:
    qmatch normalize "Tel me about UR aws experiance"
    qmatch normalize --json "what is your background"
"#)]
    Normalize {
        /// The query to normalize
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List the corpus grouped by category
    #[command(after_help = r#"EXAMPLES:
    # Everything, grouped by category
    qmatch browse

    # Entries whose question or answer mentions "aws"
    qmatch browse --search aws

    # One category as JSON
    qmatch browse --category skills --json
"#)]
    Browse {
        /// Case-insensitive text to look for in questions and answers
        #[arg(long, value_name = "TEXT")]
        search: Option<String>,

        /// Only show this category
        #[arg(long, value_name = "CATEGORY")]
        category: Option<String>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Inspect and validate knowledge packs
    #[command(after_help = r#"EXAMPLES:
    # Validate the configured (or built-in) pack
    qmatch corpus check

    # Validate a specific file
    qmatch corpus check ./faq.yaml

    # Table of entries
    qmatch corpus show
"#)]
    Corpus {
        #[command(subcommand)]
        action: CorpusAction,
    },

    /// Manage qmatch configuration (validate, show resolved config)
    #[command(after_help = r#"EXAMPLES:
    # Validate configuration
    qmatch config check

    # Show resolved configuration (all sources merged)
    qmatch config show

    # Output as JSON
    qmatch config show --json
"#)]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Corpus subcommands
#[derive(Subcommand, Debug)]
pub enum CorpusAction {
    /// Validate a knowledge pack and report counts and warnings
    Check {
        /// Pack to check (default: --corpus, then config, then built-in)
        path: Option<PathBuf>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show the entries of the active knowledge pack
    Show {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors/warnings
    Check {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show resolved configuration (file merged with flags and environment)
    Show {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

// ============================================================================
// Session
// ============================================================================

/// Global options shared by every command handler.
struct Session {
    style: Style,
    quiet: bool,
    config_path: Option<PathBuf>,
    corpus: Option<PathBuf>,
    seed: Option<u64>,
}

impl Session {
    fn from_cli(cli: &Cli) -> Self {
        Self {
            style: Style::new(cli.color),
            quiet: cli.quiet,
            config_path: cli.config.clone(),
            corpus: cli.corpus.clone(),
            seed: cli.seed,
        }
    }

    /// Config file in effect, whether or not it exists.
    fn config_path(&self) -> Option<PathBuf> {
        self.config_path.clone().or_else(GlobalConfig::default_path)
    }

    /// Load the config file and apply `--corpus` / `--seed` on top.
    fn load_config(&self) -> Result<GlobalConfig, QmatchError> {
        let mut config = match &self.config_path {
            Some(path) => GlobalConfig::from_path(path)?,
            None => GlobalConfig::load_default()?,
        };

        if let Some(corpus) = &self.corpus {
            config.corpus = Some(corpus.clone());
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }

        Ok(config)
    }

    fn engine(&self) -> Result<MatchEngine, QmatchError> {
        let config = self.load_config()?;
        Ok(MatchEngine::from_global_config(config)?)
    }

    /// Print an informational line unless `--quiet`.
    fn info(&self, text: &str) {
        if !self.quiet {
            println!("{}", self.style.message(MessageType::Info, text));
        }
    }
}

// ============================================================================
// Run function
// ============================================================================

/// Run the CLI application.
///
/// Parses command-line arguments, installs logging and dispatches to the
/// appropriate command handler.
///
/// # Returns
///
/// Returns `ExitCode::SUCCESS` on success, or `ExitCode::FAILURE` on error.
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    // Warnings always show (config issues, duplicate categories);
    // --verbose adds per-stage decisions, --quiet keeps only errors.
    let log_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    let filter = format!("qmatch_core={},qmatch_cli={}", log_level, log_level);

    tracing_subscriber::fmt()
        .with_env_filter(&filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let session = Session::from_cli(&cli);

    let result = match cli.command {
        Command::Ask {
            query,
            json,
            explain,
        } => handle_ask(&session, &query.join(" "), json, explain),
        Command::Chat { transcript } => handle_chat(&session, transcript.as_deref()),
        Command::Greet => handle_greet(&session),
        Command::Suggestions { json } => handle_suggestions(&session, json),
        Command::Normalize { query, json } => handle_normalize(&session, &query.join(" "), json),
        Command::Browse {
            search,
            category,
            json,
        } => handle_browse(&session, BrowseFilter { search, category }, json),
        Command::Corpus { action } => match action {
            CorpusAction::Check { path, json } => handle_corpus_check(&session, path, json),
            CorpusAction::Show { json } => handle_corpus_show(&session, json),
        },
        Command::Config { action } => match action {
            ConfigAction::Check { json } => handle_config_check(&session, json),
            ConfigAction::Show { json } => handle_config_show(&session, json),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", report_error(&session.style, &e));
            ExitCode::FAILURE
        }
    }
}

/// Render an error with its cause chain and any hint it carries.
fn report_error(style: &Style, err: &QmatchError) -> String {
    match err {
        QmatchError::InvalidConfiguration { message, hint } => {
            style.error_with_context(message, None, Some(hint))
        }
        QmatchError::Other(inner) => {
            let cause = inner
                .chain()
                .skip(1)
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(": ");
            let hint = inner
                .chain()
                .find_map(|e| e.downcast_ref::<QmatchError>())
                .and_then(|e| match e {
                    QmatchError::InvalidConfiguration { hint, .. } => Some(hint.as_str()),
                    _ => None,
                });
            style.error_with_context(
                &inner.to_string(),
                (!cause.is_empty()).then_some(cause.as_str()),
                hint,
            )
        }
        other => style.message(MessageType::Err, &other.to_string()),
    }
}

/// Print answer text, word-wrapped when stdout is a terminal.
fn print_answer(text: &str, indent: &str) {
    if io::stdout().is_terminal() {
        println!("{}", format::wrap_text(text, color::terminal_width(), indent));
    } else {
        println!("{}{}", indent, text);
    }
}

// ============================================================================
// Command handlers
// ============================================================================

fn handle_ask(session: &Session, query: &str, json: bool, explain: bool) -> Result<(), QmatchError> {
    let engine = session.engine()?;
    let outcome = engine.find_match(query);

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    if !explain {
        print_answer(&outcome.answer, "");
        return Ok(());
    }

    let style = &session.style;
    println!("{}", style.section("MATCH"));
    println!();
    println!("  {}", style.key_value("Query", &outcome.query));
    println!("  {}", style.key_value("Normalized", &outcome.normalized.expanded));
    if !outcome.normalized.expansions.is_empty() {
        println!(
            "  {}",
            style.key_value("Expansions", &outcome.normalized.expansions.join(", "))
        );
    }
    println!("  {}", style.key_value("Stage", &style.stage(outcome.stage)));
    if let Some(id) = outcome.entry_id {
        let category = outcome.category.as_deref().unwrap_or("-");
        println!(
            "  {}",
            style.key_value("Entry", &format!("#{} ({})", id, style.category(category)))
        );
    }
    if outcome.score.is_some() {
        println!("  {}", style.key_value("Score", &format::format_score(outcome.score)));
    }
    if let Some(detail) = &outcome.detail {
        println!("  {}", style.key_value("Detail", detail));
    }
    println!();
    println!("{}", style.section("ANSWER"));
    println!();
    print_answer(&outcome.answer, "  ");

    Ok(())
}

fn handle_chat(session: &Session, transcript: Option<&Path>) -> Result<(), QmatchError> {
    let engine = session.engine()?;
    let style = &session.style;
    let mut conversation = Conversation::open(&engine);

    if let Some(greeting) = conversation.messages().first() {
        println!("{} {}", style.speaker(false), greeting.text);
    }

    let suggestions = engine.suggestions();
    if !session.quiet && !suggestions.is_empty() {
        println!("{}", style.message(MessageType::Hint, "Try asking:"));
        for suggestion in suggestions.iter().take(CHAT_SUGGESTIONS) {
            println!("{}", style.list_item("-", suggestion));
        }
    }

    let stdin = io::stdin();
    let interactive = stdin.is_terminal();
    let mut input = stdin.lock();
    let mut buf = Vec::new();
    let mut read_error = None;

    loop {
        if interactive {
            print!("{} ", style.speaker(true));
            io::stdout().flush()?;
        }

        // invalid UTF-8 is replaced, not fatal
        buf.clear();
        match input.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                read_error = Some(e);
                break;
            }
        }

        let line = String::from_utf8_lossy(&buf);
        let text = line.trim();
        if text.eq_ignore_ascii_case("exit") || text.eq_ignore_ascii_case("quit") {
            break;
        }

        if let Some(reply) = conversation.ask(&engine, text) {
            println!("{} {}", style.speaker(false), reply.text);
        }
    }

    tracing::debug!("Chat ended after {} messages", conversation.len());

    if let Some(path) = transcript {
        conversation.write_jsonl(path)?;
        if !session.quiet {
            println!(
                "{}",
                style.message(
                    MessageType::Ok,
                    &format!(
                        "Saved {} messages to {}",
                        conversation.len(),
                        style.file_path(&path.display().to_string())
                    )
                )
            );
        }
    }

    match read_error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

fn handle_greet(session: &Session) -> Result<(), QmatchError> {
    let engine = session.engine()?;
    println!("{}", engine.greeting());
    Ok(())
}

fn handle_suggestions(session: &Session, json: bool) -> Result<(), QmatchError> {
    let engine = session.engine()?;
    let suggestions = engine.suggestions();

    if json {
        println!("{}", serde_json::to_string_pretty(suggestions)?);
    } else if suggestions.is_empty() {
        session.info("This knowledge pack has no suggestions.");
    } else {
        for (i, suggestion) in suggestions.iter().enumerate() {
            println!("  {}. {}", i + 1, suggestion);
        }
    }

    Ok(())
}

fn handle_normalize(session: &Session, query: &str, json: bool) -> Result<(), QmatchError> {
    let engine = session.engine()?;
    let normalized = engine.normalize_query(query);

    if json {
        println!("{}", serde_json::to_string_pretty(&normalized)?);
        return Ok(());
    }

    let style = &session.style;
    let expansions = if normalized.expansions.is_empty() {
        "-".to_string()
    } else {
        normalized.expansions.join(", ")
    };
    println!("{}", style.key_value("Original", &normalized.original));
    println!("{}", style.key_value("Corrected", &normalized.corrected));
    println!("{}", style.key_value("Expanded", &normalized.expanded));
    println!("{}", style.key_value("Expansions", &expansions));

    Ok(())
}

fn handle_browse(session: &Session, filter: BrowseFilter, json: bool) -> Result<(), QmatchError> {
    let engine = session.engine()?;
    let groups = engine.browse(&filter);

    if json {
        println!("{}", serde_json::to_string_pretty(&groups)?);
        return Ok(());
    }

    if groups.is_empty() {
        session.info("No entries match.");
        return Ok(());
    }

    let style = &session.style;
    for group in &groups {
        println!("{}", style.section(&style.category(&group.category)));
        for entry in &group.entries {
            println!("{}", style.list_item("-", &entry.question));
            print_answer(&entry.answer, "    ");
        }
        println!();
    }

    let shown: usize = groups.iter().map(|g| g.entries.len()).sum();
    session.info(&format!(
        "{} entries in {} categories",
        shown,
        groups.len()
    ));

    Ok(())
}

/// Compile every stage of `pack` without building an engine.
///
/// Returns the validation warnings; the first hard problem is the error.
fn check_pack(pack: &KnowledgePack) -> Result<Vec<String>, QmatchError> {
    let warnings = pack.validate()?;
    Normalizer::new(&pack.corrections, &pack.synonyms)?;
    IntentMatcher::new(&pack.intents)?;
    FallbackGenerator::new(&pack.fallback)?;
    Ok(warnings)
}

fn handle_corpus_check(session: &Session, path: Option<PathBuf>, json: bool) -> Result<(), QmatchError> {
    let style = &session.style;
    let source = match path {
        Some(path) => Some(path),
        None => session
            .load_config()?
            .corpus
            .filter(|p| !p.as_os_str().is_empty()),
    };

    let label = source
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| BUILTIN_PACK_NAME.to_string());
    let pack = match &source {
        Some(path) => KnowledgePack::from_path(path)?,
        None => KnowledgePack::builtin()?,
    };

    let (warnings, errors) = match check_pack(&pack) {
        Ok(warnings) => (warnings, Vec::new()),
        Err(e) => (Vec::new(), vec![e.to_string()]),
    };

    let counts = [
        CountRow::new("ENTRIES", pack.qna.len()),
        CountRow::new("CATEGORIES", Corpus::from_pack(&pack).categories().len()),
        CountRow::new("INTENTS", pack.intents.len()),
        CountRow::new("RULES", pack.rules.len()),
        CountRow::new("CORRECTIONS", pack.corrections.len()),
        CountRow::new("SYNONYMS", pack.synonyms.len()),
        CountRow::new("SUGGESTIONS", pack.suggestions.len()),
        CountRow::new("GREETINGS", pack.greetings.len()),
        CountRow::new("TOPICS", pack.fallback.topics.len()),
    ];

    if json {
        let counts: serde_json::Map<String, serde_json::Value> = counts
            .iter()
            .map(|row| (row.label.to_lowercase(), json!(row.count)))
            .collect();
        let report = json!({
            "source": label,
            "valid": errors.is_empty(),
            "counts": counts,
            "warnings": warnings,
            "errors": errors,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "{}",
            style.message(
                MessageType::Info,
                &format!("Checked knowledge pack {}", style.file_path(&label))
            )
        );
        println!();
        println!("{}", table::render_pack_summary(&counts));
        println!();

        if !warnings.is_empty() {
            println!(
                "{}",
                style.message(MessageType::Warn, &format!("{} warning(s):", warnings.len()))
            );
            for warning in &warnings {
                println!("  • {}", warning);
            }
            println!();
        }

        if !errors.is_empty() {
            println!(
                "{}",
                style.message(MessageType::Err, &format!("{} error(s):", errors.len()))
            );
            for error in &errors {
                println!("  • {}", error);
            }
            println!();
        }

        if errors.is_empty() && warnings.is_empty() {
            println!("{}", style.message(MessageType::Ok, "Knowledge pack is valid"));
        } else if errors.is_empty() {
            println!(
                "{}",
                style.message(MessageType::Ok, "Knowledge pack is valid with warnings")
            );
        } else {
            println!("{}", style.message(MessageType::Err, "Knowledge pack has errors"));
        }
    }

    if !errors.is_empty() {
        return Err(QmatchError::InvalidPack(format!(
            "{} error(s) found in {}",
            errors.len(),
            label
        )));
    }

    Ok(())
}

fn handle_corpus_show(session: &Session, json: bool) -> Result<(), QmatchError> {
    let engine = session.engine()?;
    let corpus = engine.corpus();

    if json {
        println!("{}", serde_json::to_string_pretty(corpus.entries())?);
        return Ok(());
    }

    println!(
        "{}",
        table::render_entries_table(corpus.entries(), color::terminal_width())
    );
    println!();
    session.info(&format!(
        "{} entries in {} categories",
        corpus.len(),
        corpus.categories().len()
    ));

    Ok(())
}

/// Validate the config file and report errors/warnings.
fn handle_config_check(session: &Session, json: bool) -> Result<(), QmatchError> {
    let style = &session.style;
    let path = session.config_path();
    let exists = path.as_deref().is_some_and(Path::exists);
    let shown_path = path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<no home directory>".to_string());

    let checked = session.load_config().and_then(|config| {
        let warnings = config.validate()?;
        if let Some(corpus) = config.corpus.as_deref().filter(|p| !p.as_os_str().is_empty()) {
            if !corpus.exists() {
                return Err(QmatchError::InvalidConfiguration {
                    message: format!("corpus file {} does not exist", corpus.display()),
                    hint: "Point `corpus` at a .json, .yaml or .yml knowledge pack".to_string(),
                });
            }
        }
        Ok(warnings)
    });

    let (warnings, errors) = match checked {
        Ok(warnings) => (warnings, Vec::new()),
        Err(e) => (Vec::new(), vec![e.to_string()]),
    };

    if json {
        let report = json!({
            "path": shown_path,
            "exists": exists,
            "valid": errors.is_empty(),
            "warnings": warnings,
            "errors": errors,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let status = if exists { "found" } else { "not found, using defaults" };
        println!(
            "{}",
            style.message(
                MessageType::Info,
                &format!("Checked {} ({})", style.file_path(&shown_path), status)
            )
        );
        println!();

        if !warnings.is_empty() {
            println!(
                "{}",
                style.message(MessageType::Warn, &format!("{} warning(s):", warnings.len()))
            );
            for warning in &warnings {
                println!("  • {}", warning);
            }
            println!();
        }

        if !errors.is_empty() {
            println!(
                "{}",
                style.message(MessageType::Err, &format!("{} error(s):", errors.len()))
            );
            for error in &errors {
                println!("  • {}", error);
            }
            println!();
        }

        if errors.is_empty() && warnings.is_empty() {
            println!("{}", style.message(MessageType::Ok, "Configuration is valid"));
        } else if errors.is_empty() {
            println!(
                "{}",
                style.message(MessageType::Ok, "Configuration is valid with warnings")
            );
        } else {
            println!("{}", style.message(MessageType::Err, "Configuration has errors"));
        }
    }

    if !errors.is_empty() {
        return Err(QmatchError::InvalidConfiguration {
            message: format!("{} configuration error(s) found", errors.len()),
            hint: "Run `qmatch config show` to see the resolved values".to_string(),
        });
    }

    Ok(())
}

/// Show resolved configuration (file merged with flags and environment).
fn handle_config_show(session: &Session, json: bool) -> Result<(), QmatchError> {
    let resolved = session.load_config()?;
    let pretty = serde_json::to_string_pretty(&resolved)?;

    if !json {
        println!(
            "{}",
            session.style.message(MessageType::Info, "Resolved configuration:")
        );
        println!();
    }
    println!("{}", pretty);

    Ok(())
}
