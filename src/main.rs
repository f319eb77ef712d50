mod session;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use lectern_core::bootstrap::{self, AppProvider};
use lectern_core::classifier;
use lectern_core::config::{self, Config};
use lectern_core::ingest::{self, Ingestor};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::session::{ChatCommand, HELP, LoadOutcome, Session, parse_command};

#[derive(Parser, Debug)]
#[command(
    name = "lectern",
    version,
    about = "Ask questions about a document and get answers that cite section and page"
)]
struct Cli {
    /// Path to the TOML config file (default: $LECTERN_CONFIG or config/default.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ingest a document and answer one question.
    Ask {
        #[arg(long, short)]
        document: PathBuf,
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },
    /// Interactive question loop over a document.
    Chat {
        #[arg(long, short)]
        document: Option<PathBuf>,
    },
    /// Show how a query would be routed.
    Classify {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
        #[arg(long)]
        json: bool,
    },
    /// Show the pages and chunks a document produces, without embedding it.
    Inspect {
        #[arg(long, short)]
        document: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Verify provider credentials with one short request.
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_subscriber();

    let cli = Cli::parse();
    let config_path = config::resolve_config_path(cli.config.as_deref());
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    config.validate()?;

    match cli.command {
        Command::Ask { document, question } => ask(&config, &document, &question.join(" ")).await,
        Command::Chat { document } => chat(&config, document.as_deref()).await,
        Command::Classify { query, json } => {
            classify(&query.join(" "), json);
            Ok(())
        }
        Command::Inspect { document, json } => inspect(&config, &document, json).await,
        Command::Check => check(&config).await,
    }
}

fn init_subscriber() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_session(config: &Config) -> anyhow::Result<Session<AppProvider>> {
    let provider = bootstrap::build_provider(config)?;
    let index = bootstrap::build_index(config, &provider)?;
    let composer = bootstrap::build_composer(config, index, provider);
    let ingestor = Ingestor::from_config(config)?;
    Ok(Session::new(composer, ingestor))
}

fn report_load(outcome: &LoadOutcome) {
    match outcome {
        LoadOutcome::Ingested(report) => eprintln!("{report}"),
        LoadOutcome::Unchanged(_) => eprintln!("document unchanged, keeping the current index"),
    }
}

async fn ask(config: &Config, document: &Path, question: &str) -> anyhow::Result<()> {
    let mut session = build_session(config)?;
    report_load(&session.load_path(document).await?);
    let answer = session.ask(question).await;
    println!("{}", answer.text);
    Ok(())
}

async fn chat(config: &Config, document: Option<&Path>) -> anyhow::Result<()> {
    let mut session = build_session(config)?;
    if let Some(path) = document {
        report_load(&session.load_path(path).await?);
    }
    eprintln!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        stdout.write_all(b"\nyou> ").await?;
        stdout.flush().await?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };

        match parse_command(&line) {
            ChatCommand::Empty => {}
            ChatCommand::Exit => break,
            ChatCommand::Help => eprintln!("{HELP}"),
            ChatCommand::Unknown(cmd) => eprintln!("unknown command: {cmd} (try /help)"),
            ChatCommand::Stats => println!("{}", session.stats()),
            ChatCommand::Reset => {
                session.reset()?;
                println!("document cleared");
            }
            ChatCommand::Load(path) => match session.load_path(Path::new(path)).await {
                Ok(outcome) => report_load(&outcome),
                Err(e) => eprintln!("error: {e:#}"),
            },
            ChatCommand::Ask(query) => {
                tokio::select! {
                    answer = session.ask(query) => println!("\n{}", answer.text),
                    _ = tokio::signal::ctrl_c() => eprintln!("\n(cancelled)"),
                }
            }
        }
    }
    Ok(())
}

fn classify(query: &str, json: bool) {
    let result = classifier::explain(query);
    if json {
        match serde_json::to_string_pretty(&result) {
            Ok(out) => println!("{out}"),
            Err(e) => eprintln!("error: {e}"),
        }
    } else {
        println!(
            "{}  rule={}  ruleset=v{}",
            result.verdict, result.rule, result.ruleset_version
        );
    }
}

#[derive(Serialize)]
struct PageSummary<'a> {
    page: u32,
    section: &'a str,
    words: usize,
    chunks: usize,
}

#[derive(Serialize)]
struct InspectReport<'a> {
    fingerprint: String,
    total_chunks: usize,
    pages: Vec<PageSummary<'a>>,
}

async fn inspect(config: &Config, document: &Path, json: bool) -> anyhow::Result<()> {
    let ingestor = Ingestor::from_config(config)?;
    let bytes = ingestor
        .loader()
        .read_path(document)
        .await
        .with_context(|| format!("failed to read {}", document.display()))?;
    let loader = ingestor.loader();
    let pages = tokio::task::spawn_blocking({
        let bytes = bytes.clone();
        move || loader.load(&bytes)
    })
    .await?
    .context("failed to load document")?;
    let chunks = ingestor.splitter().split_pages(&pages);

    let report = InspectReport {
        fingerprint: ingest::fingerprint(&bytes),
        total_chunks: chunks.len(),
        pages: pages
            .iter()
            .map(|p| PageSummary {
                page: p.page_number,
                section: &p.section_title,
                words: p.word_count,
                chunks: chunks.iter().filter(|c| c.source_page == p.page_number).count(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    println!("fingerprint {}", report.fingerprint);
    for page in &report.pages {
        println!(
            "page {:>4}  words {:>6}  chunks {:>3}  {}",
            page.page, page.words, page.chunks, page.section
        );
    }
    println!(
        "processed {} chunks from {} pages",
        report.total_chunks,
        report.pages.len()
    );
    Ok(())
}

async fn check(config: &Config) -> anyhow::Result<()> {
    let provider = bootstrap::build_provider(config)?;
    bootstrap::health_check(provider.inner()).await;
    let reply = bootstrap::verify_provider(&provider)
        .await
        .with_context(|| format!("{} provider check failed", config.llm.provider))?;
    println!(
        "{} ({}) ok: {}",
        config.llm.provider,
        config.llm.model,
        reply.trim()
    );
    Ok(())
}
