//! # docseek CLI
//!
//! A thin harness around [`docseek::SearchEngine`]: collect files from disk,
//! index them in memory, query, and optionally save the session as a
//! snapshot file that later `query` runs can load.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docseek index <paths...>` | Index files and directories, optionally query and export |
//! | `docseek query --snapshot <file> "<query>"` | Query a saved snapshot |
//!
//! ## Examples
//!
//! ```bash
//! docseek index ./docs ./notes.pdf --query "incident review" --limit 5
//! docseek index ./docs --export ./session.json --progress json
//! docseek query --snapshot ./session.json "postmortem" --type pdf
//! ```

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use docseek::config::{self, Config};
use docseek::engine::SearchEngine;
use docseek::export;
use docseek::logging::init_tracing;
use docseek::progress::ProgressMode;
use docseek::scan::scan_paths;
use docseek::{FileType, SearchFilters, SearchQuery, SearchResult};

/// docseek: local-first document search.
#[derive(Parser)]
#[command(
    name = "docseek",
    about = "docseek: index local documents in memory and search them",
    version
)]
struct Cli {
    /// Path to a configuration file (TOML). Built-in defaults when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index files and directories.
    ///
    /// Directories are walked recursively (`.git`, `target` and
    /// `node_modules` are skipped). Files without an extractor are reported
    /// and skipped; one bad file never stops the batch.
    Index {
        /// Files or directories to index.
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Run this query after indexing.
        #[arg(long)]
        query: Option<String>,

        #[command(flatten)]
        search: SearchArgs,

        /// Write a snapshot of the session to this file.
        #[arg(long)]
        export: Option<PathBuf>,

        /// Name recorded in the snapshot.
        #[arg(long, default_value = "docseek")]
        name: String,

        /// Additional glob patterns to exclude (matched against relative paths).
        #[arg(long)]
        exclude: Vec<String>,

        #[arg(long)]
        follow_symlinks: bool,

        /// Progress output: auto, human, json, or off.
        #[arg(long, default_value = "auto")]
        progress: String,
    },

    /// Query a snapshot written by `index --export`.
    Query {
        #[arg(long)]
        snapshot: PathBuf,

        query: String,

        #[command(flatten)]
        search: SearchArgs,
    },
}

#[derive(clap::Args)]
struct SearchArgs {
    /// Maximum results (defaults to `search.default_limit`).
    #[arg(long)]
    limit: Option<usize>,

    /// Only these file types (pdf, docx, txt, md, csv, html, unknown).
    #[arg(long = "type")]
    file_types: Vec<String>,

    /// Only these paths: globs, or plain prefixes.
    #[arg(long = "path")]
    paths: Vec<String>,

    /// Print results as JSON.
    #[arg(long)]
    json: bool,
}

impl SearchArgs {
    fn query(&self, text: &str) -> Result<SearchQuery> {
        let mut query = SearchQuery::new(text);
        query.limit = self.limit;
        if !self.file_types.is_empty() || !self.paths.is_empty() {
            let file_types = self
                .file_types
                .iter()
                .map(|t| file_type(t))
                .collect::<Result<Vec<_>>>()?;
            query = query.with_filters(SearchFilters {
                file_types: (!file_types.is_empty()).then_some(file_types),
                paths: (!self.paths.is_empty()).then(|| self.paths.clone()),
                ..Default::default()
            });
        }
        Ok(query)
    }
}

fn file_type(name: &str) -> Result<FileType> {
    let file_type = FileType::from_extension(name);
    if file_type == FileType::Unknown && !name.eq_ignore_ascii_case("unknown") {
        bail!(
            "Unknown file type: '{}'. Must be pdf, docx, txt, md, csv, html, or unknown.",
            name
        );
    }
    Ok(file_type)
}

fn progress_mode(arg: &str) -> Result<ProgressMode> {
    Ok(match arg {
        "auto" => ProgressMode::default_for_tty(),
        "human" => ProgressMode::Human,
        "json" => ProgressMode::Json,
        "off" => ProgressMode::Off,
        other => bail!(
            "Unknown progress mode: '{}'. Must be auto, human, json, or off.",
            other
        ),
    })
}

fn run_query(engine: &SearchEngine, text: &str, args: &SearchArgs) -> Result<()> {
    let results = engine.search(&args.query(text)?)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print_results(&results);
    }
    Ok(())
}

fn print_results(results: &[SearchResult]) {
    if results.is_empty() {
        println!("No results.");
        return;
    }
    for (i, result) in results.iter().enumerate() {
        let meta = &result.metadata;
        println!(
            "{}. [{:.2}] {} ({})",
            i + 1,
            result.score,
            meta.path,
            meta.file_type
        );
        println!("    modified: {}", meta.last_modified.format("%Y-%m-%d"));
        for snippet in &result.snippets {
            println!("    excerpt: \"{}\"", snippet.text.replace('\n', " ").trim());
        }
        println!("    id: {}", result.file_id);
        println!();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("info");
    let cli = Cli::parse();

    let cfg = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => Config::default(),
    };
    let engine = SearchEngine::new(&cfg);

    match cli.command {
        Commands::Index {
            paths,
            query,
            search,
            export,
            name,
            exclude,
            follow_symlinks,
            progress,
        } => {
            let reporter = progress_mode(&progress)?.reporter();
            let files = scan_paths(&paths, &exclude, follow_symlinks).await?;
            let report = engine.index_files(files, reporter.as_ref()).await?;

            eprintln!("index");
            eprintln!("  files: {}", report.total);
            eprintln!("  indexed: {}", report.indexed);
            eprintln!("  failed: {}", report.failed);
            eprintln!("  skipped: {}", report.skipped);
            for failure in &report.failures {
                eprintln!("  ! {}", failure);
            }

            if let Some(output) = export.as_deref() {
                export::write_snapshot(&engine, &name, Some(output))?;
            }
            if let Some(text) = query {
                run_query(&engine, &text, &search)?;
            }
        }
        Commands::Query {
            snapshot,
            query,
            search,
        } => {
            let bundle = export::read_snapshot(&snapshot)?;
            engine.import_snapshot(&bundle).await?;
            run_query(&engine, &query, &search)?;
        }
    }

    Ok(())
}
