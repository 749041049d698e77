//! Command-line front end
//!
//! Run with: cargo run -p docuquery-rag --features cli --bin docuquery -- ask -q "..." docs/

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use walkdir::WalkDir;

use docuquery_rag::{FileType, QueryOptions, QueryOutcome, RagConfig, RagPipeline, UploadedFile};

/// Ask questions about local documents
#[derive(Parser, Debug)]
#[command(name = "docuquery", version, about = "Question answering over PDF, DOCX and TXT files")]
struct Cli {
    /// Config file (default: user config dir, then built-in defaults)
    #[arg(long, short, global = true, value_name = "TOML")]
    config: Option<PathBuf>,

    /// Log level filter
    #[arg(long, global = true, default_value = "docuquery_rag=warn")]
    log: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Answer a question from the given files and directories
    Ask {
        /// The question to answer
        #[arg(long, short)]
        question: String,

        /// Number of chunks to retrieve
        #[arg(long, value_name = "K")]
        top_k: Option<usize>,

        /// Give this query a collection of its own
        #[arg(long)]
        versioned: bool,

        /// Files or directories to read
        #[arg(required = true, value_name = "FILES")]
        paths: Vec<PathBuf>,
    },
}

/// Expand directories into the supported files they contain, in path order
fn collect_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file())
                .map(|entry| entry.into_path())
                .filter(|p| is_supported(p))
                .collect();
            found.sort();
            files.extend(found);
        } else {
            // Explicit files are passed through; unsupported ones are reported by the pipeline
            files.push(path.clone());
        }
    }

    files
}

fn is_supported(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| FileType::from_filename(name).is_supported())
        .unwrap_or(false)
}

fn spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

async fn ask(
    config: RagConfig,
    question: String,
    options: QueryOptions,
    paths: Vec<PathBuf>,
) -> anyhow::Result<()> {
    let files = collect_files(&paths);
    let mut uploads = Vec::with_capacity(files.len());
    for path in &files {
        uploads.push(UploadedFile::from_path(path).await?);
    }

    println!(
        "{} {} file(s) with {}",
        style("Reading").bold().green(),
        uploads.len(),
        style(&config.llm.generate_model).cyan()
    );

    let pipeline = RagPipeline::from_config(config)?;

    let bar = spinner("Indexing and answering...");
    let result = pipeline.run(&uploads, &question, &options).await;
    bar.finish_and_clear();
    let report = result?;

    for name in &report.unsupported {
        println!("{} {}", style("skipped (unsupported):").yellow(), name);
    }
    for failure in &report.failures {
        println!(
            "{} {}: {}",
            style("skipped (unreadable):").yellow(),
            failure.filename,
            failure.message
        );
    }

    println!();
    match report.answer.outcome {
        QueryOutcome::Answered => println!("{}", report.answer),
        _ => println!("{}", style(&report.answer).dim()),
    }

    if !report.answer.sources.is_empty() {
        println!("\n{}", style("Sources").bold());
        for source in &report.answer.sources {
            println!(
                "  {} #{} ({:.3})",
                source.filename.as_deref().unwrap_or("<unnamed>"),
                source.chunk_index,
                source.similarity
            );
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&cli.log))
        .with_writer(std::io::stderr)
        .init();

    let mut config = RagConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Ask {
            question,
            top_k,
            versioned,
            paths,
        } => {
            if versioned {
                config.index.versioned = true;
            }
            ask(config, question, QueryOptions { top_k }, paths).await
        }
    }
}
