//! folio - book pipeline filter and EPUB navigation fix-up

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use folio::{normalize_navigation, transform, DocumentTree, FormatContext, Metadata};

#[derive(Parser)]
#[command(name = "folio")]
#[command(version, about = "Book pipeline filter and EPUB navigation fix-up", long_about = None)]
#[command(after_help = "EXAMPLES:
    folio filter --format epub --metadata book/metadata.yaml < tree.json
    folio fix-nav build/epub-unpacked --title \"My Book\"")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rewrite a JSON document tree (stdin) for a target format (stdout)
    Filter {
        /// Target format (html, html-pdf, docx, epub, latex, ast)
        #[arg(short, long, value_name = "FORMAT")]
        format: String,

        /// Path to the YAML front-matter metadata file
        #[arg(short, long, value_name = "FILE")]
        metadata: PathBuf,
    },
    /// Normalize the navigation files of an unpacked EPUB package
    FixNav {
        /// Unpacked package directory
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// The book title (matching TOC entries are dropped)
        #[arg(short, long, value_name = "TITLE")]
        title: String,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Filter { format, metadata } => run_filter(&format, &metadata),
        Command::FixNav { dir, title } => {
            normalize_navigation(&dir, &title).map_err(|e| e.to_string())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run_filter(format: &str, metadata_path: &std::path::Path) -> Result<(), String> {
    let format = FormatContext::from_name(format)
        .ok_or_else(|| format!("unknown format: {format}"))?;

    let front_matter = std::fs::read_to_string(metadata_path).map_err(|e| e.to_string())?;
    let metadata = Metadata::from_front_matter(&front_matter).map_err(|e| e.to_string())?;

    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .map_err(|e| e.to_string())?;
    let tree: DocumentTree = serde_json::from_str(&input).map_err(|e| e.to_string())?;

    let rewritten = transform(tree, format, &metadata).map_err(|e| e.to_string())?;
    let json = serde_json::to_string(&rewritten).map_err(|e| e.to_string())?;
    println!("{json}");
    Ok(())
}
