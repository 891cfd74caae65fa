//! litcurator - Literature Review Corpus Curation Pipeline
//!
//! Reconciles article metadata against an EBSCO XML export, deduplicates and
//! quality-filters a TEI corpus directory, resolves Crossref PDF links, and
//! runs LLM relevance/stance classification over the curated corpus.
//!
//! ## Usage
//!
//! ```bash
//! litcurator reconcile --input_csv articles.csv --ebsco_xml export.xml --output_csv fixed.csv
//! litcurator dedup -i ./corpus --delete
//! ```

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use litcurator::corpus::{self, FilterMode, FilterReport};
use litcurator::crossref::CrossrefClient;
use litcurator::ebsco::ReferenceIndex;
use litcurator::llm::{ChatClient, LlmConfig};
use litcurator::{reconcile, records, relevance, stance};
use serde::Serialize;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

/// Literature Review Corpus Curation Pipeline
#[derive(Parser)]
#[command(name = "litcurator")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconstruct missing record metadata from an EBSCO XML export
    Reconcile {
        /// CSV file with article metadata (filenames, DOIs, titles)
        #[arg(long = "input_csv", required = true)]
        input_csv: PathBuf,

        /// EBSCO XML export containing full bibliographic records
        #[arg(long = "ebsco_xml", required = true)]
        ebsco_xml: PathBuf,

        /// Output CSV with reconstructed metadata
        #[arg(long = "output_csv", required = true)]
        output_csv: PathBuf,
    },

    /// Remove duplicate TEI documents (same declared MD5 identity)
    Dedup {
        /// Directory containing TEI XML files
        #[arg(short = 'i', long = "input_dir", required = true)]
        input_dir: PathBuf,

        /// Actually delete duplicates (default: dry-run report only)
        #[arg(long)]
        delete: bool,
    },

    /// Remove TEI documents without a non-empty abstract
    FilterAbstracts {
        /// Directory containing TEI XML files
        #[arg(short = 'i', long = "input_dir", required = true)]
        input_dir: PathBuf,

        /// Actually delete incomplete documents (default: dry-run report only)
        #[arg(long)]
        delete: bool,
    },

    /// Resolve Crossref PDF links for the DOIs in a record CSV
    FetchLinks {
        /// CSV file with a DOI column
        #[arg(long = "input_csv", required = true)]
        input_csv: PathBuf,

        /// Output CSV of doi,title,pdf_url rows
        #[arg(long = "output_csv", required = true)]
        output_csv: PathBuf,

        /// Concurrent Crossref workers
        #[arg(long, default_value = "3")]
        workers: usize,
    },

    /// Rate corpus abstracts as relevant/irrelevant with an LLM
    RateRelevance {
        /// Directory containing TEI XML files
        #[arg(short = 'i', long = "input_dir", required = true)]
        input_dir: PathBuf,

        /// Output CSV with per-iteration ratings
        #[arg(short = 'o', long = "output_csv", required = true)]
        output_csv: PathBuf,

        /// Number of rating iterations per article
        #[arg(long, default_value = "10")]
        iterations: usize,

        #[command(flatten)]
        llm: LlmArgs,
    },

    /// Classify paragraph stances toward memory decay with an LLM
    ClassifyStance {
        /// Input CSV with paragraph columns (p1, p2, ...)
        #[arg(short = 'i', long = "input_csv", required = true)]
        input_csv: PathBuf,

        /// Output CSV with stance categories and rationales
        #[arg(short = 'o', long = "output_csv", required = true)]
        output_csv: PathBuf,

        #[command(flatten)]
        llm: LlmArgs,
    },
}

#[derive(clap::Args)]
struct LlmArgs {
    /// LLM API base URL (OpenAI-compatible)
    #[arg(long, default_value = "https://api.openai.com/v1")]
    llm_base_url: String,

    /// LLM API key (falls back to the OPENAI_API_KEY environment variable)
    #[arg(long)]
    llm_key: Option<String>,

    /// LLM model name
    #[arg(long, default_value = "gpt-4")]
    llm_model: String,
}

impl LlmArgs {
    fn into_config(self) -> Result<LlmConfig> {
        let api_key = match self.llm_key {
            Some(key) => key,
            None => std::env::var("OPENAI_API_KEY")
                .context("No --llm-key given and OPENAI_API_KEY is not set")?,
        };
        Ok(LlmConfig {
            base_url: self.llm_base_url,
            api_key,
            model: self.llm_model,
        })
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .init();

    match cli.command {
        Commands::Reconcile {
            input_csv,
            ebsco_xml,
            output_csv,
        } => run_reconcile(input_csv, ebsco_xml, output_csv),
        Commands::Dedup { input_dir, delete } => {
            let report = corpus::dedup_corpus(&input_dir, filter_mode(delete))
                .context("Deduplication failed")?;
            print_filter_report("Duplicates", &report);
            Ok(())
        }
        Commands::FilterAbstracts { input_dir, delete } => {
            let report = corpus::filter_missing_abstracts(&input_dir, filter_mode(delete))
                .context("Abstract filter failed")?;
            print_filter_report("Missing abstracts", &report);
            Ok(())
        }
        Commands::FetchLinks {
            input_csv,
            output_csv,
            workers,
        } => run_fetch_links(input_csv, output_csv, workers).await,
        Commands::RateRelevance {
            input_dir,
            output_csv,
            iterations,
            llm,
        } => {
            let client = ChatClient::new(llm.into_config()?)?;
            let report = relevance::rate_directory(&client, &input_dir, &output_csv, iterations)
                .await
                .context("Relevance rating failed")?;
            println!(
                "Rated {} / {} articles ({} skipped). Results in: {}",
                report.rated,
                report.articles,
                report.skipped,
                output_csv.display()
            );
            Ok(())
        }
        Commands::ClassifyStance {
            input_csv,
            output_csv,
            llm,
        } => {
            let client = ChatClient::new(llm.into_config()?)?;
            let report = stance::classify_csv(&client, &input_csv, &output_csv)
                .await
                .context("Stance classification failed")?;
            println!(
                "Classified {} paragraphs over {} rows ({} unrated). Results in: {}",
                report.paragraphs_classified,
                report.rows,
                report.paragraphs_unrated,
                output_csv.display()
            );
            Ok(())
        }
    }
}

fn filter_mode(delete: bool) -> FilterMode {
    if delete {
        FilterMode::Delete
    } else {
        FilterMode::DryRun
    }
}

// ============================================================================
// Reconciliation
// ============================================================================

fn run_reconcile(input_csv: PathBuf, ebsco_xml: PathBuf, output_csv: PathBuf) -> Result<()> {
    println!("Running metadata reconciliation with:");
    println!("  Input CSV:   {}", input_csv.display());
    println!("  EBSCO XML:   {}", ebsco_xml.display());
    println!("  Output CSV:  {}", output_csv.display());

    let mut rows = records::load_records(&input_csv).context("Failed to load input CSV")?;
    let index = ReferenceIndex::from_file(&ebsco_xml).context("Failed to parse EBSCO XML")?;

    let report = reconcile::reconcile(&mut rows, &index);

    records::save_records(&output_csv, &rows).context("Failed to write output CSV")?;

    println!(
        "Matched rows: {} by DOI, {} by title ({} already complete)",
        report.matched_by_doi, report.matched_by_title, report.skipped_complete
    );
    println!("Unmatched rows: {}", report.unmatched);
    Ok(())
}

// ============================================================================
// Filter Reporting
// ============================================================================

fn print_filter_report(what: &str, report: &FilterReport) {
    let action = if report.deleted { "removed" } else { "would remove" };
    println!(
        "[{}] Total files: {}",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        report.scanned
    );
    println!("{}: {} ({})", what, report.removed.len(), action);
    println!("Kept: {}", report.kept());
    for path in &report.removed {
        println!("  {}", path.display());
    }
    if !report.skipped.is_empty() {
        println!("Skipped: {}", report.skipped.len());
        for skipped in &report.skipped {
            println!("  {} ({})", skipped.path.display(), skipped.reason);
        }
    }
    if !report.deleted && !report.removed.is_empty() {
        println!("Dry-run only; pass --delete to remove files in place.");
    }
}

// ============================================================================
// Crossref Link Lookup
// ============================================================================

/// Output row of the fetch-links stage
#[derive(Serialize)]
struct LinkRow {
    doi: String,
    title: String,
    pdf_url: String,
}

async fn run_fetch_links(input_csv: PathBuf, output_csv: PathBuf, workers: usize) -> Result<()> {
    let rows = records::load_records(&input_csv).context("Failed to load input CSV")?;
    let dois: Vec<String> = rows
        .iter()
        .map(|r| r.doi.trim().to_string())
        .filter(|d| !d.is_empty())
        .collect();

    if dois.is_empty() {
        println!("No DOIs found in {}", input_csv.display());
        return Ok(());
    }

    println!("Looking up {} DOIs (concurrent, {} workers)...", dois.len(), workers);

    let client = CrossrefClient::new(workers)?;
    let works = client.lookup_batch(&dois).await;

    let mut writer = csv::Writer::from_path(&output_csv).context("Failed to create CSV writer")?;
    let mut with_links = 0usize;
    for work in works.into_iter().flatten() {
        if !work.pdf_urls.is_empty() {
            with_links += 1;
        }
        writer.serialize(LinkRow {
            doi: work.doi,
            title: work.title,
            pdf_url: work.pdf_urls.into_iter().next().unwrap_or_default(),
        })?;
    }
    writer.flush().context("Failed to flush CSV")?;

    println!(
        "Resolved links for {} / {} DOIs. Results in: {}",
        with_links,
        dois.len(),
        output_csv.display()
    );
    Ok(())
}
