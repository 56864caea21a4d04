use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::error;

use council_votes::db;
use council_votes::parser::FormatHint;
use council_votes::pipeline::{self, DocumentReport};
use council_votes::settings::Settings;

#[derive(Parser)]
#[command(name = "council_votes", about = "Extract roll-call votes from council meeting minutes")]
struct Cli {
    /// Settings file (default: ./votes.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract vote records from minutes (PDF or pdftotext dump, or directories of them)
    Extract {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Minutes layout
        #[arg(short, long, value_enum, default_value_t = FormatHint::Auto)]
        format: FormatHint,
        /// Directory for the CSV files (default: next to each document)
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Skip the SQLite store
        #[arg(long)]
        no_db: bool,
        /// Print the reports as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Report which layout a document uses
    Detect { path: PathBuf },
    /// Show vote store statistics
    Stats {
        /// Voting pattern of one member
        #[arg(short, long)]
        member: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    let result = match cli.command {
        Commands::Extract { paths, format, out, no_db, json } => {
            let docs = pipeline::collect_documents(&paths)?;
            if docs.is_empty() {
                println!("No .pdf or .txt documents found.");
                return Ok(());
            }
            let store = if no_db {
                None
            } else {
                let conn = db::connect(&settings.db_path)?;
                db::init_schema(&conn)?;
                Some(conn)
            };

            let (reports, failed) = extract_all(&docs, format, &settings, out.as_deref(), store.as_ref())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                for r in &reports {
                    r.print();
                }
                let records: usize = reports.iter().map(|r| r.records.len()).sum();
                println!(
                    "\nProcessed {} documents: {} vote records, {} failed.",
                    reports.len(),
                    records,
                    failed
                );
            }
            Ok(())
        }
        Commands::Detect { path } => {
            let format = pipeline::detect_document(&path, &settings)?;
            println!("{}: {}", path.display(), format);
            Ok(())
        }
        Commands::Stats { member } => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("Meetings:      {}", s.meetings);
            println!("Motions:       {}", s.motions);
            println!("Non-unanimous: {}", s.non_unanimous);
            if !s.by_vote_type.is_empty() {
                println!("\n--- Member rows by vote type ---");
                for (vote_type, n) in &s.by_vote_type {
                    println!("  {:<14} {:>6}", vote_type, n);
                }
            }
            if let Some(name) = member {
                let patterns = db::fetch_member_patterns(&conn, Some(&name))?;
                if patterns.is_empty() {
                    println!("\nNo non-unanimous votes recorded for {}.", name);
                } else {
                    println!("\n--- {} ---", name);
                    for p in &patterns {
                        println!("  {:<14} {:>5} ({:.1}%)", p.vote_type, p.vote_count, p.vote_percentage);
                    }
                }
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

/// Documents run one after another; a failing document is logged and skipped.
fn extract_all(
    docs: &[PathBuf],
    format: FormatHint,
    settings: &Settings,
    out: Option<&std::path::Path>,
    store: Option<&rusqlite::Connection>,
) -> anyhow::Result<(Vec<DocumentReport>, usize)> {
    let pb = ProgressBar::new(docs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let mut reports = Vec::new();
    let mut failed = 0;
    for doc in docs {
        pb.set_message(doc.display().to_string());
        match pipeline::process_document(doc, format, settings, out, store) {
            Ok(report) => reports.push(report),
            Err(e) => {
                failed += 1;
                pb.suspend(|| error!("{}: {:#}", doc.display(), e));
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    Ok((reports, failed))
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
