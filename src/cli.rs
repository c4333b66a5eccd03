//! CLI commands.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::config::Settings;
use crate::search::SearchEngine;
use crate::services::IngestService;

#[derive(Parser)]
#[command(name = "notedex")]
#[command(about = "Scanned-notes OCR ingestion and page search service")]
#[command(version)]
pub struct Cli {
    /// Data directory (database and stored files)
    #[arg(long, global = true, env = "NOTEDEX_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and database
    Init,

    /// Run the web server
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// Port to bind
        #[arg(short, long, default_value = "8000", env = "NOTEDEX_PORT")]
        port: u16,
    },

    /// Collect OCR results for a document and mark it ready
    Process {
        /// Document ID returned at upload time
        doc_id: String,
    },

    /// Ask a question against the indexed notes
    Ask {
        /// The question
        query: String,
    },

    /// Show document counts by lifecycle state
    Status,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::resolve(cli.data_dir.clone());

    match cli.command {
        Commands::Init => {
            let repo = settings.repository()?;
            println!("Initialized {}", repo.database_path().display());
            Ok(())
        }

        Commands::Serve { host, port } => crate::server::serve(&settings, &host, port).await,

        Commands::Process { doc_id } => {
            let ingest = build_ingest(&settings)?;
            let pages = ingest.finalize(&doc_id).await?;
            println!("Processed {} page(s) for {}", pages, doc_id);
            Ok(())
        }

        Commands::Ask { query } => {
            let repo = Arc::new(settings.repository()?);
            let signer = Arc::new(settings.url_signer());
            let engine = SearchEngine::new(repo, signer);

            let response = engine.rank(&query);
            println!("{}", response.answer);
            for source in &response.sources {
                println!("  [p.{} {}%] {}", source.page, source.relevance, source.url);
            }
            Ok(())
        }

        Commands::Status => {
            let repo = settings.repository()?;
            let counts = repo.count_by_status()?;
            if counts.is_empty() {
                println!("No documents.");
            }
            for (status, count) in counts {
                println!("{:>12}  {}", status.as_str(), count);
            }
            Ok(())
        }
    }
}

fn build_ingest(settings: &Settings) -> anyhow::Result<IngestService> {
    let repo = Arc::new(settings.repository()?);
    let blobs = Arc::new(settings.blob_store());
    let ocr = settings.ocr_client();
    let aggregator = settings.aggregator(ocr.clone());
    Ok(IngestService::new(repo, blobs, ocr, aggregator))
}
