//! TechWatch CLI
//!
//! Operator surface for the ingestion and scoring engine: run a scraping
//! pass, score unscored articles, detect trends, or run the declarative
//! schedule in the foreground.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use techwatch_core::Settings;
use techwatch_orchestrator::{Orchestrator, Scheduler};
use techwatch_scoring::{GlobalScorer, StaticEmbeddingBackend, TrendDetector};
use techwatch_storage::Storage;
use tracing::info;

#[derive(Parser)]
#[command(name = "techwatch")]
#[command(about = "TechWatch - content ingestion and personalized scoring engine", long_about = None)]
struct Cli {
    /// Path to a TOML settings file (env vars always take precedence)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one ingestion pass over every active source
    Ingest {
        /// Override the active keyword set for this run only
        #[arg(long, value_delimiter = ',')]
        keywords: Option<Vec<String>>,
    },
    /// Score unscored articles against the active keyword set
    Score {
        /// Cap the number of articles scored in this pass
        #[arg(long)]
        limit: Option<i64>,
    },
    /// Detect today's trends, or clean up trends older than the retention window
    Trends {
        #[command(subcommand)]
        action: TrendsAction,
    },
    /// Run the declarative schedule in the foreground (full ingest, YouTube
    /// trending, hourly scoring, daily summarization, trend detection/cleanup)
    Serve,
}

#[derive(Subcommand)]
enum TrendsAction {
    /// Aggregate today's trend scores from the last 7 days of articles
    Detect,
    /// Delete trend rows older than the retention window (default 90 days)
    Cleanup {
        #[arg(long)]
        days_to_keep: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    techwatch_scrapers::register_all();

    let cli = Cli::parse();
    let settings = Arc::new(Settings::load(cli.config.as_deref()));
    let storage = Arc::new(Storage::connect(&settings.database_url).await?);

    match cli.command {
        Commands::Ingest { keywords } => {
            let orchestrator = Orchestrator::new(storage, settings);
            let report = orchestrator.ingest_all(keywords).await?;
            println!(
                "run {} finished: status={} sources={} scraped={} saved={}",
                report.run.task_id,
                report.run.status,
                report.per_source.len(),
                report.run.articles_scraped,
                report.run.articles_saved,
            );
            for source in &report.per_source {
                println!(
                    "  {:<20} status={:<15} scraped={} saved={} duration_ms={}{}",
                    source.source_name,
                    source.status.to_string(),
                    source.articles_scraped,
                    source.articles_saved,
                    source.duration_ms,
                    source.error.as_deref().map(|e| format!(" error={e}")).unwrap_or_default(),
                );
            }
        }
        Commands::Score { limit } => {
            let backend = StaticEmbeddingBackend;
            let scorer = GlobalScorer::new(&storage, &backend);
            let scored = scorer.score_unscored(limit).await?;
            println!("scored {scored} articles");
        }
        Commands::Trends { action } => match action {
            TrendsAction::Detect => {
                let detector = TrendDetector::new(&storage);
                let stats = detector.detect_trends().await?;
                println!(
                    "analyzed {} keywords, upserted {} trend rows",
                    stats.keywords_analyzed, stats.trends_upserted
                );
            }
            TrendsAction::Cleanup { days_to_keep } => {
                let detector = TrendDetector::new(&storage);
                let deleted = detector.cleanup(days_to_keep).await?;
                println!("deleted {deleted} stale trend rows");
            }
        },
        Commands::Serve => {
            let orchestrator = Arc::new(Orchestrator::new(storage.clone(), settings));
            let scheduler = Scheduler::new(orchestrator, storage);
            let handles = scheduler.spawn_all();
            info!("scheduler running in the foreground, press Ctrl+C to stop");
            tokio::signal::ctrl_c().await?;
            for handle in handles {
                handle.abort();
            }
        }
    }

    Ok(())
}
