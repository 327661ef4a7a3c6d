//! Agora search administration CLI.
//!
//! Mirrors the four index management actions (`setup`, `clear`,
//! `index-all`, `index-flagged`) plus a `search` command for poking at the
//! result list from a terminal.

#![warn(clippy::all)]
#![forbid(unsafe_code)]

mod config;
mod seed;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

use agora_model::Store;
use agora_search::{
    IndexPipeline, KindFilters, MemoryBackend, QueryEngine, SearchIndexManager, SearchRequest,
};

use crate::config::AppConfig;

/// Agora search index administration tool
#[derive(Parser, Debug)]
#[command(name = "agora-search")]
#[command(about = "Manage and query the Agora search index", long_about = None)]
struct Args {
    /// Configuration file path (TOML); defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed the store with N demo records of each kind before running
    #[arg(long, default_value_t = 0)]
    seed: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the collections (drops existing ones first)
    Setup,
    /// Drop every collection and flag all rows for reindexing
    Clear,
    /// Rebuild the index from scratch
    IndexAll,
    /// Index only the rows flagged since the last run
    IndexFlagged,
    /// Run a query and print the scored results
    Search {
        /// Query text
        query: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::recommended(),
    };

    let store = Arc::new(Store::new());
    if args.seed > 0 {
        seed::seed(&store, args.seed);
        println!("seeded {} records of each kind", args.seed);
    }

    let backend = Arc::new(MemoryBackend::new());
    let manager = SearchIndexManager::connect(config.search, backend, store).await;
    if !manager.connected() {
        bail!("search backend is unavailable or search is disabled");
    }

    let started = Instant::now();
    match args.command {
        Command::Setup => {
            manager.reset_index().await?;
            println!("collections ready: {}", manager.collections().await.join(", "));
        }
        Command::Clear => {
            manager.clear_index().await?;
            println!("index cleared, all rows flagged for reindexing");
        }
        Command::IndexAll => {
            let total = IndexPipeline::new(&manager).index_all().await?;
            println!("indexed {total} document(s)");
        }
        Command::IndexFlagged => {
            manager.ensure_collections().await?;
            let total = IndexPipeline::new(&manager).index_flagged().await?;
            println!("indexed {total} flagged document(s)");
        }
        Command::Search { query } => {
            manager.ensure_collections().await?;
            IndexPipeline::new(&manager).index_flagged().await?;
            let page = QueryEngine::new(&manager)
                .search(&SearchRequest::new(&query), &KindFilters::new())
                .await;
            println!(
                "{} result(s){}",
                page.total_hits,
                if page.has_more_results { " (truncated)" } else { "" }
            );
            for hit in &page.hits {
                println!("  [{:<16}] {:<24} score {:.3}", hit.kind, hit.document.id, hit.score);
            }
        }
    }
    println!("done in {:.2?}", started.elapsed());
    Ok(())
}
