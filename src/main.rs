//! casefile CLI
//!
//! Commands:
//! - `search` - ranked, paginated search over the record store
//! - `within` - search every field of one record
//! - `parse` - show the token list for a query
//! - `fields` - list searchable field paths
//! - `index` - rebuild the denormalized search text

mod cli;

use anyhow::{Context, Result};
use casefile::config::{load_config, SearchConfig};
use casefile::error::validate_search_query;
use casefile::{AppError, MemoryStore, RecordStore, SearchEngine};
use clap::Parser;
use cli::{Cli, Commands};
use std::future::Future;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity flags
    let log_level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr) // Log to stderr to keep stdout clean
        .init();

    let result = run(cli).await;

    // Handle result and exit with appropriate code
    match result {
        Ok(output) => {
            println!("{}", output);
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(get_exit_code(&e));
        }
    }
}

async fn run(cli: Cli) -> Result<String> {
    let config = load_config(cli.config.as_deref())?;
    let engine = build_engine(&config, cli.store)?;

    let output = match cli.command {
        Commands::Search(args) => {
            let query = args.into_query(config.default_limit);
            validate_search_query(&query, config.max_limit)?;
            let page = with_timeout(&config, engine.search(&query)).await?;
            serde_json::json!({
                "total": page.total,
                "count": page.results.len(),
                "results": page.results,
            })
        }
        Commands::Within(args) => {
            let results = with_timeout(
                &config,
                engine.search_within_record(&args.collection, &args.record, &args.query),
            )
            .await?;
            serde_json::to_value(results)?
        }
        Commands::Parse(args) => serde_json::to_value(engine.parse_query(&args.query))?,
        Commands::Fields => serde_json::to_value(engine.list_searchable_fields())?,
        Commands::Index(args) => {
            let count =
                with_timeout(&config, engine.rebuild_search_index(args.collection.as_deref()))
                    .await?;
            serde_json::json!({ "indexed": count })
        }
    };

    Ok(serde_json::to_string_pretty(&output)?)
}

fn build_engine(config: &SearchConfig, store_override: Option<std::path::PathBuf>) -> Result<SearchEngine> {
    let store: Arc<dyn RecordStore> = match store_override.or_else(|| config.store_path.clone()) {
        Some(path) => {
            info!("Loading records from {}", path.display());
            Arc::new(
                MemoryStore::load_json(&path)
                    .with_context(|| format!("Failed to load store {}", path.display()))?,
            )
        }
        None => {
            warn!("No record store configured, searching an empty store");
            Arc::new(MemoryStore::new())
        }
    };

    Ok(SearchEngine::from_config(store, config))
}

/// Caller-side timeout around one engine call
async fn with_timeout<T>(
    config: &SearchConfig,
    call: impl Future<Output = Result<T, AppError>>,
) -> Result<T, AppError> {
    let limit = config.search_timeout();
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(AppError::Timeout(format!(
            "Request exceeded {} second timeout",
            limit.as_secs()
        ))),
    }
}

/// Map errors to process exit codes
fn get_exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<AppError>().map(AppError::error_code) {
        Some("invalid_input") => 1,
        Some("store_error") => 2,
        Some("not_found") => 3,
        Some("timeout") => 4,
        _ => 5,
    }
}
