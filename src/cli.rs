//! CLI mode implementation
//!
//! Command-line front end over the search engine. Every command prints JSON on
//! stdout; logs go to stderr.

use casefile::SearchQuery;
use clap::{Parser, Subcommand};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// casefile CLI
#[derive(Parser)]
#[command(name = "casefile")]
#[command(about = "Boolean, field-scoped and fuzzy search over profile records", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output (no short flag to avoid conflicts)
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true, env = "CASEFILE_CONFIG")]
    pub config: Option<PathBuf>,

    /// JSON record store, overrides `store_path` from the config
    #[arg(long, global = true, env = "CASEFILE_STORE")]
    pub store: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search records
    Search(SearchArgs),
    /// Search every field of a single record
    Within(WithinArgs),
    /// Show how a query is tokenized
    Parse(ParseArgs),
    /// List searchable field paths
    Fields,
    /// Rebuild the denormalized search text
    Index(IndexArgs),
}

/// Search arguments
#[derive(Parser, JsonSchema, Deserialize, Serialize, Clone, Debug)]
pub struct SearchArgs {
    /// Query text
    #[arg(short = 'q', long)]
    #[schemars(description = "Query text: words, \"phrases\", field:value, AND/OR/NOT, (groups), * and ? wildcards")]
    pub query: String,

    /// Restrict to one collection
    #[arg(short = 'c', long)]
    #[schemars(description = "Restrict to one collection")]
    pub collection: Option<String>,

    /// Keep only these record types (repeatable)
    #[arg(short = 't', long = "type")]
    #[schemars(description = "Keep only these record types")]
    #[serde(default)]
    pub record_types: Vec<String>,

    /// Match unscoped terms against these fields only (repeatable)
    #[arg(short = 'f', long = "field")]
    #[schemars(description = "Match unscoped terms against these fields only")]
    #[serde(default)]
    pub fields: Vec<String>,

    /// Maximum number of results (default 20, max 200)
    #[arg(short = 'l', long)]
    #[schemars(description = "Maximum number of results (default 20, max 200)")]
    pub limit: Option<usize>,

    /// Results to skip
    #[arg(short = 'o', long, default_value_t = 0)]
    #[schemars(description = "Results to skip")]
    #[serde(default)]
    pub offset: usize,

    /// Add approximate matches when exact ones don't fill the page
    #[arg(long)]
    #[serde(default)]
    pub fuzzy: bool,

    /// Omit highlight snippets
    #[arg(long)]
    #[serde(default)]
    pub no_highlight: bool,

    /// Parse operators, fields, phrases and groups
    #[arg(long)]
    #[serde(default)]
    pub advanced: bool,
}

impl SearchArgs {
    pub fn into_query(self, default_limit: usize) -> SearchQuery {
        SearchQuery {
            text: self.query,
            collection: self.collection,
            record_types: self.record_types,
            fields: self.fields,
            limit: self.limit.unwrap_or(default_limit),
            offset: self.offset,
            fuzzy: self.fuzzy,
            highlight: !self.no_highlight,
            advanced: self.advanced,
        }
    }
}

/// Within-record search arguments
#[derive(Parser, JsonSchema, Deserialize, Serialize, Clone, Debug)]
pub struct WithinArgs {
    /// Collection holding the record
    #[arg(short = 'c', long)]
    pub collection: String,

    /// Record id
    #[arg(short = 'r', long)]
    pub record: String,

    /// Search terms (case-insensitive)
    #[arg(short = 'q', long)]
    pub query: String,
}

/// Parse arguments
#[derive(Parser, JsonSchema, Deserialize, Serialize, Clone, Debug)]
pub struct ParseArgs {
    /// Query text
    #[arg(short = 'q', long)]
    pub query: String,
}

/// Index arguments
#[derive(Parser, Debug)]
pub struct IndexArgs {
    /// Only this collection (defaults to all)
    #[arg(short = 'c', long)]
    pub collection: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_args_into_query() {
        let cli = Cli::parse_from([
            "casefile", "search", "-q", "status:active", "-t", "person", "-t", "org", "-f",
            "core.name", "--advanced", "--no-highlight", "-o", "10",
        ]);
        let Commands::Search(args) = cli.command else {
            panic!("expected search command");
        };

        let query = args.into_query(20);
        assert_eq!(query.text, "status:active");
        assert_eq!(query.record_types, vec!["person", "org"]);
        assert_eq!(query.fields, vec!["core.name"]);
        assert_eq!(query.limit, 20);
        assert_eq!(query.offset, 10);
        assert!(query.advanced);
        assert!(!query.highlight);
        assert!(!query.fuzzy);
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["casefile", "fields", "--verbose", "--store", "records.json"]);
        assert!(cli.verbose);
        assert_eq!(cli.store, Some(PathBuf::from("records.json")));
        assert!(matches!(cli.command, Commands::Fields));
    }

    #[test]
    fn test_search_args_schema() {
        let schema = schemars::schema_for!(SearchArgs);
        let json = serde_json::to_value(&schema).unwrap();
        assert!(json["properties"]["query"].is_object());
        assert!(json["properties"]["limit"].is_object());
    }
}
