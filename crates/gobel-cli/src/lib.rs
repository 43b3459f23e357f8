//! Gobel CLI Library
//!
//! Command-line interface for maintaining a local Gene Ontology warehouse.
//!
//! # Overview
//!
//! The Gobel CLI wraps the `gobel-core` ingestion and query engine:
//!
//! - **Ingestion**: Download and store an ontology release (`gobel populate`)
//! - **Annotations**: Attach gene product annotations (`gobel annotate`)
//! - **Term Lookup**: Inspect a single term (`gobel term`)
//! - **Traversal**: Walk the graph upward or downward (`gobel ancestors`, `gobel descendants`)
//! - **Reporting**: Per-version statistics (`gobel summarize`)
//! - **Versioning**: List stored releases (`gobel versions`)

pub mod commands;
pub mod error;

// Re-export commonly used types
pub use error::{CliError, Result};

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Gobel - Gene Ontology warehouse
#[derive(Parser, Debug)]
#[command(name = "gobel")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// SQLite database URL
    #[arg(long, env = "GOBEL_DATABASE_URL", global = true)]
    pub database_url: Option<String>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download an ontology release and store it as a versioned graph
    Populate {
        /// Version label for the stored graph (defaults to the release date
        /// declared in the ontology header)
        #[arg(short = 'V', long)]
        version: Option<String>,

        /// Replace an existing version whose content differs
        #[arg(long)]
        overwrite: bool,

        /// Re-download even if a cached copy exists
        #[arg(short, long)]
        force: bool,

        /// Read the ontology from a local OBO file instead of downloading
        #[arg(short, long)]
        local: Option<PathBuf>,

        /// Stop parsing after this many term stanzas
        #[arg(long)]
        limit: Option<usize>,

        /// GAF source to annotate the new graph with, a URL or a local file
        /// path (repeatable)
        #[arg(long)]
        gaf: Vec<String>,
    },

    /// Download gene product annotations and attach them to a stored graph
    Annotate {
        /// GAF source: a URL or a local file path (defaults to the configured
        /// association file)
        #[arg(short, long)]
        gaf: Option<String>,

        /// Graph version to annotate (defaults to the latest)
        #[arg(short = 'V', long)]
        version: Option<String>,

        /// Re-download even if a cached copy exists
        #[arg(short, long)]
        force: bool,
    },

    /// Look up a single term by identifier
    Term {
        /// GO identifier, bare accession, or alternate identifier
        id: String,

        /// Treat the argument as a term name instead of an identifier
        #[arg(short, long)]
        name: bool,

        /// Graph version to query (defaults to the latest)
        #[arg(short = 'V', long)]
        version: Option<String>,

        /// Emit JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },

    /// List all ancestors of a term, following relations upward
    Ancestors {
        /// GO identifier to start from
        id: String,

        /// Relation kinds to follow (comma-separated; defaults to is_a,part_of)
        #[arg(short, long, value_delimiter = ',')]
        kinds: Vec<String>,

        /// Graph version to query (defaults to the latest)
        #[arg(short = 'V', long)]
        version: Option<String>,

        /// Emit JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },

    /// List all descendants of a term, following relations downward
    Descendants {
        /// GO identifier to start from
        id: String,

        /// Relation kinds to follow (comma-separated; defaults to is_a,part_of)
        #[arg(short, long, value_delimiter = ',')]
        kinds: Vec<String>,

        /// Graph version to query (defaults to the latest)
        #[arg(short = 'V', long)]
        version: Option<String>,

        /// Emit JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },

    /// Show statistics for a stored graph version
    Summarize {
        /// Graph version to summarize (defaults to the latest)
        #[arg(short = 'V', long)]
        version: Option<String>,

        /// Emit JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },

    /// List stored graph versions
    Versions {
        /// Emit JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },
}
