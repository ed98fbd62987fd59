//! Command-line interface for the media catalog.

mod commands;

use clap::{Parser, Subcommand};

/// Media catalog: movie metadata from OMDB plus local library organization
#[derive(Parser)]
#[command(name = "media-catalog")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server
    #[command(alias = "web", alias = "daemon")]
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Search OMDB by title
    #[command(alias = "s")]
    Search {
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// Fetch a movie from OMDB and store it in the catalog
    #[command(alias = "a")]
    Add {
        /// IMDb id, e.g. tt1375666
        imdb_id: String,
    },

    /// List catalog movies
    Movies {
        #[arg(long, default_value = "50")]
        limit: u64,
        #[arg(long, default_value = "0")]
        offset: u64,
    },

    /// Scan a library folder and wait for the result
    Scan {
        path: String,
        /// Probe video files with ffprobe
        #[arg(long)]
        metadata: bool,
    },

    /// Print ffprobe metadata for a video file
    Probe { file: String },

    /// List a directory inside the allowed base paths
    Ls { dir: String },
}

pub use commands::*;
