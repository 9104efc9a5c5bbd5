//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// visualoom - browse, index and search image folders on a VisuaLoom backend
#[derive(Parser, Debug)]
#[command(name = "visualoom", version, propagate_version = true)]
pub struct Cli {
    /// Backend base URL (overrides config.toml and VISUALOOM_BASE_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Home directory for config and saved state (overrides VISUALOOM_HOME)
    #[arg(long, global = true, value_name = "PATH")]
    pub home: Option<PathBuf>,

    /// Show more diagnostics (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// List root folders
    Roots,
    /// List indexed folders
    Indexed,
    /// List a folder's items with their index status
    Browse {
        path: String,
        /// Include image files, not just folders
        #[arg(long)]
        files: bool,
    },
    /// Expand each path in turn; repeating a path collapses it
    Tree {
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Breadcrumbs plus a filtered, paged listing
    Explore {
        path: String,
        /// Case-insensitive name filter
        #[arg(long, value_name = "QUERY")]
        filter: Option<String>,
        /// Page to show, starting at 1
        #[arg(long, default_value_t = 1)]
        page: usize,
        /// Items per page (defaults to page_size from config)
        #[arg(long, value_name = "N")]
        per_page: Option<usize>,
    },
    /// Manage bookmarked folders
    Bookmark {
        #[command(subcommand)]
        action: BookmarkAction,
    },
    /// List recently explored folders
    Recent,
    /// Search for folders containing images
    FindFolders {
        base: String,
        #[arg(long, default_value = "")]
        query: String,
        #[arg(long, default_value_t = 50)]
        max: u32,
    },
    /// Start indexing a folder and follow its progress
    Index {
        path: String,
        /// Print the job id and return without waiting
        #[arg(long)]
        no_wait: bool,
    },
    /// Show an indexing job's status once
    JobStatus { job_id: String },
    /// Index an explicit set of files
    IndexFiles {
        #[arg(required = true)]
        files: Vec<String>,
    },
    /// Semantic image search
    Search {
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Upload one image
    Upload { file: PathBuf },
    /// Delete an image by id
    Delete { id: String },
    /// Print the navigation sidebar
    Pages {
        /// Route to mark as active, e.g. /search
        #[arg(long)]
        active: Option<String>,
    },
    /// Print the resolved configuration
    Config,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum BookmarkAction {
    Add { path: String },
    Remove { path: String },
    List,
}

impl Cli {
    /// Log filter implied by `-v`; `RUST_LOG` still wins.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}
