// src/cli.rs

use clap::Parser;
use git_lanes::{GraphConfig, SortMode};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the git repository to show
    #[arg(short, long)]
    pub repo: PathBuf,

    /// Number of commits fetched by the first page
    #[arg(long, default_value_t = 1000)]
    pub initial: usize,

    /// Number of commits fetched by every following page
    #[arg(long, default_value_t = 500)]
    pub page_size: usize,

    /// Keep fetching pages until the whole history is loaded
    #[arg(long)]
    pub all: bool,

    /// Row ordering
    #[arg(long, value_enum, default_value_t = SortMode::Date)]
    pub sort: SortMode,

    /// Toggle a branch's visibility (may be repeated)
    #[arg(long = "hide", value_name = "BRANCH")]
    pub hide: Vec<String>,

    /// Show every branch again before applying --hide
    #[arg(long)]
    pub show_all: bool,

    /// File where hidden branches are remembered
    #[arg(long)]
    pub state: Option<PathBuf>,

    /// Number of rows to print
    #[arg(short = 'n', long, default_value_t = 50)]
    pub limit_rows: usize,

    /// Log debug output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn config(&self) -> GraphConfig {
        GraphConfig {
            initial_page_size: self.initial,
            page_size: self.page_size,
            sort: self.sort,
            ..GraphConfig::default()
        }
    }

    pub fn state_file(&self) -> PathBuf {
        self.state
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(".git-lanes.json"))
    }
}
