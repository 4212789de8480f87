//! Command-line surface of the batch collector.

use std::path::PathBuf;

use clap::Parser;

use crate::{MAX_RETRIES, PAGE_DELAY_SECS};

#[derive(Parser, Debug)]
#[command(version, about = "Collects historical football match URLs from paginated odds listings")]
pub struct Cli {
    /// Countries to collect, comma separated (default: all)
    #[arg(long, value_delimiter = ',')]
    pub countries: Vec<String>,

    /// Seasons to collect, comma separated (default: all per league)
    #[arg(long, value_delimiter = ',')]
    pub seasons: Vec<String>,

    /// Output directory
    #[arg(long, default_value = "match_urls_collection")]
    pub out_dir: PathBuf,

    /// Print the available countries and seasons, then exit
    #[arg(long, default_value_t = false)]
    pub list: bool,

    /// Hard cap on listing pages per task
    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Delay between listing pages, in milliseconds
    #[arg(long, default_value_t = PAGE_DELAY_SECS * 1000)]
    pub delay_ms: u64,

    /// Per-page retry budget (a page gets retries + 1 attempts)
    #[arg(long, default_value_t = MAX_RETRIES)]
    pub retries: usize,

    /// Merge a recollection directory into out-dir instead of scraping;
    /// writes the result to "<out-dir>_merged"
    #[arg(long, value_name = "DIR")]
    pub merge_recollection: Option<PathBuf>,
}
