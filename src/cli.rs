//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Scrape the internet-radio.com station catalog into a local directory.
#[derive(Parser, Debug)]
#[command(name = "radioscraper")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch the catalog, resuming from previously saved state
    Fetch {
        /// Directory for the catalog document and playlist files
        #[arg(short, long, default_value = "./data")]
        dir: PathBuf,

        /// Discard saved state and fetch everything from scratch
        #[arg(long)]
        redownload: bool,

        /// Delay between playlist downloads in milliseconds (0 to disable)
        #[arg(short = 'l', long, default_value_t = 0, value_parser = clap::value_parser!(u64).range(0..=60000))]
        delay_ms: u64,

        /// Maximum failed fetch attempts before the run is aborted
        #[arg(long, default_value_t = radioscraper::DEFAULT_FAIL_LIMIT)]
        fail_limit: u32,
    },

    /// Print the saved catalog without touching the network
    Read {
        /// Directory holding the saved catalog
        #[arg(short, long, default_value = "./data")]
        dir: PathBuf,
    },
}
