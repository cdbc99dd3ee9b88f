//! CLI entry point for the radioscraper tool.

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use radioscraper::{InternetRadioScraper, RadioCategory, ScraperConfig};
use tracing::info;

mod cli;

use cli::{Args, Command};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    match args.command {
        Command::Fetch {
            dir,
            redownload,
            delay_ms,
            fail_limit,
        } => {
            let config = ScraperConfig {
                base_directory: Some(dir),
                delay_between_downloads: Duration::from_millis(delay_ms),
                fail_limit,
                ..ScraperConfig::default()
            };
            let scraper = InternetRadioScraper::new(config);
            info!(redownload, "starting catalog fetch");
            let catalog = scraper.fetch_all(redownload).await?;
            print_catalog(&catalog);
        }
        Command::Read { dir } => {
            let scraper = InternetRadioScraper::new(ScraperConfig::with_base_directory(dir));
            let catalog = scraper.read()?;
            print_catalog(&catalog);
        }
    }

    Ok(())
}

fn print_catalog(catalog: &[RadioCategory]) {
    for category in catalog {
        println!("\n------------------");
        println!("Category: {}", category.name);
        println!("Description: {}", category.description);
        println!("Radio stations:");
        for (index, station) in category.stations.iter().enumerate() {
            println!("\t{}.\t{}", index + 1, station.name);
            if let Some(url) = &station.url {
                println!("\t\t{url}");
            }
            println!("\t\t{} kbps", station.kbps);
            println!("\t\tGenres:\t{}", station.genres.join(", "));
            println!("\t\tPlaylist file:\t{}", station.playlist_file.display());
        }
    }
    println!(
        "\n{} categories, {} stations",
        catalog.len(),
        catalog.iter().map(|c| c.stations.len()).sum::<usize>()
    );
}
