//! Radioscraper Core Library
//!
//! This library incrementally harvests the internet-radio.com station catalog:
//! it discovers genre categories from the station directory, walks each
//! category's paginated listing, downloads per-station M3U playlists, and
//! persists the result as a resumable, content-deduplicated local catalog.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`model`] - Catalog records and deterministic identifiers
//! - [`transport`] - Network boundary (trait + reqwest implementation)
//! - [`fetch`] - Playlist downloads with a run-wide failure budget
//! - [`extract`] - Directory, category and station-row extraction
//! - [`storage`] - Catalog persistence and content-addressed playlist dedup
//! - [`scrape`] - The orchestrating pipeline and public entry points
//!
//! # Example
//!
//! ```no_run
//! use radioscraper::{InternetRadioScraper, ScraperConfig};
//!
//! # async fn example() -> Result<(), radioscraper::ScrapeError> {
//! let scraper = InternetRadioScraper::new(ScraperConfig::with_base_directory("./data"));
//! let catalog = scraper.fetch_all(false).await?;
//! println!("{} categories", catalog.len());
//! # Ok(())
//! # }
//! ```

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod extract;
pub mod fetch;
pub mod model;
pub mod scrape;
pub mod storage;
pub mod transport;

// Re-export commonly used types
pub use extract::{
    CategoryLink, DiscoveryError, ExtractionError, MenuExtractor, RadioCategoryExtractor,
    RadioStationExtractor,
};
pub use fetch::{DEFAULT_FAIL_LIMIT, DownloadError, FailureBudget, FileDownloader};
pub use model::{RadioCategory, RadioStation, StationBuilder};
pub use scrape::{BASE_URL, InternetRadioScraper, ScrapeError, ScraperConfig};
pub use storage::{CATALOG_FILENAME, StorageError, StorageService};
pub use transport::{DEFAULT_FETCH_TIMEOUT, FetchError, HttpTransport, Transport};
