//! The scraping pipeline: discovery, per-category extraction, incremental save.
//!
//! [`InternetRadioScraper`] composes the extractors, the downloader and the
//! storage layer into a single sequential run. Categories already present in
//! the persisted catalog are skipped by name (case-insensitive) — resume is
//! whole-category granular, never partial. After every extracted category the
//! full catalog is saved, so an interrupted run loses at most one category's
//! worth of work.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::extract::{DiscoveryError, ExtractionError, MenuExtractor, RadioCategoryExtractor};
use crate::fetch::{DEFAULT_FAIL_LIMIT, FailureBudget, FileDownloader};
use crate::model::RadioCategory;
use crate::storage::{StorageError, StorageService};
use crate::transport::{DEFAULT_FETCH_TIMEOUT, HttpTransport, Transport};

/// The site this scraper targets.
pub const BASE_URL: &str = "https://www.internet-radio.com";

/// Configuration for a scraper run.
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Root URL of the source site.
    pub base_url: String,
    /// Base directory for persisted state; `None` disables persistence (and
    /// with it resume and dedup).
    pub base_directory: Option<PathBuf>,
    /// Directory for in-flight playlist downloads before they are materialized;
    /// `None` uses the OS temp directory.
    pub download_dir: Option<PathBuf>,
    /// Fixed delay after each playlist download; zero disables pacing.
    pub delay_between_downloads: Duration,
    /// Maximum failed fetch attempts before the run is aborted.
    pub fail_limit: u32,
    /// Per-fetch network timeout.
    pub fetch_timeout: Duration,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            base_directory: None,
            download_dir: None,
            delay_between_downloads: Duration::ZERO,
            fail_limit: DEFAULT_FAIL_LIMIT,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

impl ScraperConfig {
    /// Creates a config persisting into `base_directory`.
    #[must_use]
    pub fn with_base_directory(base_directory: impl Into<PathBuf>) -> Self {
        Self {
            base_directory: Some(base_directory.into()),
            ..Self::default()
        }
    }
}

/// Errors surfaced by a scraper run.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Directory discovery failed; no catalog can be built.
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    /// A category could not be extracted (includes the fatal failure-budget
    /// exhaustion). The partial catalog is already persisted.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// Persisted state could not be read or written.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Read-only access requires a configured base directory.
    #[error("unable to read catalog: no base directory configured")]
    NoBaseDirectory,
}

/// Scraper for the internet-radio.com station catalog.
pub struct InternetRadioScraper {
    config: ScraperConfig,
    transport: Arc<dyn Transport>,
}

impl InternetRadioScraper {
    /// Creates a scraper with an HTTP transport built from the config.
    #[must_use]
    pub fn new(config: ScraperConfig) -> Self {
        let transport = Arc::new(HttpTransport::with_timeout(config.fetch_timeout));
        Self { config, transport }
    }

    /// Creates a scraper over a caller-supplied transport.
    ///
    /// This is the seam tests use to run the full pipeline against a scripted
    /// source.
    #[must_use]
    pub fn with_transport(config: ScraperConfig, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    /// Fetches the full catalog, resuming from persisted state.
    ///
    /// With `redownload` set, persisted state is cleared first and everything
    /// is fetched from scratch. Otherwise every category whose name is already
    /// present in the loaded catalog is skipped. Each newly extracted category
    /// is materialized (playlists moved into canonical storage) and the whole
    /// catalog saved before the next category starts.
    ///
    /// # Errors
    ///
    /// Any [`ScrapeError`]; fatal errors leave the catalog persisted through
    /// the last completed category.
    #[instrument(skip(self), fields(base_url = %self.config.base_url))]
    pub async fn fetch_all(&self, redownload: bool) -> Result<Vec<RadioCategory>, ScrapeError> {
        let mut storage = self.config.base_directory.as_ref().map(StorageService::new);
        if redownload
            && let Some(storage) = storage.as_mut()
        {
            storage.clear()?;
        }

        let menu = MenuExtractor::new(self.transport.as_ref(), &self.config.base_url);
        let links = menu.category_links().await?;

        let mut catalog = match storage.as_mut() {
            Some(storage) => {
                storage.rebuild_index()?;
                storage.load()?
            }
            None => Vec::new(),
        };

        // Longest names first so compound genres match before their substrings.
        let mut known_genres: Vec<String> = links.iter().map(|l| l.name.clone()).collect();
        known_genres.sort_by_key(|name| std::cmp::Reverse(name.len()));

        let budget = Arc::new(FailureBudget::new(self.config.fail_limit));
        let mut downloader = FileDownloader::new(
            Arc::clone(&self.transport),
            budget,
            self.config.delay_between_downloads,
        );
        if let Some(dir) = &self.config.download_dir {
            downloader = downloader.with_temp_dir(dir);
        }
        let extractor = RadioCategoryExtractor::new(
            self.transport.as_ref(),
            &self.config.base_url,
            &downloader,
            &known_genres,
        );

        for link in &links {
            if catalog
                .iter()
                .any(|c| c.name.eq_ignore_ascii_case(&link.name))
            {
                debug!(category = %link.name, "already in catalog, skipping");
                continue;
            }

            info!(category = %link.name, "extracting category");
            let mut category = extractor.extract(&link.name, &link.href).await?;
            if let Some(storage) = storage.as_mut() {
                category = storage.store_playlists(category)?;
            }
            catalog.push(category);
            if let Some(storage) = storage.as_ref() {
                storage.save(&catalog)?;
            }
        }

        info!(categories = catalog.len(), "catalog complete");
        Ok(catalog)
    }

    /// Loads the persisted catalog without any network access.
    ///
    /// # Errors
    ///
    /// [`ScrapeError::NoBaseDirectory`] when persistence is not configured,
    /// otherwise any [`StorageError`] from reading the document.
    pub fn read(&self) -> Result<Vec<RadioCategory>, ScrapeError> {
        let base_directory = self
            .config
            .base_directory
            .as_ref()
            .ok_or(ScrapeError::NoBaseDirectory)?;
        Ok(StorageService::new(base_directory).load()?)
    }
}
