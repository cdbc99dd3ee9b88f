//! Category extraction: description, pagination walk, station table.
//!
//! A category's entry page carries an "About" panel with exactly one lead
//! paragraph (the description), an optional pagination control, and the
//! station table. When a pagination control exists, every page it references
//! is fetched — in ascending page-number order — and the station rows of all
//! pages are concatenated in page order, then row order. Missing or malformed
//! structure is fatal for the category.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use scraper::{Html, Selector};
use thiserror::Error;
use tracing::{debug, info, instrument};

use super::selector;
use super::station::RadioStationExtractor;
use crate::fetch::{DownloadError, FileDownloader};
use crate::model::RadioCategory;
use crate::transport::{FetchError, Transport, join_url};

static PANEL: LazyLock<Selector> = LazyLock::new(|| selector("div.panel.panel-default"));
static PANEL_TITLE: LazyLock<Selector> = LazyLock::new(|| selector("h2.panel-title"));
static LEAD_PARAGRAPH: LazyLock<Selector> = LazyLock::new(|| selector("p.lead"));
static PAGINATION: LazyLock<Selector> = LazyLock::new(|| selector("ul.pagination"));
static LIST_ITEM: LazyLock<Selector> = LazyLock::new(|| selector("li"));
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| selector("a"));
static STATION_TABLE: LazyLock<Selector> = LazyLock::new(|| selector("table.table-striped"));
static TABLE_ROW: LazyLock<Selector> = LazyLock::new(|| selector("tr"));

/// Rows carrying this id prefix are scriptless player fallbacks, not stations.
const NON_STATION_ROW_PREFIX: &str = "play_nohtml";

/// Errors that make a category unextractable.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// A category page could not be fetched.
    #[error("unable to fetch category page: {0}")]
    Fetch(#[from] FetchError),

    /// The "About" section or its single description paragraph is missing.
    #[error("no description found for category '{category}' at {url}")]
    MissingDescription {
        /// The category being extracted.
        category: String,
        /// The page that was inspected.
        url: String,
    },

    /// A pagination entry is missing its anchor or page number.
    #[error("malformed pagination control at {url}")]
    MalformedPagination {
        /// The page with the broken control.
        url: String,
    },

    /// The station table is absent from a page.
    #[error("no station table found at {url}")]
    MissingTable {
        /// The page that was inspected.
        url: String,
    },

    /// A fatal download error (budget exhaustion or local IO).
    #[error(transparent)]
    Download(#[from] DownloadError),
}

/// Extracts one full category: description plus all stations across all pages.
pub struct RadioCategoryExtractor<'a> {
    transport: &'a dyn Transport,
    base_url: &'a str,
    downloader: &'a FileDownloader,
    known_genres: &'a [String],
}

impl<'a> RadioCategoryExtractor<'a> {
    /// Creates a category extractor.
    #[must_use]
    pub fn new(
        transport: &'a dyn Transport,
        base_url: &'a str,
        downloader: &'a FileDownloader,
        known_genres: &'a [String],
    ) -> Self {
        Self {
            transport,
            base_url,
            downloader,
            known_genres,
        }
    }

    /// Extracts the category behind `href`.
    ///
    /// # Errors
    ///
    /// Any [`ExtractionError`]: structural failures are fatal for this
    /// category, fetch failures and fatal download errors propagate.
    #[instrument(skip(self), fields(category = name))]
    pub async fn extract(&self, name: &str, href: &str) -> Result<RadioCategory, ExtractionError> {
        let url = join_url(self.base_url, href);
        let first_page = self.transport.fetch_page(&url).await?;

        let description = find_description(&first_page).ok_or_else(|| {
            ExtractionError::MissingDescription {
                category: name.to_string(),
                url: url.clone(),
            }
        })?;

        let further_pages = find_pagination_links(&first_page)
            .map_err(|_: MalformedPagination| ExtractionError::MalformedPagination {
                url: url.clone(),
            })?
            .into_iter()
            .map(|href| join_url(self.base_url, &href))
            .collect::<Vec<_>>();
        info!(pages = further_pages.len() + 1, "walking category pages");

        let extractor =
            RadioStationExtractor::new(self.downloader, self.base_url, self.known_genres);
        let mut stations = Vec::new();

        self.extract_page_rows(&extractor, &first_page, &url, &mut stations)
            .await?;
        for (page_number, page_url) in further_pages.iter().enumerate() {
            debug!(page = page_number + 2, url = %page_url, "fetching category page");
            let page = self.transport.fetch_page(page_url).await?;
            self.extract_page_rows(&extractor, &page, page_url, &mut stations)
                .await?;
        }

        info!(stations = stations.len(), "category extracted");
        Ok(RadioCategory {
            name: name.to_string(),
            description,
            stations,
        })
    }

    /// Extracts all station rows of one page into `stations`.
    async fn extract_page_rows(
        &self,
        extractor: &RadioStationExtractor<'_>,
        page: &str,
        url: &str,
        stations: &mut Vec<crate::model::RadioStation>,
    ) -> Result<(), ExtractionError> {
        let rows = find_table_rows(page).ok_or_else(|| ExtractionError::MissingTable {
            url: url.to_string(),
        })?;

        for (index, row) in rows.iter().enumerate() {
            debug!(row = index + 1, total = rows.len(), "extracting station row");
            if let Some(station) = extractor.extract(row).await? {
                stations.push(station);
            }
        }
        Ok(())
    }
}

/// Marker for a pagination control that exists but cannot be interpreted.
#[derive(Debug)]
struct MalformedPagination;

/// Finds the description: the single `p.lead` inside the "About" panel.
fn find_description(page: &str) -> Option<String> {
    let document = Html::parse_document(page);

    let about_panel = document.select(&PANEL).find(|panel| {
        panel.select(&PANEL_TITLE).any(|title| {
            title
                .text()
                .collect::<String>()
                .trim()
                .starts_with("About")
        })
    })?;

    let leads = about_panel.select(&LEAD_PARAGRAPH).collect::<Vec<_>>();
    // The panel must hold exactly one description paragraph.
    let [lead] = leads.as_slice() else {
        return None;
    };
    Some(lead.text().collect::<String>().trim().to_string())
}

/// Enumerates the hrefs of further pages referenced by the pagination control.
///
/// Returns an empty list when no control exists. Pagination items with a class
/// attribute (the active page, prev/next arrows) are skipped; every remaining
/// item must carry an anchor whose text is the page number, and pages are
/// returned in ascending page-number order.
fn find_pagination_links(page: &str) -> Result<Vec<String>, MalformedPagination> {
    let document = Html::parse_document(page);
    let Some(pagination) = document.select(&PAGINATION).next() else {
        return Ok(Vec::new());
    };

    let mut pages = BTreeMap::new();
    for item in pagination.select(&LIST_ITEM) {
        if item.value().attr("class").is_some_and(|c| !c.is_empty()) {
            continue;
        }
        let anchor = item.select(&ANCHOR).next().ok_or(MalformedPagination)?;
        let number: u32 = anchor
            .text()
            .collect::<String>()
            .trim()
            .parse()
            .map_err(|_| MalformedPagination)?;
        let href = anchor.value().attr("href").ok_or(MalformedPagination)?;
        pages.insert(number, href.to_string());
    }
    Ok(pages.into_values().collect())
}

/// Collects the station table's row fragments in document order.
///
/// Returns `None` when the page has no station table.
fn find_table_rows(page: &str) -> Option<Vec<String>> {
    let document = Html::parse_document(page);
    let table = document.select(&STATION_TABLE).next()?;
    let rows = table
        .select(&TABLE_ROW)
        .filter(|row| {
            !row.value()
                .attr("id")
                .is_some_and(|id| id.starts_with(NON_STATION_ROW_PREFIX))
        })
        .map(|row| row.html())
        .collect();
    Some(rows)
}
