//! Directory discovery: the site's station directory page.
//!
//! The `/stations/` page lists every genre category as a `<dt>` entry with an
//! anchor. Discovery fetches that page once and returns the category links in
//! document order. Without it no catalog can be built, so an unrecognizable
//! page is fatal; transport failures propagate as-is with no retry at this
//! layer.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use thiserror::Error;
use tracing::{debug, instrument};

use super::selector;
use crate::transport::{FetchError, Transport, join_url};

static CATEGORY_TERM: LazyLock<Selector> = LazyLock::new(|| selector("dt.text-capitalize"));
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| selector("a"));

/// A named link into one category of the station directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryLink {
    /// Category name as shown in the directory.
    pub name: String,
    /// Site-relative link to the category's first page.
    pub href: String,
}

/// Errors raised by directory discovery. All of them are fatal for the run.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The directory page could not be fetched.
    #[error("unable to fetch the station directory: {0}")]
    Fetch(#[from] FetchError),

    /// The directory page held no recognizable category links.
    #[error("no category links found in the station directory at {url}")]
    MissingDirectory {
        /// The directory URL that was inspected.
        url: String,
    },
}

/// Resolves the station directory into named category links.
pub struct MenuExtractor<'a> {
    transport: &'a dyn Transport,
    base_url: &'a str,
}

impl<'a> MenuExtractor<'a> {
    /// Creates a discovery extractor rooted at `base_url`.
    #[must_use]
    pub fn new(transport: &'a dyn Transport, base_url: &'a str) -> Self {
        Self {
            transport,
            base_url,
        }
    }

    /// Fetches the directory page and returns category links in document order.
    ///
    /// # Errors
    ///
    /// [`DiscoveryError::Fetch`] when the page cannot be fetched and
    /// [`DiscoveryError::MissingDirectory`] when no links are present.
    #[instrument(skip(self))]
    pub async fn category_links(&self) -> Result<Vec<CategoryLink>, DiscoveryError> {
        let url = join_url(self.base_url, "/stations/");
        let page = self.transport.fetch_page(&url).await?;

        let links = parse_category_links(&page);
        if links.is_empty() {
            return Err(DiscoveryError::MissingDirectory { url });
        }
        debug!(count = links.len(), "discovered categories");
        Ok(links)
    }
}

/// Extracts `dt.text-capitalize > a` entries from the directory page.
fn parse_category_links(page: &str) -> Vec<CategoryLink> {
    let document = Html::parse_document(page);
    let mut links = Vec::new();

    for term in document.select(&CATEGORY_TERM) {
        let Some(anchor) = term.select(&ANCHOR).next() else {
            continue;
        };
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let name = anchor.text().collect::<String>().trim().to_string();
        if name.is_empty() || href.is_empty() {
            continue;
        }
        links.push(CategoryLink {
            name,
            href: href.to_string(),
        });
    }
    links
}
