//! HTML extraction: directory discovery, category pages, station rows.
//!
//! Parsing is done with `scraper` CSS selectors. `scraper::Html` is not `Send`,
//! so every parse happens inside a synchronous helper that returns owned data;
//! async code only ever awaits between parses. Each extractor pushes its
//! "expected structure is missing" decisions into one typed accessor per
//! structure (description block, pagination, table rows) that returns an
//! explicit `Option`/`Result` instead of panicking mid-walk.

mod category;
mod menu;
mod station;

pub use category::{ExtractionError, RadioCategoryExtractor};
pub use menu::{CategoryLink, DiscoveryError, MenuExtractor};
pub use station::RadioStationExtractor;

use scraper::Selector;

/// Parses a static CSS selector.
///
/// Only called with literal selectors that are known to be valid.
#[allow(clippy::expect_used)]
pub(crate) fn selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("static CSS selector must parse")
}
