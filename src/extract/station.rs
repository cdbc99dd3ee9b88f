//! Station row extraction.
//!
//! A listing row is partitioned into three zones by structural markers: the
//! player cell (id `play_*`) carries the M3U playlist link, the middle cell
//! (contains `h4.text-danger`) carries name, homepage and genres, and the
//! right-aligned cell carries the bitrate. The zones are parsed independently;
//! a zone that fails to parse simply leaves its fields unset, and the
//! completeness check in [`StationBuilder::build`] decides whether the row
//! yields a station at all.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument, warn};

use super::selector;
use crate::fetch::{DownloadError, FileDownloader};
use crate::model::{RadioStation, StationBuilder};
use crate::transport::join_url;

static CELL: LazyLock<Selector> = LazyLock::new(|| selector("td"));
static NAME_HEADING: LazyLock<Selector> = LazyLock::new(|| selector("h4"));
static MIDDLE_MARKER: LazyLock<Selector> = LazyLock::new(|| selector("h4.text-danger"));
static PLAYLIST_ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"a[title="M3U Playlist File"]"#));

#[allow(clippy::expect_used)]
static KBPS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?P<number>\d+) Kbps").expect("static regex must compile"));

#[allow(clippy::expect_used)]
static GENRES_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Genres: (?P<genres>\w+( \w+)*)").expect("static regex must compile")
});

/// Playlist links must point at the site's playlist generator endpoint.
const PLAYLIST_PATH_PREFIX: &str = "/servers/tools/playlistgenerator";

/// Extracts one station per listing row, downloading its playlist file.
pub struct RadioStationExtractor<'a> {
    downloader: &'a FileDownloader,
    base_url: &'a str,
    /// Recognized genre names, sorted longest first so compound names match
    /// before their substrings.
    known_genres: &'a [String],
}

impl<'a> RadioStationExtractor<'a> {
    /// Creates a station extractor.
    #[must_use]
    pub fn new(
        downloader: &'a FileDownloader,
        base_url: &'a str,
        known_genres: &'a [String],
    ) -> Self {
        Self {
            downloader,
            base_url,
            known_genres,
        }
    }

    /// Extracts a station from one `<tr>` fragment.
    ///
    /// Returns `Ok(None)` for incomplete rows; they are silently dropped and
    /// any playlist already downloaded for them is removed again.
    ///
    /// # Errors
    ///
    /// Propagates fatal [`DownloadError`]s from the playlist download (budget
    /// exhaustion, local IO).
    #[instrument(skip_all)]
    pub async fn extract(&self, row_html: &str) -> Result<Option<RadioStation>, DownloadError> {
        let fields = parse_row(row_html, self.base_url, self.known_genres);

        let mut builder = StationBuilder::new();
        if let Some(name) = fields.name {
            builder.name(name);
        }
        if let Some(url) = fields.url {
            builder.url(url);
        }
        if let Some(genres) = fields.genres {
            builder.genres(genres);
        }
        if let Some(kbps) = fields.kbps {
            builder.kbps(kbps);
        }
        let mut downloaded = None;
        if let Some(playlist_url) = fields.playlist_url
            && let Some(path) = self.downloader.download(&playlist_url, "m3u").await?
        {
            builder.playlist_file(path.clone());
            downloaded = Some(path);
        }

        let station = builder.build();
        if station.is_none()
            && let Some(path) = downloaded
        {
            debug!(path = %path.display(), "discarding playlist of incomplete row");
            if let Err(error) = std::fs::remove_file(&path) {
                warn!(path = %path.display(), %error, "unable to remove discarded playlist");
            }
        }
        Ok(station)
    }
}

/// Raw facts gathered from a row before any network access.
#[derive(Debug, Default)]
struct RowFields {
    playlist_url: Option<String>,
    name: Option<String>,
    url: Option<String>,
    genres: Option<Vec<String>>,
    kbps: Option<u32>,
}

/// Parses a row fragment into its candidate fields.
///
/// The fragment is re-wrapped in a `<table>` so the HTML parser keeps the
/// `<tr>`/`<td>` structure intact.
fn parse_row(row_html: &str, base_url: &str, known_genres: &[String]) -> RowFields {
    let fragment = Html::parse_fragment(&format!("<table>{row_html}</table>"));
    let mut fields = RowFields::default();

    for cell in fragment.select(&CELL) {
        if is_player_cell(cell) {
            fields.playlist_url = find_playlist_url(cell, base_url);
        } else if is_middle_cell(cell) {
            fields.name = find_station_name(cell);
            fields.url = find_station_url(cell);
            fields.genres = parse_genres(&cell_text(cell), known_genres);
        } else if is_right_cell(cell) {
            fields.kbps = find_kbps(cell);
        }
    }
    fields
}

fn is_player_cell(cell: ElementRef<'_>) -> bool {
    cell.value()
        .attr("id")
        .is_some_and(|id| id.starts_with("play_"))
}

fn is_middle_cell(cell: ElementRef<'_>) -> bool {
    cell.select(&MIDDLE_MARKER).next().is_some()
}

fn is_right_cell(cell: ElementRef<'_>) -> bool {
    cell.value()
        .attr("class")
        .is_some_and(|class| class.contains("text-right"))
}

/// Finds the playlist-generator link in the player cell.
fn find_playlist_url(cell: ElementRef<'_>, base_url: &str) -> Option<String> {
    cell.select(&PLAYLIST_ANCHOR)
        .filter_map(|anchor| anchor.value().attr("href"))
        .map(str::trim)
        .find(|href| href.starts_with(PLAYLIST_PATH_PREFIX))
        .map(|href| join_url(base_url, href))
}

/// Station name: first non-empty `<h4>` heading in the middle cell.
fn find_station_name(cell: ElementRef<'_>) -> Option<String> {
    cell.select(&NAME_HEADING)
        .map(|heading| heading.text().collect::<String>().trim().to_string())
        .find(|name| !name.is_empty())
}

/// Station homepage: first text run that looks like an https URL.
fn find_station_url(cell: ElementRef<'_>) -> Option<String> {
    cell.text()
        .map(str::trim)
        .find(|text| text.starts_with("https://"))
        .map(ToString::to_string)
}

/// Bitrate: a text run of the form `<integer> Kbps`.
fn find_kbps(cell: ElementRef<'_>) -> Option<u32> {
    cell.text()
        .map(|text| text.replace(['\t', '\n'], " "))
        .find(|text| text.contains(" Kbps"))
        .and_then(|text| {
            KBPS_PATTERN
                .captures(&text)
                .and_then(|captures| captures.name("number"))
                .and_then(|number| number.as_str().parse().ok())
        })
}

/// Parses the `Genres: ...` run of the middle cell.
///
/// Recognized genre names are matched first (the caller supplies them sorted
/// longest first) and removed from the run; leftover tokens longer than two
/// characters are kept as unrecognized genres. Returns `None` when the cell
/// has no genres run at all.
fn parse_genres(cell_text: &str, known_genres: &[String]) -> Option<Vec<String>> {
    let captures = GENRES_PATTERN.captures(cell_text)?;
    let mut genres_line = captures["genres"].to_string();
    let mut genres = Vec::new();

    for genre in known_genres {
        if genres_line.contains(genre.as_str()) {
            genres.push(genre.clone());
            genres_line = genres_line.replace(genre.as_str(), "");
        }
    }
    for leftover in genres_line.split_whitespace() {
        if leftover.len() > 2 {
            genres.push(leftover.to_string());
        }
    }
    Some(genres)
}

/// Whole-cell text with whitespace collapsed to single spaces.
fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
