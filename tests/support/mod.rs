//! Shared test support: a scripted transport and HTML fixture builders.

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use radioscraper::{FetchError, Transport};

/// In-memory [`Transport`]: serves canned pages and binaries and records every
/// request in order.
#[derive(Default)]
pub struct FakeTransport {
    pages: Mutex<HashMap<String, String>>,
    binaries: Mutex<HashMap<String, Result<Vec<u8>, u16>>>,
    requests: Mutex<Vec<String>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an HTML page for `url`.
    pub fn page(&self, url: &str, html: &str) {
        self.pages
            .lock()
            .unwrap()
            .insert(url.to_string(), html.to_string());
    }

    /// Registers binary content for `url`.
    pub fn binary(&self, url: &str, bytes: &[u8]) {
        self.binaries
            .lock()
            .unwrap()
            .insert(url.to_string(), Ok(bytes.to_vec()));
    }

    /// Registers an HTTP error status for binary fetches of `url`.
    pub fn binary_status(&self, url: &str, status: u16) {
        self.binaries
            .lock()
            .unwrap()
            .insert(url.to_string(), Err(status));
    }

    /// Returns every requested URL in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn log(&self, url: &str) {
        self.requests.lock().unwrap().push(url.to_string());
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        self.log(url);
        self.pages
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::http_status(url, 404))
    }

    async fn fetch_binary(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.log(url);
        match self.binaries.lock().unwrap().get(url) {
            Some(Ok(bytes)) => Ok(bytes.clone()),
            Some(Err(status)) => Err(FetchError::http_status(url, *status)),
            None => Err(FetchError::http_status(url, 404)),
        }
    }
}

/// Builds a station directory page with the given `(name, href)` entries.
pub fn directory_page(entries: &[(&str, &str)]) -> String {
    let items = entries
        .iter()
        .map(|(name, href)| {
            format!(r#"<dt class="text-capitalize"><a href="{href}">{name}</a></dt>"#)
        })
        .collect::<String>();
    format!("<html><body><dl>{items}</dl></body></html>")
}

/// Builds a category page: About panel, optional pagination block, station table.
pub fn category_page(description: &str, pagination: &str, rows: &[String]) -> String {
    format!(
        r#"<html><body>
            <div class="panel panel-default">
                <h2 class="panel-title">About this genre</h2>
                <p class="lead">{description}</p>
            </div>
            {pagination}
            <table class="table table-striped"><tbody>{}</tbody></table>
        </body></html>"#,
        rows.concat()
    )
}

/// Builds one station row.
///
/// `kbps_text` is the raw text of the right-hand cell (e.g. `"128 Kbps"`);
/// `playlist_href` is the site-relative playlist-generator link.
pub fn station_row(name: &str, homepage: &str, genres: &str, kbps_text: &str, playlist_href: &str) -> String {
    format!(
        r#"<tr id="play_row">
            <td id="play_1"><a title="M3U Playlist File" href="{playlist_href}">M3U</a></td>
            <td><h4 class="text-danger">{name}</h4>{homepage}<br>Genres: {genres}</td>
            <td class="text-right">{kbps_text}</td>
        </tr>"#
    )
}
