//! Catalog data model: radio categories, stations, and deterministic identifiers.
//!
//! The persisted catalog is an array of [`RadioCategory`] values, each holding its
//! [`RadioStation`] entries inline. Records are constructed once by extraction and
//! are immutable afterwards, except for the playlist path rewrite performed by the
//! storage layer when a downloaded file is moved into canonical storage.
//!
//! Identifiers are not persisted: they are name-based UUIDs derived from record
//! content, so the same content always yields the same id across runs.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A genre category of radio stations.
///
/// Serialized as `{name, description, stations}`. Unknown fields are ignored on
/// read so older binaries can load documents written by newer ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadioCategory {
    /// Category name, unique within a catalog (case-insensitive).
    pub name: String,
    /// Description text from the category's "About" section.
    pub description: String,
    /// Stations in extraction order (page order, then row order).
    pub stations: Vec<RadioStation>,
}

impl RadioCategory {
    /// Returns the deterministic id of this category, derived from
    /// `(name, description)`.
    #[must_use]
    pub fn id(&self) -> Uuid {
        content_uuid(&[&self.name, &self.description])
    }
}

/// A single radio station entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadioStation {
    /// Station name.
    pub name: String,
    /// Station homepage, when the listing carries one.
    #[serde(default)]
    pub url: Option<String>,
    /// Genre tags in extraction order.
    pub genres: Vec<String>,
    /// Stream bitrate in kilobits per second.
    pub kbps: u32,
    /// Path of the locally stored M3U playlist file.
    #[serde(rename = "playlistFile")]
    pub playlist_file: PathBuf,
}

impl RadioStation {
    /// Returns the deterministic id of this station, derived from
    /// `(name, url, kbps)`.
    #[must_use]
    pub fn id(&self) -> Uuid {
        let kbps = self.kbps.to_string();
        content_uuid(&[&self.name, self.url.as_deref().unwrap_or(""), &kbps])
    }
}

/// Accumulator for a station being assembled from independently parsed row zones.
///
/// Every field is optional while parsing; [`StationBuilder::build`] applies the
/// completeness rule and only then produces a strict [`RadioStation`]. Rows that
/// fail the rule are dropped by the caller and never enter the catalog.
#[derive(Debug, Default)]
pub struct StationBuilder {
    name: Option<String>,
    url: Option<String>,
    genres: Option<Vec<String>>,
    kbps: Option<u32>,
    playlist_file: Option<PathBuf>,
}

impl StationBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the station name.
    pub fn name(&mut self, name: String) -> &mut Self {
        self.name = Some(name);
        self
    }

    /// Sets the station homepage URL.
    pub fn url(&mut self, url: String) -> &mut Self {
        self.url = Some(url);
        self
    }

    /// Sets the genre list.
    pub fn genres(&mut self, genres: Vec<String>) -> &mut Self {
        self.genres = Some(genres);
        self
    }

    /// Sets the bitrate.
    pub fn kbps(&mut self, kbps: u32) -> &mut Self {
        self.kbps = Some(kbps);
        self
    }

    /// Sets the downloaded playlist path.
    pub fn playlist_file(&mut self, path: PathBuf) -> &mut Self {
        self.playlist_file = Some(path);
        self
    }

    /// Finalizes the builder into a station.
    ///
    /// Returns `None` unless the station is complete: non-blank name, genres
    /// present, bitrate present, and a playlist file present.
    #[must_use]
    pub fn build(self) -> Option<RadioStation> {
        let name = self.name.filter(|n| !n.trim().is_empty())?;
        Some(RadioStation {
            name,
            url: self.url,
            genres: self.genres?,
            kbps: self.kbps?,
            playlist_file: self.playlist_file?,
        })
    }
}

/// Computes a name-based UUID (v5) over the concatenation of `parts`.
///
/// Parts are joined with a separator so distinct field splits cannot collide on
/// the same concatenated bytes.
fn content_uuid(parts: &[&str]) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, parts.join("\u{1f}").as_bytes())
}
