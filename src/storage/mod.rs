//! Catalog persistence and content-addressed playlist storage.
//!
//! The on-disk layout is a base directory holding `data.json` (the full catalog
//! as one JSON document) and an `m3u/` subdirectory with the deduplicated
//! playlist files. Saves always rewrite the whole document; the write goes to a
//! temp file first and is renamed into place so a crash cannot leave a torn
//! document behind.
//!
//! Playlists are deduplicated by a SHA-256 hash of their contents: a downloaded
//! file whose content already exists in canonical storage is discarded and the
//! station re-pointed at the existing file. The hash index is rebuilt
//! explicitly via [`StorageService::rebuild_index`] rather than implicitly in
//! the constructor, so read-only use never scans the playlist directory.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::model::RadioCategory;

/// File name of the catalog document inside the base directory.
pub const CATALOG_FILENAME: &str = "data.json";

/// Subdirectory holding deduplicated playlist files.
const PLAYLIST_DIR: &str = "m3u";

/// Errors raised by the storage layer. All of them are fatal.
#[derive(Debug, Error)]
pub enum StorageError {
    /// File system error reading or writing persisted state.
    #[error("IO error on {path}: {source}")]
    Io {
        /// The path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The catalog document exists but cannot be parsed.
    #[error("corrupt catalog document {path}: {source}")]
    Corrupt {
        /// The document path.
        path: PathBuf,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Owns the on-disk catalog: document persistence, playlist dedup, resume state.
#[derive(Debug)]
pub struct StorageService {
    base_dir: PathBuf,
    playlist_dir: PathBuf,
    /// Content hash -> canonical playlist path.
    hash_index: HashMap<[u8; 32], PathBuf>,
}

impl StorageService {
    /// Creates a storage service rooted at `base_dir`.
    ///
    /// Nothing is read or created yet; call [`Self::rebuild_index`] before
    /// materializing playlists.
    #[must_use]
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        let playlist_dir = base_dir.join(PLAYLIST_DIR);
        Self {
            base_dir,
            playlist_dir,
            hash_index: HashMap::new(),
        }
    }

    /// Returns the canonical playlist directory.
    #[must_use]
    pub fn playlist_dir(&self) -> &Path {
        &self.playlist_dir
    }

    /// Rebuilds the content-hash index from the canonical playlist files.
    ///
    /// # Errors
    ///
    /// [`StorageError::Io`] when the playlist directory cannot be scanned.
    #[instrument(skip(self))]
    pub fn rebuild_index(&mut self) -> Result<(), StorageError> {
        self.hash_index.clear();
        if !self.playlist_dir.is_dir() {
            return Ok(());
        }

        let entries = fs::read_dir(&self.playlist_dir)
            .map_err(|e| StorageError::io(&self.playlist_dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| StorageError::io(&self.playlist_dir, e))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let hash = hash_file(&path)?;
            self.hash_index.insert(hash, path);
        }
        debug!(files = self.hash_index.len(), "playlist hash index rebuilt");
        Ok(())
    }

    /// Loads the persisted catalog, or an empty one when no document exists.
    ///
    /// # Errors
    ///
    /// [`StorageError::Io`] on read failures, [`StorageError::Corrupt`] when
    /// the document cannot be parsed.
    #[instrument(skip(self))]
    pub fn load(&self) -> Result<Vec<RadioCategory>, StorageError> {
        let path = self.base_dir.join(CATALOG_FILENAME);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(&path).map_err(|e| StorageError::io(&path, e))?;
        let catalog =
            serde_json::from_str(&contents).map_err(|e| StorageError::Corrupt { path, source: e })?;
        Ok(catalog)
    }

    /// Persists the full catalog, creating the base directory when absent.
    ///
    /// The document is always rewritten as a whole; the write goes through a
    /// temp file renamed over `data.json`.
    ///
    /// # Errors
    ///
    /// [`StorageError::Io`] on any file system failure.
    #[instrument(skip(self, catalog), fields(categories = catalog.len()))]
    pub fn save(&self, catalog: &[RadioCategory]) -> Result<(), StorageError> {
        fs::create_dir_all(&self.base_dir).map_err(|e| StorageError::io(&self.base_dir, e))?;

        let path = self.base_dir.join(CATALOG_FILENAME);
        let document = serde_json::to_string_pretty(catalog).map_err(|e| StorageError::Corrupt {
            path: path.clone(),
            source: e,
        })?;

        let temp = tempfile::NamedTempFile::new_in(&self.base_dir)
            .map_err(|e| StorageError::io(&self.base_dir, e))?;
        fs::write(temp.path(), document).map_err(|e| StorageError::io(temp.path(), e))?;
        temp.persist(&path)
            .map_err(|e| StorageError::io(&path, e.error))?;

        debug!(path = %path.display(), "catalog saved");
        Ok(())
    }

    /// Moves a category's downloaded playlists into canonical storage,
    /// deduplicating by content hash.
    ///
    /// Stations whose playlist already lives in the playlist directory are left
    /// untouched. For the rest, a playlist with previously seen content is
    /// dropped and the station re-pointed at the existing file; new content is
    /// moved in under its original file name (uniquified on name collisions)
    /// and indexed.
    ///
    /// # Errors
    ///
    /// [`StorageError::Io`] on any file system failure.
    #[instrument(skip(self, category), fields(category = %category.name))]
    pub fn store_playlists(
        &mut self,
        category: RadioCategory,
    ) -> Result<RadioCategory, StorageError> {
        fs::create_dir_all(&self.playlist_dir)
            .map_err(|e| StorageError::io(&self.playlist_dir, e))?;

        let mut stations = Vec::with_capacity(category.stations.len());
        for mut station in category.stations {
            if !station.playlist_file.starts_with(&self.playlist_dir) {
                station.playlist_file = self.store_playlist(&station.playlist_file)?;
            }
            stations.push(station);
        }
        Ok(RadioCategory {
            stations,
            ..category
        })
    }

    /// Moves one playlist file into canonical storage, returning its canonical
    /// path (which is an existing file's path when the content is a duplicate).
    fn store_playlist(&mut self, source: &Path) -> Result<PathBuf, StorageError> {
        let hash = hash_file(source)?;
        if let Some(existing) = self.hash_index.get(&hash) {
            debug!(source = %source.display(), existing = %existing.display(), "duplicate playlist content");
            fs::remove_file(source).map_err(|e| StorageError::io(source, e))?;
            return Ok(existing.clone());
        }

        let file_name = source
            .file_name()
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| "playlist.m3u".into());
        let target = unique_target_path(&self.playlist_dir.join(file_name));
        move_file(source, &target)?;
        self.hash_index.insert(hash, target.clone());
        Ok(target)
    }

    /// Recursively deletes the base directory and resets the hash index.
    ///
    /// Used only when a full re-fetch is explicitly requested.
    ///
    /// # Errors
    ///
    /// [`StorageError::Io`] when deletion fails.
    #[instrument(skip(self))]
    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.hash_index.clear();
        if self.base_dir.exists() {
            info!(dir = %self.base_dir.display(), "clearing persisted catalog");
            fs::remove_dir_all(&self.base_dir).map_err(|e| StorageError::io(&self.base_dir, e))?;
        }
        Ok(())
    }
}

/// SHA-256 of a file's contents.
fn hash_file(path: &Path) -> Result<[u8; 32], StorageError> {
    let bytes = fs::read(path).map_err(|e| StorageError::io(path, e))?;
    Ok(Sha256::digest(&bytes).into())
}

/// Renames `source` to `target`, falling back to copy+remove when the rename
/// crosses file systems (temp files usually live on another mount).
fn move_file(source: &Path, target: &Path) -> Result<(), StorageError> {
    if fs::rename(source, target).is_ok() {
        return Ok(());
    }
    fs::copy(source, target).map_err(|e| StorageError::io(target, e))?;
    fs::remove_file(source).map_err(|e| StorageError::io(source, e))?;
    Ok(())
}

/// Picks a non-existing path by appending `-1`, `-2`, ... to the file stem.
///
/// Reached only when two playlists share a name but not content.
fn unique_target_path(candidate: &Path) -> PathBuf {
    if !candidate.exists() {
        return candidate.to_path_buf();
    }
    let stem = candidate
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = candidate
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let parent = candidate.parent().unwrap_or_else(|| Path::new("."));

    for suffix in 1.. {
        let next = parent.join(format!("{stem}-{suffix}{extension}"));
        if !next.exists() {
            return next;
        }
    }
    unreachable!()
}
