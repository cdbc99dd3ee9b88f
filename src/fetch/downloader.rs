//! Playlist downloads with protocol fallback and a global failure budget.
//!
//! [`FileDownloader::download`] fetches a binary resource into a freshly created
//! temp file. A failed fetch does not abort the caller: it is counted against
//! the shared [`FailureBudget`] and reported as "resource unavailable" (`None`).
//! Only exhausting the budget is fatal.
//!
//! One fetch-level retry exists: a 400-class response to an insecure URL is
//! retried exactly once with the scheme upgraded to https (some playlist
//! endpoints reject plain-http requests that way). If the secure attempt also
//! fails, the pair counts as a single failed attempt.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

use super::budget::FailureBudget;
use crate::transport::{FetchError, Transport};

/// Prefix for downloaded playlist temp files.
const TEMP_FILE_PREFIX: &str = "ir_";

/// Errors that abort a download permanently.
///
/// Transient fetch failures never surface here — they become `Ok(None)`.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The run-wide failure budget has been exhausted.
    #[error("the limit of {limit} failed fetch attempts has been exceeded")]
    TooManyErrors {
        /// The configured failure limit.
        limit: u32,
        /// The fetch failure that pushed the count over the limit.
        #[source]
        source: FetchError,
    },

    /// Local file system error while materializing the download.
    #[error("IO error writing {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Downloads binary resources into temp files, one at a time.
pub struct FileDownloader {
    transport: Arc<dyn Transport>,
    budget: Arc<FailureBudget>,
    delay_between_downloads: Duration,
    temp_dir: Option<PathBuf>,
}

impl FileDownloader {
    /// Creates a downloader.
    ///
    /// `delay_between_downloads` is slept after every download attempt to avoid
    /// overloading the origin server; `Duration::ZERO` disables pacing.
    #[must_use]
    pub fn new(
        transport: Arc<dyn Transport>,
        budget: Arc<FailureBudget>,
        delay_between_downloads: Duration,
    ) -> Self {
        Self {
            transport,
            budget,
            delay_between_downloads,
            temp_dir: None,
        }
    }

    /// Places downloaded files in `dir` instead of the OS temp directory.
    ///
    /// The directory is created on first use.
    #[must_use]
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Returns the shared failure budget.
    #[must_use]
    pub fn budget(&self) -> &FailureBudget {
        &self.budget
    }

    /// Downloads `url` into a new temp file named `ir_*.{extension}`.
    ///
    /// Returns `Ok(None)` when the resource is unavailable: the fetch failed
    /// transiently (counted against the budget) or the response body was empty.
    /// No zero-length file is left behind.
    ///
    /// # Errors
    ///
    /// [`DownloadError::TooManyErrors`] once the failure budget is exhausted;
    /// [`DownloadError::Io`] on local file system failures.
    #[instrument(skip(self))]
    pub async fn download(
        &self,
        url: &str,
        extension: &str,
    ) -> Result<Option<PathBuf>, DownloadError> {
        let fetched = self.try_fetch(url).await?;
        self.pace().await;

        let Some(bytes) = fetched else {
            return Ok(None);
        };
        if bytes.is_empty() {
            debug!(url, "empty response body, resource not available");
            return Ok(None);
        }

        let path = write_temp_file(&bytes, extension, self.temp_dir.as_deref())?;
        debug!(url, path = %path.display(), bytes = bytes.len(), "playlist downloaded");
        Ok(Some(path))
    }

    /// Fetches the resource, applying the one-shot https fallback before the
    /// failure is charged to the budget.
    async fn try_fetch(&self, url: &str) -> Result<Option<Vec<u8>>, DownloadError> {
        match self.transport.fetch_binary(url).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(error) => {
                if let Some(secure_url) = upgraded_scheme(url, &error) {
                    debug!(url, secure_url, "retrying insecure fetch over https");
                    match self.transport.fetch_binary(&secure_url).await {
                        Ok(bytes) => return Ok(Some(bytes)),
                        // The fallback pair counts as one failed attempt.
                        Err(retry_error) => return self.record_failure(&secure_url, retry_error),
                    }
                }
                self.record_failure(url, error)
            }
        }
    }

    /// Charges one failure to the budget, turning exhaustion into a fatal error.
    fn record_failure(
        &self,
        url: &str,
        error: FetchError,
    ) -> Result<Option<Vec<u8>>, DownloadError> {
        warn!(url, error = %error, "unable to download file");
        if self.budget.record_failure() {
            Ok(None)
        } else {
            Err(DownloadError::TooManyErrors {
                limit: self.budget.limit(),
                source: error,
            })
        }
    }

    async fn pace(&self) {
        if !self.delay_between_downloads.is_zero() {
            tokio::time::sleep(self.delay_between_downloads).await;
        }
    }
}

/// Returns the https version of `url` when `error` is a 400-class status and
/// the URL uses plain http.
fn upgraded_scheme(url: &str, error: &FetchError) -> Option<String> {
    let status = error.status()?;
    if !(400..500).contains(&status) {
        return None;
    }
    let parsed = Url::parse(url).ok()?;
    if parsed.scheme() != "http" {
        return None;
    }
    Some(format!("https{}", url.strip_prefix("http")?))
}

/// Writes `bytes` to a new kept temp file with the given extension, in `dir`
/// when one is configured.
fn write_temp_file(
    bytes: &[u8],
    extension: &str,
    dir: Option<&Path>,
) -> Result<PathBuf, DownloadError> {
    let suffix = format!(".{extension}");
    let mut builder = tempfile::Builder::new();
    builder.prefix(TEMP_FILE_PREFIX).suffix(&suffix);
    let file = match dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).map_err(|e| DownloadError::Io {
                path: dir.to_path_buf(),
                source: e,
            })?;
            builder.tempfile_in(dir)
        }
        None => builder.tempfile(),
    }
    .map_err(|e| DownloadError::Io {
        path: dir.map_or_else(std::env::temp_dir, Path::to_path_buf),
        source: e,
    })?;

    std::fs::write(file.path(), bytes).map_err(|e| DownloadError::Io {
        path: file.path().to_path_buf(),
        source: e,
    })?;

    // The file outlives the handle; canonical storage takes ownership later.
    let (_, path) = file.keep().map_err(|e| DownloadError::Io {
        path: e.file.path().to_path_buf(),
        source: e.error,
    })?;
    Ok(path)
}
