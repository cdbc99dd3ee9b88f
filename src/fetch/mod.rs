//! Resource fetching: bounded-failure playlist downloads.
//!
//! This module owns the run-wide failure budget (the circuit breaker against a
//! globally unreachable source) and the downloader that materializes playlist
//! files into temp storage, with a single http -> https fallback on 400-class
//! responses to insecure URLs.

mod budget;
mod downloader;

pub use budget::{DEFAULT_FAIL_LIMIT, FailureBudget};
pub use downloader::{DownloadError, FileDownloader};
