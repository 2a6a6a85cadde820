//! Media search and audio extraction
//!
//! Defines the [`Track`] record and the two seams the bot depends on:
//! [`TrackSearcher`] (free-text query to candidate tracks) and
//! [`AudioFetcher`] (track URL to a local audio file).
//! The yt-dlp backed implementation lives in [`ytdlp`].

/// yt-dlp backed searcher and fetcher
pub mod ytdlp;

use crate::config::WATCH_URL_BASE;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use ytdlp::YtdlpClient;

/// A single search result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    /// Identifier, unique within one result set
    pub id: String,
    /// Display title
    pub title: String,
    /// Canonical watch URL
    pub url: String,
    /// Duration in seconds
    pub duration_secs: u32,
    /// Duration as `M:SS`
    pub duration_fmt: String,
}

impl Track {
    /// Build a track, deriving the canonical URL and formatted duration
    ///
    /// # Examples
    ///
    /// ```
    /// use oxide_music_bot::media::Track;
    ///
    /// let track = Track::new("fJ9rUzIMcZQ", "Bohemian Rhapsody", 355);
    /// assert_eq!(track.url, "https://www.youtube.com/watch?v=fJ9rUzIMcZQ");
    /// assert_eq!(track.duration_fmt, "5:55");
    /// ```
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>, duration_secs: u32) -> Self {
        let id = id.into();
        Self {
            url: format!("{WATCH_URL_BASE}{id}"),
            id,
            title: title.into(),
            duration_secs,
            duration_fmt: format_duration(duration_secs),
        }
    }
}

/// Format seconds as `M:SS` (minutes are not wrapped into hours)
///
/// # Examples
///
/// ```
/// use oxide_music_bot::media::format_duration;
/// assert_eq!(format_duration(59), "0:59");
/// assert_eq!(format_duration(600), "10:00");
/// ```
#[must_use]
pub fn format_duration(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Errors produced while fetching audio
#[derive(Error, Debug)]
pub enum FetchError {
    /// The downloader process could not be started
    #[error("failed to start downloader: {0}")]
    Spawn(#[source] std::io::Error),
    /// The downloader exited with a non-zero status
    #[error("downloader exited with {status}: {stderr}")]
    Process {
        /// Exit status as reported by the OS
        status: String,
        /// Tail of the downloader's stderr
        stderr: String,
    },
    /// The downloader succeeded but left no audio file behind
    #[error("MP3 not found after download")]
    FileNotProduced,
    /// Reading the destination directory failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Free-text search over the media catalogue
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TrackSearcher: Send + Sync {
    /// Return at most [`crate::config::MAX_RESULTS`] tracks no longer than
    /// [`crate::config::MAX_DURATION_SECS`].
    ///
    /// Failures are reported as an empty list.
    async fn search(&self, query: &str) -> Vec<Track>;
}

/// Audio extraction into a caller-provided directory
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AudioFetcher: Send + Sync {
    /// Download `url` as audio into `destination` and return the produced file.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Process`] if the downloader fails and
    /// [`FetchError::FileNotProduced`] if no audio file appears in `destination`.
    async fn fetch(&self, url: &str, destination: &Path) -> Result<PathBuf, FetchError>;
}
