//! YT-DLP backend - track search and audio extraction via the yt-dlp CLI
//!
//! The tool is always invoked with an explicit argument vector (never through
//! a shell), so queries and URLs are passed through verbatim.

use super::{AudioFetcher, FetchError, Track, TrackSearcher};
use crate::config::{
    Settings, AUDIO_EXTENSION, AUDIO_QUALITY_KBPS, MAX_DURATION_SECS, MAX_RESULTS,
};
use async_trait::async_trait;
use serde::Deserialize;
use std::ffi::{OsStr, OsString};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Maximum characters of stderr carried into a [`FetchError::Process`]
const MAX_STDERR_LENGTH: usize = 300;

/// yt-dlp client implementing both [`TrackSearcher`] and [`AudioFetcher`]
#[derive(Debug, Clone)]
pub struct YtdlpClient {
    binary: String,
}

impl YtdlpClient {
    /// Create a client for the given yt-dlp executable
    #[must_use]
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Create a client from the configured executable path
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.ytdlp_path.clone())
    }

    async fn run<I, S>(&self, args: I) -> std::io::Result<Output>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
    }
}

#[async_trait]
impl TrackSearcher for YtdlpClient {
    async fn search(&self, query: &str) -> Vec<Track> {
        debug!(query = %query, "Executing yt-dlp search");

        let output = match self.run(search_args(query)).await {
            Ok(out) => out,
            Err(e) => {
                warn!(error = %e, binary = %self.binary, "Failed to start yt-dlp search");
                return Vec::new();
            }
        };

        if !output.status.success() {
            warn!(
                status = %output.status,
                stderr = %summarize_stderr(&String::from_utf8_lossy(&output.stderr)),
                "yt-dlp search failed"
            );
            return Vec::new();
        }

        let tracks = parse_search_output(&String::from_utf8_lossy(&output.stdout));
        info!(query = %query, results = tracks.len(), "yt-dlp search finished");
        tracks
    }
}

#[async_trait]
impl AudioFetcher for YtdlpClient {
    async fn fetch(&self, url: &str, destination: &Path) -> Result<PathBuf, FetchError> {
        debug!(url = %url, destination = %destination.display(), "Executing yt-dlp download");

        let output = self
            .run(fetch_args(url, destination))
            .await
            .map_err(FetchError::Spawn)?;

        if !output.status.success() {
            return Err(FetchError::Process {
                status: output.status.to_string(),
                stderr: summarize_stderr(&String::from_utf8_lossy(&output.stderr)),
            });
        }

        find_audio_file(destination).await
    }
}

/// Arguments for a flat search returning one JSON object per line.
///
/// Plain text goes through `ytsearch5`; a pasted video URL is resolved directly.
#[must_use]
pub fn search_args(query: &str) -> Vec<String> {
    vec![
        "--quiet".to_string(),
        "--no-warnings".to_string(),
        "--skip-download".to_string(),
        "--flat-playlist".to_string(),
        "--dump-json".to_string(),
        "--default-search".to_string(),
        format!("ytsearch{MAX_RESULTS}"),
        "--".to_string(),
        query.to_string(),
    ]
}

/// Arguments for extracting `url` as MP3 into `destination`
#[must_use]
pub fn fetch_args(url: &str, destination: &Path) -> Vec<OsString> {
    let template = destination.join("%(title)s.%(ext)s");
    vec![
        "--quiet".into(),
        "--no-warnings".into(),
        "--format".into(),
        "bestaudio/best".into(),
        "--extract-audio".into(),
        "--audio-format".into(),
        AUDIO_EXTENSION.into(),
        "--audio-quality".into(),
        format!("{AUDIO_QUALITY_KBPS}K").into(),
        "--output".into(),
        template.into_os_string(),
        "--".into(),
        url.into(),
    ]
}

#[derive(Debug, Deserialize)]
struct SearchEntry {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
}

impl SearchEntry {
    fn into_track(self) -> Option<Track> {
        let id = self.id.filter(|id| !id.is_empty())?;
        let title = self.title.unwrap_or_else(|| "Unknown".to_string());
        // Saturating cast; negative or NaN durations become 0
        let duration = self.duration.map_or(0, |d| d as u32);
        Some(Track::new(id, title, duration))
    }
}

/// Parse yt-dlp `--dump-json` output into tracks.
///
/// Blank and malformed lines are skipped, entries without an id are dropped,
/// tracks longer than [`MAX_DURATION_SECS`] are excluded and at most
/// [`MAX_RESULTS`] tracks are returned.
///
/// # Examples
///
/// ```
/// use oxide_music_bot::media::ytdlp::parse_search_output;
///
/// let out = "{\"id\":\"a\",\"title\":\"Song\",\"duration\":200}\nnot json\n";
/// let tracks = parse_search_output(out);
/// assert_eq!(tracks.len(), 1);
/// assert_eq!(tracks[0].duration_fmt, "3:20");
/// ```
#[must_use]
pub fn parse_search_output(stdout: &str) -> Vec<Track> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match serde_json::from_str::<SearchEntry>(line) {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!(error = %e, "Skipping malformed yt-dlp output line");
                None
            }
        })
        .filter_map(SearchEntry::into_track)
        .filter(|track| track.duration_secs <= MAX_DURATION_SECS)
        .take(MAX_RESULTS)
        .collect()
}

/// Locate the extracted audio file inside `dir`
///
/// # Errors
///
/// Returns [`FetchError::FileNotProduced`] if the directory holds no audio
/// file (or no longer exists) and [`FetchError::Io`] on other read failures.
pub async fn find_audio_file(dir: &Path) -> Result<PathBuf, FetchError> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(FetchError::FileNotProduced),
        Err(e) => return Err(FetchError::Io(e)),
    };

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_audio = path
            .extension()
            .and_then(OsStr::to_str)
            .is_some_and(|ext| ext.eq_ignore_ascii_case(AUDIO_EXTENSION));
        if is_audio && entry.file_type().await?.is_file() {
            return Ok(path);
        }
    }

    Err(FetchError::FileNotProduced)
}

/// Reduce yt-dlp stderr to the most useful line.
///
/// Prefers the last `ERROR:` line, otherwise the last non-empty line.
fn summarize_stderr(stderr: &str) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let chosen = lines
        .iter()
        .rev()
        .find(|line| line.starts_with("ERROR:"))
        .or_else(|| lines.last())
        .copied()
        .unwrap_or("no output");

    crate::utils::truncate_str(chosen, MAX_STDERR_LENGTH)
}
