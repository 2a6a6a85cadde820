//! Search-and-download interaction controller
//!
//! One interaction per inbound event:
//!
//! - text: `Searching` → `NoResults` | `ResultsShown`
//! - selection: `SessionExpired` | `Downloading` → `Delivered` | `Failed`
//!
//! Each call runs to completion inside its own worker; nothing is returned
//! to the dispatcher except an [`Outcome`] for logging. Transport failures are
//! logged and never propagated.

use crate::bot::transport::{AudioUpload, ChatTransport, StatusMessage};
use crate::bot::views::{parse_download_payload, track_entries, DefaultMusicView, MusicView};
use crate::config::{AUDIO_MIME_TYPE, DOWNLOAD_DIR_PREFIX};
use crate::media::{AudioFetcher, Track, TrackSearcher};
use crate::session::SessionCache;
use anyhow::{Context, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tracing::{debug, error, info, warn};

/// Terminal state reached by one interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Event did not concern this controller (empty text, foreign payload)
    Ignored,
    /// Search returned nothing (or failed)
    NoResults,
    /// Result list shown with `count` entries
    ResultsShown {
        /// Number of selectable entries
        count: usize,
    },
    /// Selected track was not in the user's session
    SessionExpired,
    /// Audio delivered and status message removed
    Delivered,
    /// Download or delivery failed with the given description
    Failed(String),
    /// The initial status message could not be sent
    TransportFailed,
}

/// Drives searches and downloads for all users
pub struct MusicController {
    transport: Arc<dyn ChatTransport>,
    searcher: Arc<dyn TrackSearcher>,
    fetcher: Arc<dyn AudioFetcher>,
    sessions: Arc<SessionCache>,
    download_root: PathBuf,
}

impl MusicController {
    /// Create a controller
    #[must_use]
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        searcher: Arc<dyn TrackSearcher>,
        fetcher: Arc<dyn AudioFetcher>,
        sessions: Arc<SessionCache>,
        download_root: PathBuf,
    ) -> Self {
        Self {
            transport,
            searcher,
            fetcher,
            sessions,
            download_root,
        }
    }

    #[cfg(test)]
    pub(crate) fn sessions(&self) -> &Arc<SessionCache> {
        &self.sessions
    }

    /// Create a new, empty scratch directory `<root>/mbot_<id>_<random>`.
    ///
    /// Never reuses a directory, so leftovers from an interrupted download
    /// or a concurrent download of the same track are never picked up.
    async fn create_download_dir(&self, track_id: &str) -> Result<TempDir> {
        tokio::fs::create_dir_all(&self.download_root)
            .await
            .context("failed to create download root")?;

        tempfile::Builder::new()
            .prefix(&format!("{DOWNLOAD_DIR_PREFIX}{track_id}_"))
            .tempdir_in(&self.download_root)
            .context("failed to create download directory")
    }

    /// Handle an inbound free-text query
    pub async fn handle_query(&self, chat_id: i64, user_id: i64, query: &str) -> Outcome {
        let query = query.trim();
        if query.is_empty() {
            return Outcome::Ignored;
        }

        let status = match self
            .transport
            .send_status(chat_id, &DefaultMusicView::searching(query))
            .await
        {
            Ok(status) => status,
            Err(e) => {
                error!(user_id, chat_id, error = %e, "Failed to send searching placeholder");
                return Outcome::TransportFailed;
            }
        };

        info!(user_id, chat_id, query = %query, "Searching");
        let results = self.searcher.search(query).await;

        if results.is_empty() {
            info!(user_id, chat_id, "No results");
            self.edit(status, DefaultMusicView::no_results()).await;
            return Outcome::NoResults;
        }

        self.sessions.store(user_id, &results).await;

        let entries = track_entries::<DefaultMusicView>(&results);
        let header = DefaultMusicView::results_header(entries.len(), query);
        if let Err(e) = self.transport.show_choices(status, &header, &entries).await {
            error!(user_id, chat_id, error = %e, "Failed to show search results");
            return Outcome::TransportFailed;
        }

        info!(user_id, chat_id, count = entries.len(), "Results shown");
        Outcome::ResultsShown {
            count: entries.len(),
        }
    }

    /// Handle a button press on a result list.
    ///
    /// The callback must already be acknowledged by the caller.
    pub async fn handle_selection(
        &self,
        status: StatusMessage,
        user_id: i64,
        payload: &str,
    ) -> Outcome {
        let Some(track_id) = parse_download_payload(payload) else {
            debug!(user_id, payload = %payload, "Ignoring foreign callback payload");
            return Outcome::Ignored;
        };

        let Some(track) = self.sessions.fetch(user_id, track_id).await else {
            info!(user_id, track_id = %track_id, "Selection not in session");
            self.edit(status, DefaultMusicView::session_expired()).await;
            return Outcome::SessionExpired;
        };

        self.edit(status, &DefaultMusicView::downloading(&track.title))
            .await;
        info!(user_id, track_id = %track.id, "Downloading");

        let result = match self.create_download_dir(&track.id).await {
            Ok(dir) => {
                let result = self.download_and_deliver(status, &track, dir.path()).await;
                remove_download_dir(dir).await;
                result
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                if let Err(e) = self.transport.delete_status(status).await {
                    warn!(user_id, error = %e, "Failed to delete status message");
                }
                info!(user_id, track_id = %track.id, "Delivered");
                Outcome::Delivered
            }
            Err(e) => {
                let reason = format!("{e:#}");
                warn!(user_id, track_id = %track.id, error = %reason, "Download failed");
                self.edit(status, &DefaultMusicView::download_failed(&reason))
                    .await;
                Outcome::Failed(reason)
            }
        }
    }

    async fn download_and_deliver(
        &self,
        status: StatusMessage,
        track: &Track,
        dir: &Path,
    ) -> Result<()> {
        let file = self.fetcher.fetch(&track.url, dir).await?;

        self.edit(status, &DefaultMusicView::sending(&track.title))
            .await;

        let bytes = tokio::fs::read(&file)
            .await
            .context("failed to read downloaded file")?;
        let file_name = file
            .file_name()
            .map_or_else(|| "audio.mp3".to_string(), |n| n.to_string_lossy().to_string());

        debug!(track_id = %track.id, file_name = %file_name, size = bytes.len(), "Sending audio");
        self.transport
            .send_audio(
                status.chat_id,
                AudioUpload {
                    bytes,
                    mime_type: AUDIO_MIME_TYPE.to_string(),
                    file_name,
                    caption: DefaultMusicView::audio_caption(&track.title),
                    title: track.title.clone(),
                },
            )
            .await
    }

    async fn edit(&self, status: StatusMessage, text: &str) {
        if let Err(e) = self.transport.edit_status(status, text).await {
            warn!(
                chat_id = status.chat_id,
                message_id = status.message_id,
                error = %e,
                "Failed to edit status message"
            );
        }
    }
}

async fn remove_download_dir(dir: TempDir) {
    let path = dir.path().to_path_buf();
    match tokio::task::spawn_blocking(move || dir.close()).await {
        Ok(Ok(())) => debug!(dir = %path.display(), "Removed download directory"),
        Ok(Err(e)) if e.kind() == ErrorKind::NotFound => {}
        Ok(Err(e)) => warn!(dir = %path.display(), error = %e, "Failed to remove download directory"),
        Err(e) => warn!(dir = %path.display(), error = %e, "Download directory cleanup task failed"),
    }
}
