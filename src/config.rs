//! Configuration and settings management
//!
//! Loads settings from environment variables and defines the search/download constants.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application settings loaded from environment variables
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Telegram Bot API token (`TELEGRAM_BOT_TOKEN`)
    pub telegram_bot_token: String,

    /// Path or name of the yt-dlp executable
    #[serde(default = "default_ytdlp_path")]
    pub ytdlp_path: String,

    /// Parent directory for per-download scratch directories
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
}

fn default_ytdlp_path() -> String {
    "yt-dlp".to_string()
}

impl Settings {
    /// Create new settings by loading from environment and files
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use oxide_music_bot::config::Settings;
    ///
    /// let settings = Settings::new().expect("Failed to load configuration");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails or the bot token is missing.
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            // Not checked into git
            .add_source(File::with_name("config/local").required(false))
            // Eg.. `APP__YTDLP_PATH=/opt/yt-dlp ./target/app`
            .add_source(Environment::with_prefix("APP").separator("__"))
            // UPPER_SNAKE_CASE is mapped to snake_case; empty vars count as unset
            .add_source(Environment::default().ignore_empty(true))
            .build()?;

        let settings: Self = s.try_deserialize()?;

        if settings.telegram_bot_token.trim().is_empty() {
            return Err(ConfigError::Message(
                "TELEGRAM_BOT_TOKEN env var not set".to_string(),
            ));
        }

        Ok(settings)
    }

    /// Directory under which each download gets its own scratch directory
    #[must_use]
    pub fn download_root(&self) -> PathBuf {
        self.download_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}

/// Maximum number of search results offered to the user
pub const MAX_RESULTS: usize = 5;
/// Candidates longer than this (in seconds) are dropped from search results
pub const MAX_DURATION_SECS: u32 = 600; // 10 min cap
/// Target bitrate for extracted audio
pub const AUDIO_QUALITY_KBPS: u32 = 192;
/// Extension of the audio file produced by the fetcher
pub const AUDIO_EXTENSION: &str = "mp3";
/// MIME type of the delivered audio attachment
pub const AUDIO_MIME_TYPE: &str = "audio/mpeg";
/// Button labels show at most this many characters of a title
pub const TITLE_LABEL_LIMIT: usize = 50;
/// Callback payload prefix for "download this track" buttons
pub const DOWNLOAD_CALLBACK_PREFIX: &str = "dl:";
/// Prefix of per-track scratch directories
pub const DOWNLOAD_DIR_PREFIX: &str = "mbot_";
/// Base URL for canonical track links
pub const WATCH_URL_BASE: &str = "https://www.youtube.com/watch?v=";
