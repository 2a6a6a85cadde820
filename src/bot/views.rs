//! Music bot UI components
//!
//! Contains status texts, result-list labels, callback payloads and keyboards.
//! All texts are Telegram HTML; interpolated values are escaped here.

use crate::config::{DOWNLOAD_CALLBACK_PREFIX, TITLE_LABEL_LIMIT};
use crate::media::Track;
use crate::utils::truncate_graphemes;
use html_escape::encode_text;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

// ─────────────────────────────────────────────────────────────────────────────
// Callback payloads
// ─────────────────────────────────────────────────────────────────────────────

/// Build the opaque callback payload for a track's download button
#[must_use]
pub fn download_payload(track_id: &str) -> String {
    format!("{DOWNLOAD_CALLBACK_PREFIX}{track_id}")
}

/// Extract the track id from a download payload, `None` for foreign payloads
///
/// # Examples
///
/// ```
/// use oxide_music_bot::bot::views::parse_download_payload;
/// assert_eq!(parse_download_payload("dl:abc"), Some("abc"));
/// assert_eq!(parse_download_payload("reset_task"), None);
/// ```
#[must_use]
pub fn parse_download_payload(data: &str) -> Option<&str> {
    data.strip_prefix(DOWNLOAD_CALLBACK_PREFIX)
}

/// A labeled button carrying an opaque payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectableEntry {
    /// Button text
    pub label: String,
    /// Callback payload
    pub payload: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Trait definition
// ─────────────────────────────────────────────────────────────────────────────

/// Texts shown during a search/download interaction
pub trait MusicView {
    /// Reply to `/start`
    fn welcome_message() -> &'static str;

    /// Reply to `/help`
    fn help_message() -> &'static str;

    /// Placeholder while the search runs
    fn searching(query: &str) -> String;

    /// Search finished without candidates
    fn no_results() -> &'static str;

    /// Header above the list of selectable results
    fn results_header(count: usize, query: &str) -> String;

    /// Selected track is not in the user's current session
    fn session_expired() -> &'static str;

    /// Download in progress
    fn downloading(title: &str) -> String;

    /// Upload in progress
    fn sending(title: &str) -> String;

    /// Download or delivery failed
    fn download_failed(reason: &str) -> String;

    /// Caption attached to the delivered audio (plain text)
    fn audio_caption(title: &str) -> String;

    /// Button label for a search result (plain text)
    fn track_label(track: &Track) -> String;
}

// ─────────────────────────────────────────────────────────────────────────────
// Default implementation
// ─────────────────────────────────────────────────────────────────────────────

/// Default English implementation of `MusicView`
pub struct DefaultMusicView;

impl MusicView for DefaultMusicView {
    fn welcome_message() -> &'static str {
        "🎵 <b>Music Bot</b>\n\n\
         Type a song name or artist and I'll search YouTube.\n\n\
         Example: <code>Bohemian Rhapsody Queen</code>"
    }

    fn help_message() -> &'static str {
        "Send any text to search for music.\nTap a result to download and receive the MP3. 🎧"
    }

    fn searching(query: &str) -> String {
        format!("🔍 Searching for <b>{}</b>…", encode_text(query))
    }

    fn no_results() -> &'static str {
        "❌ No results found. Try a different search term."
    }

    fn results_header(count: usize, query: &str) -> String {
        format!(
            "Found <b>{count}</b> results for <i>{}</i>.\nChoose one to download 👇",
            encode_text(query)
        )
    }

    fn session_expired() -> &'static str {
        "⚠️ Session expired. Please search again."
    }

    fn downloading(title: &str) -> String {
        format!(
            "⬇️ Downloading <b>{}</b>…\nThis may take a moment.",
            encode_text(title)
        )
    }

    fn sending(title: &str) -> String {
        format!("📤 Sending <b>{}</b>…", encode_text(title))
    }

    fn download_failed(reason: &str) -> String {
        format!("❌ Download failed: {}", encode_text(reason))
    }

    fn audio_caption(title: &str) -> String {
        format!("🎵 {title}")
    }

    fn track_label(track: &Track) -> String {
        format!(
            "🎵 {}  [{}]",
            truncate_graphemes(&track.title, TITLE_LABEL_LIMIT),
            track.duration_fmt
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Keyboards
// ─────────────────────────────────────────────────────────────────────────────

/// One selectable entry per track, in result order
#[must_use]
pub fn track_entries<V: MusicView>(tracks: &[Track]) -> Vec<SelectableEntry> {
    tracks
        .iter()
        .map(|track| SelectableEntry {
            label: V::track_label(track),
            payload: download_payload(&track.id),
        })
        .collect()
}

/// Inline keyboard with one entry per row
#[must_use]
pub fn entries_keyboard(entries: &[SelectableEntry]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(entries.iter().map(|entry| {
        vec![InlineKeyboardButton::callback(
            entry.label.clone(),
            entry.payload.clone(),
        )]
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_round_trip() {
        let payload = download_payload("fJ9rUzIMcZQ");
        assert_eq!(payload, "dl:fJ9rUzIMcZQ");
        assert_eq!(parse_download_payload(&payload), Some("fJ9rUzIMcZQ"));
        assert_eq!(parse_download_payload("retry_no_loop"), None);
        assert_eq!(parse_download_payload("DL:abc"), None);
    }

    #[test]
    fn test_track_label_truncates_title_only() {
        let long_title = "x".repeat(80);
        let track = Track::new("id", long_title.clone(), 599);
        let label = DefaultMusicView::track_label(&track);

        assert_eq!(label, format!("🎵 {}  [9:59]", "x".repeat(50)));
        // The record keeps the full title for captions
        assert_eq!(track.title, long_title);
        assert_eq!(
            DefaultMusicView::audio_caption(&track.title),
            format!("🎵 {long_title}")
        );
    }

    #[test]
    fn test_user_text_is_escaped() {
        let text = DefaultMusicView::searching("<b>AC/DC</b> & co");
        assert!(text.contains("&lt;b&gt;AC/DC&lt;/b&gt; &amp; co"));

        let failed = DefaultMusicView::download_failed("exit <1>");
        assert_eq!(failed, "❌ Download failed: exit &lt;1&gt;");
    }

    #[test]
    fn test_entries_keyboard_one_row_per_track() {
        let tracks = vec![Track::new("a", "A", 60), Track::new("b", "B", 61)];
        let entries = track_entries::<DefaultMusicView>(&tracks);
        assert_eq!(entries[1].payload, "dl:b");
        assert_eq!(entries[1].label, "🎵 B  [1:01]");

        let keyboard = entries_keyboard(&entries);
        assert_eq!(keyboard.inline_keyboard.len(), 2);
        assert!(keyboard.inline_keyboard.iter().all(|row| row.len() == 1));
    }
}
