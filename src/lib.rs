//! Telegram bot that searches music by free text and delivers the chosen
//! track as an MP3, using yt-dlp for search and audio extraction.

/// Telegram integration: handlers, views, transport and the interaction controller
pub mod bot;
/// Settings and constants
pub mod config;
/// Track model and the yt-dlp backend
pub mod media;
/// Per-user search session cache
pub mod session;
/// Text helpers
pub mod utils;
