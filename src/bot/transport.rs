//! Chat transport seam
//!
//! [`ChatTransport`] is everything the controller needs from the chat
//! platform. [`TelegramTransport`] implements it on top of teloxide; tests
//! substitute a recording implementation.

use crate::bot::views::{entries_keyboard, SelectableEntry};
use anyhow::Result;
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ChatId, InputFile, MessageId, ParseMode};
use tracing::debug;

/// A status message the bot owns and keeps rewriting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusMessage {
    /// Chat the message lives in
    pub chat_id: i64,
    /// Message id within the chat
    pub message_id: i32,
}

/// An audio attachment ready for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioUpload {
    /// File contents
    pub bytes: Vec<u8>,
    /// MIME type of the contents
    pub mime_type: String,
    /// File name shown to the user
    pub file_name: String,
    /// Caption under the attachment
    pub caption: String,
    /// Track title metadata
    pub title: String,
}

/// Outbound operations used by the interaction controller
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send a new HTML status message
    async fn send_status(&self, chat_id: i64, text: &str) -> Result<StatusMessage>;

    /// Rewrite a status message, dropping any keyboard
    async fn edit_status(&self, status: StatusMessage, text: &str) -> Result<()>;

    /// Rewrite a status message into a list of selectable entries
    async fn show_choices(
        &self,
        status: StatusMessage,
        text: &str,
        entries: &[SelectableEntry],
    ) -> Result<()>;

    /// Remove a status message
    async fn delete_status(&self, status: StatusMessage) -> Result<()>;

    /// Upload an audio attachment
    async fn send_audio(&self, chat_id: i64, audio: AudioUpload) -> Result<()>;
}

/// Telegram implementation of [`ChatTransport`]
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    /// Create a transport around a bot handle
    #[must_use]
    pub const fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

/// Telegram rejects edits that change nothing; that is not a failure for us
fn ignore_not_modified(result: Result<Message, teloxide::RequestError>) -> Result<()> {
    const ERROR_NOT_MODIFIED: &str = "message is not modified";

    match result {
        Ok(_) => Ok(()),
        Err(e) if e.to_string().contains(ERROR_NOT_MODIFIED) => {
            debug!("Message update skipped: {e}");
            Ok(())
        }
        Err(e) => Err(anyhow::anyhow!("Telegram edit error: {e}")),
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn send_status(&self, chat_id: i64, text: &str) -> Result<StatusMessage> {
        let msg = self
            .bot
            .send_message(ChatId(chat_id), text)
            .parse_mode(ParseMode::Html)
            .await
            .map_err(|e| anyhow::anyhow!("Telegram send error: {e}"))?;

        Ok(StatusMessage {
            chat_id: msg.chat.id.0,
            message_id: msg.id.0,
        })
    }

    async fn edit_status(&self, status: StatusMessage, text: &str) -> Result<()> {
        let result = self
            .bot
            .edit_message_text(ChatId(status.chat_id), MessageId(status.message_id), text)
            .parse_mode(ParseMode::Html)
            .await;
        ignore_not_modified(result)
    }

    async fn show_choices(
        &self,
        status: StatusMessage,
        text: &str,
        entries: &[SelectableEntry],
    ) -> Result<()> {
        let result = self
            .bot
            .edit_message_text(ChatId(status.chat_id), MessageId(status.message_id), text)
            .parse_mode(ParseMode::Html)
            .reply_markup(entries_keyboard(entries))
            .await;
        ignore_not_modified(result)
    }

    async fn delete_status(&self, status: StatusMessage) -> Result<()> {
        self.bot
            .delete_message(ChatId(status.chat_id), MessageId(status.message_id))
            .await
            .map_err(|e| anyhow::anyhow!("Telegram delete error: {e}"))?;
        Ok(())
    }

    async fn send_audio(&self, chat_id: i64, audio: AudioUpload) -> Result<()> {
        debug!(
            file_name = %audio.file_name,
            mime_type = %audio.mime_type,
            size = audio.bytes.len(),
            "Uploading audio"
        );

        // teloxide derives the multipart content type from the file name
        let input_file = InputFile::memory(audio.bytes).file_name(audio.file_name);
        self.bot
            .send_audio(ChatId(chat_id), input_file)
            .caption(audio.caption)
            .title(audio.title)
            .await
            .map_err(|e| anyhow::anyhow!("Telegram send audio error: {e}"))?;
        Ok(())
    }
}
