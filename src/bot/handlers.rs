//! Telegram endpoints for commands, search text and result buttons

use crate::bot::controller::MusicController;
use crate::bot::transport::StatusMessage;
use crate::bot::views::{DefaultMusicView, MusicView};
use anyhow::Result;
use std::sync::Arc;
use teloxide::{
    prelude::*,
    types::{CallbackQuery, ParseMode},
    utils::command::BotCommands,
};
use tracing::{debug, info, warn};

/// Safe extraction of user ID from a message.
/// Returns 0 if the user information is missing.
pub fn get_user_id_safe(msg: &Message) -> i64 {
    msg.from.as_ref().map_or(0, |u| u.id.0.cast_signed())
}

/// Supported commands for the bot
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
pub enum Command {
    /// Show the welcome message
    #[command(description = "Start the bot.")]
    Start,
    /// Show usage help
    #[command(description = "How to use the bot.")]
    Help,
}

/// Start handler
///
/// # Errors
///
/// Returns an error if the welcome message cannot be sent.
pub async fn start(bot: Bot, msg: Message) -> Result<()> {
    info!("User {} initiated /start command.", get_user_id_safe(&msg));
    bot.send_message(msg.chat.id, DefaultMusicView::welcome_message())
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

/// Help handler
///
/// # Errors
///
/// Returns an error if the help message cannot be sent.
pub async fn help(bot: Bot, msg: Message) -> Result<()> {
    bot.send_message(msg.chat.id, DefaultMusicView::help_message())
        .await?;
    Ok(())
}

/// Whether a message is a search query rather than a command
#[must_use]
pub fn is_search_text(msg: &Message) -> bool {
    msg.text()
        .is_some_and(|text| !text.trim().is_empty() && !text.starts_with('/'))
}

/// Text message handler: runs the search in a detached worker
pub fn handle_text(msg: &Message, controller: Arc<MusicController>) {
    let Some(query) = msg.text().map(ToString::to_string) else {
        return;
    };
    let chat_id = msg.chat.id.0;
    let user_id = get_user_id_safe(msg);

    tokio::spawn(async move {
        let outcome = controller.handle_query(chat_id, user_id, &query).await;
        debug!(user_id, chat_id, ?outcome, "Search interaction finished");
    });
}

/// Inline button handler: acknowledges, then downloads in a detached worker
///
/// # Errors
///
/// Never fails for download problems; only the callback acknowledgement is logged.
pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    controller: Arc<MusicController>,
) -> Result<()> {
    // Stops the client-side loading indicator whatever happens next
    if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
        warn!(error = %e, "Failed to answer callback query");
    }

    let Some(data) = q.data.clone() else {
        return Ok(());
    };
    let Some(message) = q.message.as_ref() else {
        debug!("Callback without originating message");
        return Ok(());
    };

    let status = StatusMessage {
        chat_id: message.chat().id.0,
        message_id: message.id().0,
    };
    let user_id = q.from.id.0.cast_signed();

    tokio::spawn(async move {
        let outcome = controller.handle_selection(status, user_id, &data).await;
        debug!(user_id, ?outcome, "Download interaction finished");
    });

    Ok(())
}
