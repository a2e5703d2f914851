//! Conversation endpoints: commands, menu buttons, and the inline scale.

use std::sync::Arc;

use chrono::{Duration, Utc};
use teloxide::prelude::*;
use teloxide::types::User as TgUser;
use teloxide::utils::command::BotCommands;
use tracing::{info, warn};

use crate::keyboards;
use crate::mood::{Bucket, MoodValue};
use crate::stats::{self, WeeklyStats};
use crate::store::Store;

/// Commands surfaced in the Telegram command menu.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "These commands are supported:")]
pub enum Command {
    #[command(description = "start mood tracking")]
    Start,
    #[command(description = "your last 7 days")]
    Stats,
}

pub const WELCOME_TEXT: &str = "Hi! I'm your mood tracker. 🐦 \
    I'll check in on how you're feeling three times a day, and you can add \
    an entry yourself anytime using the buttons below.\n\n\
    Available commands:\n\
    /stats - view your last 7 days";

/// Prompt sent by the scheduler and by the "Add mood" button.
pub const MOOD_PROMPT: &str = "How's your mood right now?";

const REGISTER_ERROR_TEXT: &str =
    "Something went wrong on my end. Please try /start again in a bit.";
const SAVE_ERROR_TEXT: &str = "Couldn't save that entry. Please try again.";

pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    store: Arc<Store>,
) -> ResponseResult<()> {
    let user = match msg.from {
        Some(ref u) => u,
        None => return Ok(()),
    };

    match cmd {
        Command::Start => {
            if let Err(e) = store.create_user(user.id.0 as i64, user.username.as_deref()) {
                warn!("Failed to register user {}: {e}", user.id);
                bot.send_message(msg.chat.id, REGISTER_ERROR_TEXT).await?;
                return Ok(());
            }
            info!("👤 /start from {} ({})", display_name(user), user.id);
            send_welcome(&bot, msg.chat.id).await?;
        }
        Command::Stats => {
            greet_if_new(&bot, &store, msg.chat.id, user).await?;
            send_weekly_stats(&bot, &store, msg.chat.id, user.id.0 as i64).await?;
        }
    }

    Ok(())
}

pub async fn handle_text(bot: Bot, msg: Message, store: Arc<Store>) -> ResponseResult<()> {
    let user = match msg.from {
        Some(ref u) => u,
        None => return Ok(()),
    };
    let text = match msg.text() {
        Some(t) => t,
        None => return Ok(()),
    };

    greet_if_new(&bot, &store, msg.chat.id, user).await?;

    match text {
        keyboards::ADD_MOOD_LABEL => {
            send_mood_prompt(&bot, msg.chat.id).await?;
        }
        keyboards::VIEW_STATS_LABEL => {
            send_weekly_stats(&bot, &store, msg.chat.id, user.id.0 as i64).await?;
        }
        // Anything else is free text we don't react to.
        _ => {}
    }

    Ok(())
}

pub async fn handle_callback(bot: Bot, q: CallbackQuery, store: Arc<Store>) -> ResponseResult<()> {
    // Always answer, so the client stops its spinner even for stale buttons.
    bot.answer_callback_query(q.id.clone()).await?;

    let message = match q.regular_message() {
        Some(m) => m,
        None => return Ok(()),
    };

    greet_if_new(&bot, &store, message.chat.id, &q.from).await?;

    let score = match q.data.as_deref().and_then(parse_mood_callback) {
        Some(s) => s,
        None => return Ok(()),
    };

    let user_id = q.from.id.0 as i64;
    let reply = match store.save_entry(user_id, &MoodValue::Numeric(score)) {
        Ok(()) => {
            info!("📝 Saved mood {}/10 for user {}", score, user_id);
            confirmation_text(score)
        }
        Err(e) => {
            warn!("Failed to save mood for user {}: {e}", user_id);
            SAVE_ERROR_TEXT.to_string()
        }
    };

    // Replace the scale in place so the chat keeps one message per check-in.
    bot.edit_message_text(message.chat.id, message.id, reply)
        .await?;

    Ok(())
}

/// Send the mood prompt with the inline scale. Also the broadcast payload,
/// hence the plain `RequestError` so callers can inspect delivery failures.
pub async fn send_mood_prompt(
    bot: &Bot,
    chat_id: ChatId,
) -> Result<(), teloxide::RequestError> {
    bot.send_message(chat_id, MOOD_PROMPT)
        .reply_markup(keyboards::mood_scale())
        .await?;
    Ok(())
}

async fn send_welcome(bot: &Bot, chat_id: ChatId) -> ResponseResult<()> {
    bot.send_message(chat_id, WELCOME_TEXT)
        .reply_markup(keyboards::main_menu())
        .await?;
    Ok(())
}

/// First contact: register unknown users and greet them before handling
/// whatever they sent. A failed registration is logged and never blocks the
/// event itself.
async fn greet_if_new(
    bot: &Bot,
    store: &Store,
    chat_id: ChatId,
    user: &TgUser,
) -> ResponseResult<()> {
    if store.get_user(user.id.0 as i64).is_some() {
        return Ok(());
    }

    if let Err(e) = store.create_user(user.id.0 as i64, user.username.as_deref()) {
        warn!("Failed to register user {}: {e}", user.id);
        return Ok(());
    }

    info!("👤 First contact from {} ({})", display_name(user), user.id);
    send_welcome(bot, chat_id).await
}

async fn send_weekly_stats(
    bot: &Bot,
    store: &Store,
    chat_id: ChatId,
    user_id: i64,
) -> ResponseResult<()> {
    let cutoff = Utc::now() - Duration::days(7);
    let entries = store.entries_since(user_id, cutoff).unwrap_or_else(|e| {
        warn!("Failed to load entries for user {}: {e}", user_id);
        Vec::new()
    });

    let report = render_weekly_report(&stats::aggregate(&entries));
    bot.send_message(chat_id, report).await?;
    Ok(())
}

/// Parse inline-scale callback data into a score. Anything that isn't an
/// integer in 0-10 is rejected.
fn parse_mood_callback(data: &str) -> Option<u8> {
    data.parse::<u8>().ok().filter(|n| *n <= 10)
}

fn confirmation_text(score: u8) -> String {
    format!(
        "Recorded your mood: {}/10 {}\nAdd another entry whenever you like!",
        score,
        Bucket::of(score).emoji()
    )
}

fn render_weekly_report(stats: &WeeklyStats) -> String {
    if stats.total_entries == 0 {
        return format!(
            "No mood entries in the last 7 days yet. Tap \"{}\" to record your first one!",
            keyboards::ADD_MOOD_LABEL
        );
    }

    format!(
        "📊 Your last 7 days\n\n\
         Entries: {}\n\
         Average mood: {:.1}/10\n\n\
         😊 High (7-10): {}\n\
         😐 Mid (4-6): {}\n\
         😞 Low (0-3): {}",
        stats.total_entries,
        stats.average_mood,
        stats.distribution.high,
        stats.distribution.mid,
        stats.distribution.low,
    )
}

fn display_name(user: &TgUser) -> &str {
    user.username.as_deref().unwrap_or(&user.first_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mood::{LegacyMood, MoodEntry};

    #[test]
    fn test_parse_mood_callback() {
        assert_eq!(parse_mood_callback("0"), Some(0));
        assert_eq!(parse_mood_callback("7"), Some(7));
        assert_eq!(parse_mood_callback("10"), Some(10));
        assert_eq!(parse_mood_callback("11"), None);
        assert_eq!(parse_mood_callback("-1"), None);
        assert_eq!(parse_mood_callback("good"), None);
        assert_eq!(parse_mood_callback(""), None);
    }

    #[test]
    fn test_confirmation_carries_bucket_emoji() {
        assert!(confirmation_text(2).contains("2/10 😞"));
        assert!(confirmation_text(5).contains("5/10 😐"));
        assert!(confirmation_text(9).contains("9/10 😊"));
    }

    #[test]
    fn test_report_without_data() {
        let report = render_weekly_report(&stats::aggregate(&[]));
        assert!(report.contains("No mood entries"));
        assert!(!report.contains("Average"));
    }

    #[test]
    fn test_report_with_mixed_week() {
        let entries = vec![
            entry(1, MoodValue::Numeric(2)),
            entry(2, MoodValue::Numeric(9)),
            entry(3, MoodValue::Legacy(LegacyMood::Good)),
        ];
        let report = render_weekly_report(&stats::aggregate(&entries));
        assert!(report.contains("Entries: 3"));
        assert!(report.contains("Average mood: 6.3/10"));
        assert!(report.contains("😊 High (7-10): 2"));
        assert!(report.contains("😐 Mid (4-6): 0"));
        assert!(report.contains("😞 Low (0-3): 1"));
    }

    fn entry(id: i64, value: MoodValue) -> MoodEntry {
        MoodEntry {
            id,
            user_id: 100,
            value,
            timestamp: "2024-01-15 10:00:00".to_string(),
        }
    }
}
