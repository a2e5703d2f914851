//! Thrice-daily mood prompt broadcast.

use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use cron::Schedule;
use teloxide::prelude::*;
use teloxide::{ApiError, RequestError};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::handlers;
use crate::store::{Store, User};

/// Prompt times: 09:00, 14:00 and 20:00.
/// 7-field cron format: sec min hour day month dow year.
pub const PROMPT_SCHEDULE: &str = "0 0 9,14,20 * * * *";

/// Next prompt time strictly after the given instant.
pub fn next_prompt_time(after: DateTime<Tz>) -> Result<DateTime<Tz>, String> {
    let schedule =
        Schedule::from_str(PROMPT_SCHEDULE).map_err(|e| format!("Invalid cron: {e}"))?;
    schedule
        .after(&after)
        .next()
        .ok_or_else(|| "No future occurrence for cron".to_string())
}

/// Spawn the background prompt loop. Fires at each scheduled time in the
/// given timezone until the process exits.
pub fn spawn(bot: Bot, store: Arc<Store>, tz: Tz) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let now = Utc::now().with_timezone(&tz);
            let next = match next_prompt_time(now) {
                Ok(next) => next,
                Err(e) => {
                    warn!("Broadcast schedule error: {e}");
                    return;
                }
            };

            info!("⏰ Next mood prompt at {}", next.format("%Y-%m-%d %H:%M %Z"));
            let wait = next
                .signed_duration_since(Utc::now())
                .to_std()
                .unwrap_or(std::time::Duration::ZERO);
            tokio::time::sleep(wait).await;

            run_cycle(&bot, &store).await;
        }
    })
}

/// One broadcast cycle: enumerate users and send each the prompt.
async fn run_cycle(bot: &Bot, store: &Store) {
    let users = match store.list_users() {
        Ok(users) => users,
        Err(e) => {
            warn!("Skipping broadcast cycle: {e}");
            return;
        }
    };

    if users.is_empty() {
        info!("No users to prompt yet");
        return;
    }

    let (sent, failed) = send_prompts(&users, |chat_id| deliver_prompt(bot, chat_id)).await;
    info!("📣 Broadcast cycle done: {} prompted, {} failed", sent, failed);
}

/// Send the prompt to every user, one at a time. A failed delivery is logged
/// and never aborts the remaining sends. Returns (sent, failed).
pub async fn send_prompts<F, Fut>(users: &[User], send: F) -> (usize, usize)
where
    F: Fn(i64) -> Fut,
    Fut: Future<Output = Result<(), String>>,
{
    let mut sent = 0;
    let mut failed = 0;

    for user in users {
        match send(user.user_id).await {
            Ok(()) => {
                sent += 1;
            }
            Err(e) => {
                warn!(
                    "Failed to prompt {} ({}): {e}",
                    user.display_name(),
                    user.user_id
                );
                failed += 1;
            }
        }
    }

    (sent, failed)
}

/// A private chat's id is the user's id.
async fn deliver_prompt(bot: &Bot, chat_id: i64) -> Result<(), String> {
    handlers::send_mood_prompt(bot, ChatId(chat_id))
        .await
        .map_err(|e| match e {
            RequestError::Api(ApiError::BotBlocked) => "user has blocked the bot".to_string(),
            other => format!("Failed to send: {other}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::Mutex;

    fn make_user(user_id: i64) -> User {
        User {
            user_id,
            username: None,
            created_at: "2024-01-15 10:00:00".to_string(),
        }
    }

    #[test]
    fn test_schedule_parses() {
        assert!(Schedule::from_str(PROMPT_SCHEDULE).is_ok());
    }

    #[test]
    fn test_next_prompt_after_morning_is_afternoon() {
        let tz: Tz = "Europe/Berlin".parse().unwrap();
        let after = tz.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
        let next = next_prompt_time(after).unwrap();
        assert_eq!(next.format("%Y-%m-%d %H:%M").to_string(), "2024-01-15 14:00");
    }

    #[test]
    fn test_next_prompt_rolls_to_next_morning() {
        let tz: Tz = "Europe/Berlin".parse().unwrap();
        let after = tz.with_ymd_and_hms(2024, 1, 15, 21, 0, 0).unwrap();
        let next = next_prompt_time(after).unwrap();
        assert_eq!(next.format("%Y-%m-%d %H:%M").to_string(), "2024-01-16 09:00");
    }

    #[test]
    fn test_next_prompt_is_strictly_after() {
        let after = chrono_tz::UTC.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap();
        let next = next_prompt_time(after).unwrap();
        assert_eq!(next.format("%H:%M").to_string(), "14:00");
    }

    #[tokio::test]
    async fn test_one_failure_does_not_stop_the_cycle() {
        let users = vec![make_user(100), make_user(200), make_user(300)];
        let delivered = Arc::new(Mutex::new(Vec::new()));

        let send = {
            let delivered = delivered.clone();
            move |chat_id: i64| {
                let delivered = delivered.clone();
                async move {
                    if chat_id == 200 {
                        return Err("user has blocked the bot".to_string());
                    }
                    delivered.lock().unwrap().push(chat_id);
                    Ok(())
                }
            }
        };

        let (sent, failed) = send_prompts(&users, send).await;
        assert_eq!((sent, failed), (2, 1));
        assert_eq!(*delivered.lock().unwrap(), vec![100, 300]);
    }

    #[tokio::test]
    async fn test_empty_user_list() {
        let (sent, failed) = send_prompts(&[], |_| async { Ok(()) }).await;
        assert_eq!((sent, failed), (0, 0));
    }
}
