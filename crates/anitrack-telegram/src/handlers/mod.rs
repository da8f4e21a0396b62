//! Telegram update handlers.
//!
//! Only slash commands are acted on; everything else is ignored.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use crate::router::AppState;

mod commands;

/// Empty allowlist means everyone may drive the checker.
pub fn is_authorized(user_id: Option<i64>, allowed: &[i64]) -> bool {
    if allowed.is_empty() {
        return true;
    }
    user_id.is_some_and(|id| allowed.contains(&id))
}

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    if !text.starts_with('/') {
        return Ok(());
    }

    let user_id = msg.from().map(|u| u.id.0 as i64);
    if !is_authorized(user_id, &state.cfg.telegram_allowed_users) {
        let _ = bot
            .send_message(
                msg.chat.id,
                "Unauthorized. Contact the bot owner for access.",
            )
            .await;
        return Ok(());
    }

    commands::handle_command(bot, msg, state).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowlist() {
        assert!(is_authorized(None, &[]));
        assert!(is_authorized(Some(5), &[]));
        assert!(is_authorized(Some(5), &[1, 5]));
        assert!(!is_authorized(Some(6), &[1, 5]));
        assert!(!is_authorized(None, &[1, 5]));
    }
}
