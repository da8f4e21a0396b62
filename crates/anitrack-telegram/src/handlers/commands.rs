use std::{sync::Arc, time::Duration};

use teloxide::{prelude::*, types::ParseMode};
use tracing::warn;

use anitrack_core::{
    domain::{ChatId, SinkRef},
    formatting::escape_html,
    scheduler::{PollState, StartOutcome, StopOutcome},
};

use crate::router::AppState;

const HELP: &str = "🤖 <b>Anime Release Checker</b>\n\n\
<b>📋 Commands:</b>\n\
/start - Start checking and notify this chat\n\
/stop - Stop the checker\n\
/status - Show checker status\n\
/setchannel - Send notifications to this chat\n\
/check - Run a check right now\n\
/clear - Forget tracked anime (next check reports everything)\n\
/help - Show this message";

fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

fn format_duration(d: Duration) -> String {
    let seconds = d.as_secs();
    let hours = seconds / 3600;
    let mins = (seconds % 3600) / 60;
    let secs = seconds % 60;
    match (hours, mins, secs) {
        (h, 0, 0) if h > 0 => format!("{h}h"),
        (h, m, _) if h > 0 => format!("{h}h {m}m"),
        (0, m, 0) if m > 0 => format!("{m}m"),
        (0, m, s) if m > 0 => format!("{m}m {s}s"),
        _ => format!("{secs}s"),
    }
}

fn chat_label(msg: &Message) -> String {
    if let Some(title) = msg.chat.title() {
        return title.to_string();
    }
    if let Some(username) = msg.chat.username() {
        return format!("@{username}");
    }
    format!("chat {}", msg.chat.id.0)
}

/// Map one command to its replies (HTML).
pub(crate) async fn respond(state: &AppState, cmd: &str, chat: SinkRef) -> Vec<String> {
    let service = &state.service;
    let interval = format_duration(service.settings().interval);

    match cmd {
        "help" => vec![HELP.to_string()],

        "start" => {
            let label = escape_html(&chat.label);
            match service.start(Some(chat)).await {
                StartOutcome::Started => vec![format!(
                    "✅ <b>Anime Checker Started!</b>\n\
Using Jikan API (MyAnimeList) for reliable anime updates\n\n\
📍 Notifications will be sent to <b>{label}</b>\n\
⏰ Checking every {interval}"
                )],
                StartOutcome::AlreadyRunning => {
                    vec!["❌ Anime checker is already running!".to_string()]
                }
            }
        }

        "stop" => match service.stop().await {
            StopOutcome::Stopped => vec!["🛑 Anime release checker stopped.".to_string()],
            StopOutcome::NotRunning => vec!["❌ Anime checker is not running!".to_string()],
        },

        "status" => {
            let st = service.status().await;
            let state_line = match st.state {
                PollState::Running => "🟢 Checker: Running",
                PollState::Idle => "🔴 Checker: Stopped",
            };
            let target = st
                .target
                .map(|t| escape_html(&t.label))
                .unwrap_or_else(|| "Not set".to_string());
            vec![format!(
                "📊 <b>Bot Status</b>\n\n\
{state_line}\n\
📍 Notification chat: {target}\n\
📈 Anime tracked: {}\n\
🌐 API source: Jikan (MyAnimeList)\n\
⏰ Interval: every {}",
                st.tracked,
                format_duration(st.interval)
            )]
        }

        "setchannel" => {
            let label = escape_html(&chat.label);
            service.set_target(chat).await;
            vec![format!(
                "✅ <b>Channel Updated!</b>\nNotifications will now be sent to <b>{label}</b>"
            )]
        }

        "check" | "test" => match service.force_check().await {
            Ok(report) => vec![format!(
                "✅ Check completed: {} new of {} fetched.",
                report.new_entries, report.fetched
            )],
            Err(e) => {
                warn!("manual check failed: {e}");
                vec![format!("❌ Check failed: {}", escape_html(&e.to_string()))]
            }
        },

        "clear" => {
            let count = service.clear_cache().await;
            vec![format!(
                "🗑️ Cleared {count} tracked anime from cache. Next check will show all current anime as 'new'."
            )]
        }

        _ => vec!["❌ Unknown command! Use /help to see available commands.".to_string()],
    }
}

pub async fn handle_command(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let (cmd, _args) = parse_command(text);
    let chat = SinkRef::new(ChatId(msg.chat.id.0), chat_label(&msg));

    if matches!(cmd.as_str(), "check" | "test") {
        let _ = bot
            .send_message(msg.chat.id, "🔍 Checking for new anime...")
            .await;
    }

    for reply in respond(&state, &cmd, chat).await {
        if let Err(e) = bot
            .send_message(msg.chat.id, reply)
            .parse_mode(ParseMode::Html)
            .await
        {
            warn!("failed to send command reply: {e}");
        }
    }
    Ok(())
}
