//! Telegram adapter (teloxide).
//!
//! Implements the `anitrack-core` NotificationSink over the Telegram Bot API
//! and hosts the command surface (see [`router`]).

use async_trait::async_trait;

use teloxide::{prelude::*, types::ParseMode};

pub mod handlers;
pub mod router;

pub use teloxide::Bot;

use anitrack_core::{
    domain::{ChatId, SinkRef},
    errors::Error,
    formatting::escape_html,
    notify::{
        port::NotificationSink,
        types::{FieldLine, Notification},
    },
    Result,
};

#[derive(Clone)]
pub struct TelegramSink {
    bot: Bot,
}

impl TelegramSink {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }
}

#[async_trait]
impl NotificationSink for TelegramSink {
    async fn send(&self, target: &SinkRef, notification: &Notification) -> Result<()> {
        let html = render_html(notification);
        self.bot
            .send_message(Self::tg_chat(target.chat_id), html)
            .parse_mode(ParseMode::Html)
            .disable_web_page_preview(notification.thumbnail_url.is_none())
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }
}

/// Render a notification as one Telegram HTML message.
///
/// Telegram has no embeds; the thumbnail rides on an invisible leading link so
/// the link preview shows the image.
pub fn render_html(n: &Notification) -> String {
    let mut out = String::new();

    if let Some(thumb) = &n.thumbnail_url {
        out.push_str(&format!("<a href=\"{}\">&#8205;</a>", escape_html(thumb)));
    }
    out.push_str(&format!("<b>{}</b>\n", escape_html(&n.title)));
    out.push_str(&format!("<i>{}</i>\n", escape_html(&n.description)));

    for field in &n.fields {
        out.push('\n');
        out.push_str(&format!("<b>{}</b>\n", escape_html(&field.name)));
        for line in &field.lines {
            match line {
                FieldLine::Labeled { label, value } => out.push_str(&format!(
                    "<b>{}:</b> {}\n",
                    escape_html(label),
                    escape_html(value)
                )),
                FieldLine::Link { text, url } => out.push_str(&format!(
                    "<a href=\"{}\">{}</a>\n",
                    escape_html(url),
                    escape_html(text)
                )),
                FieldLine::Text(text) => {
                    out.push_str(&escape_html(text));
                    out.push('\n');
                }
            }
        }
    }

    out.push_str(&format!(
        "\n<i>{} • {}</i>",
        escape_html(&n.footer),
        n.timestamp.format("%Y-%m-%d %H:%M UTC")
    ));
    out
}
