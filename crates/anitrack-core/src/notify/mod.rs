//! Notification rendering and delivery.
//!
//! Rendering produces a messenger-agnostic [`types::Notification`]; adapters
//! (Telegram today) turn it into their own wire format behind
//! [`port::NotificationSink`].

pub mod port;
pub mod render;
pub mod types;

use tracing::{info, warn};

use crate::{
    domain::{Entry, SinkRef},
    formatting::format_score,
};

use self::{port::NotificationSink, render::render};

/// Log one line per entry and deliver a rendered batch to `target`, if any.
///
/// Returns whether a notification was delivered. Delivery failures are
/// logged and never retried.
pub async fn notify(
    entries: &[Entry],
    sink: &dyn NotificationSink,
    target: Option<&SinkRef>,
    detailed_limit: usize,
) -> bool {
    if entries.is_empty() {
        info!("no new anime updates found");
        return false;
    }

    info!(count = entries.len(), "new anime found");
    for entry in entries {
        let score = entry
            .score
            .map(|s| format!("{}/10", format_score(s)))
            .unwrap_or_else(|| "not rated".to_string());
        info!(title = %entry.display_title, url = %entry.url, score = %score, "new entry");
    }

    let Some(target) = target else {
        info!("no notification target set; skipping delivery");
        return false;
    };

    let notification = render(entries, detailed_limit, chrono::Utc::now());
    match sink.send(target, &notification).await {
        Ok(()) => true,
        Err(e) => {
            warn!(chat = %target.label, "failed to deliver notification: {e}");
            false
        }
    }
}
