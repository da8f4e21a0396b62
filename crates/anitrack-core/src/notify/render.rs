use chrono::{DateTime, Utc};

use crate::{
    domain::Entry,
    formatting::format_score,
    notify::types::{Field, FieldLine, Notification},
};

pub const TITLE: &str = "🎉 New Anime Updates!";
pub const DESCRIPTION: &str = "Recently updated anime from MyAnimeList";
pub const FOOTER: &str = "Powered by Jikan API (MyAnimeList)";
pub const COLOR: u32 = 0x00ff00;

/// Render a batch of new entries.
///
/// The first `detailed_limit` entries get a full field; the rest are folded
/// into a single count line.
pub fn render(entries: &[Entry], detailed_limit: usize, now: DateTime<Utc>) -> Notification {
    let mut fields: Vec<Field> = entries.iter().take(detailed_limit).map(entry_field).collect();

    let remainder = entries.len().saturating_sub(detailed_limit);
    if remainder > 0 {
        fields.push(Field {
            name: "And more...".to_string(),
            lines: vec![FieldLine::Text(format!(
                "{remainder} additional anime updates!"
            ))],
        });
    }

    Notification {
        title: TITLE.to_string(),
        description: DESCRIPTION.to_string(),
        color: COLOR,
        timestamp: now,
        fields,
        thumbnail_url: entries.first().and_then(|e| e.image_url.clone()),
        footer: FOOTER.to_string(),
    }
}

fn entry_field(entry: &Entry) -> Field {
    let mut lines = vec![FieldLine::labeled("Status", entry.status.clone())];
    // Zero means "not rated yet" / "not announced"; both are left out.
    if let Some(score) = entry.score.filter(|s| *s != 0.0) {
        lines.push(FieldLine::labeled(
            "Score",
            format!("{}/10", format_score(score)),
        ));
    }
    if let Some(episodes) = entry.episodes.filter(|n| *n != 0) {
        lines.push(FieldLine::labeled("Episodes", episodes.to_string()));
    }
    lines.push(FieldLine::labeled("Synopsis", entry.summary.clone()));
    if !entry.url.is_empty() {
        lines.push(FieldLine::Link {
            text: "View on MAL".to_string(),
            url: entry.url.clone(),
        });
    }

    Field {
        name: format!("📺 {}", entry.display_title),
        lines,
    }
}
