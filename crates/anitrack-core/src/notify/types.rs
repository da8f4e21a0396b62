use chrono::{DateTime, Utc};

/// A rendered, messenger-agnostic notification.
#[derive(Clone, Debug, PartialEq)]
pub struct Notification {
    pub title: String,
    pub description: String,
    /// 0xRRGGBB accent color, for messengers that support one.
    pub color: u32,
    pub timestamp: DateTime<Utc>,
    pub fields: Vec<Field>,
    pub thumbnail_url: Option<String>,
    pub footer: String,
}

/// A named group of lines (one per entry, plus the remainder summary).
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub name: String,
    pub lines: Vec<FieldLine>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FieldLine {
    /// `label: value`; adapters decide how to emphasize the label.
    Labeled { label: String, value: String },
    Link { text: String, url: String },
    Text(String),
}

impl FieldLine {
    pub fn labeled(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Labeled {
            label: label.into(),
            value: value.into(),
        }
    }
}
