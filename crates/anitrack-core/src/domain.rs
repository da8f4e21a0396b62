/// Chat id (numeric) of the place notifications are delivered to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Where rendered notifications go.
///
/// `label` is a human description of the target (chat title or username) used
/// by status replies and logs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SinkRef {
    pub chat_id: ChatId,
    pub label: String,
}

impl SinkRef {
    pub fn new(chat_id: ChatId, label: impl Into<String>) -> Self {
        Self {
            chat_id,
            label: label.into(),
        }
    }
}

/// One normalized catalog item considered for novelty detection.
///
/// Built fresh on every pass and discarded once the pass has notified.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    /// Composite key: provider id plus the raw title.
    pub identity: String,
    pub mal_id: Option<i64>,
    /// Localized title, falling back to `original_title`.
    pub display_title: String,
    pub original_title: String,
    pub score: Option<f64>,
    pub status: String,
    pub episodes: Option<u32>,
    pub aired_from: Option<String>,
    pub url: String,
    pub image_url: Option<String>,
    /// Synopsis, already truncated for display.
    pub summary: String,
}
