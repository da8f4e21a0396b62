use async_trait::async_trait;

use crate::{domain::SinkRef, notify::types::Notification, Result};

/// Outbound notification port.
///
/// One call delivers one rendered notification to `target`. Implementations
/// report failure; callers log it and move on.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, target: &SinkRef, notification: &Notification) -> Result<()>;
}
