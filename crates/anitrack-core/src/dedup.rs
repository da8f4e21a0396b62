use std::collections::HashSet;

/// In-memory set of entry identities that have already been surfaced.
///
/// Grows for the lifetime of the process; `clear` is the only removal.
#[derive(Debug, Default)]
pub struct DedupStore {
    seen: HashSet<String>,
}

impl DedupStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.seen.contains(identity)
    }

    /// Returns `true` if the identity was not present before.
    pub fn insert(&mut self, identity: impl Into<String>) -> bool {
        self.seen.insert(identity.into())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Forget everything; returns how many identities were tracked.
    pub fn clear(&mut self) -> usize {
        let previous = self.seen.len();
        self.seen.clear();
        previous
    }
}
