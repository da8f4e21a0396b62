//! Novelty detection: raw batch in, unseen entries out.

use crate::{
    catalog::RawEntry,
    dedup::DedupStore,
    domain::Entry,
    formatting::{truncate_chars, ELLIPSIS},
};

const UNKNOWN_TITLE: &str = "Unknown Anime";
const UNKNOWN_STATUS: &str = "Unknown";
const NO_SYNOPSIS: &str = "No synopsis available";

/// Composite identity: provider id plus raw title.
///
/// The id alone is not enough since the same id can come back for logically
/// distinct re-entries with a different title.
pub fn identity_of(raw: &RawEntry) -> String {
    let id = raw
        .mal_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "none".to_string());
    format!("{id}_{}", raw_title(raw))
}

fn raw_title(raw: &RawEntry) -> &str {
    raw.title
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(UNKNOWN_TITLE)
}

/// Build the display value for a raw entry.
pub fn build_entry(raw: &RawEntry, identity: String, synopsis_max_chars: usize) -> Entry {
    let original_title = raw_title(raw).to_string();
    let display_title = raw
        .title_english
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| original_title.clone());

    // Any present synopsis carries the marker, cut or not.
    let summary = match raw.synopsis.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(s) => format!("{}{ELLIPSIS}", truncate_chars(s, synopsis_max_chars)),
        None => NO_SYNOPSIS.to_string(),
    };

    Entry {
        identity,
        mal_id: raw.mal_id,
        display_title,
        original_title,
        score: raw.score,
        status: raw
            .status
            .clone()
            .unwrap_or_else(|| UNKNOWN_STATUS.to_string()),
        episodes: raw.episodes,
        aired_from: raw.aired_from.clone(),
        url: raw.url.clone().unwrap_or_default(),
        image_url: raw.image_url.clone(),
        summary,
    }
}

/// Return the entries of `batch` not yet in `store`, registering each as seen.
///
/// Registration happens per entry so a duplicate inside the same batch is only
/// surfaced once. Input order is preserved.
pub fn diff(batch: &[RawEntry], store: &mut DedupStore, synopsis_max_chars: usize) -> Vec<Entry> {
    let mut fresh = Vec::new();
    for raw in batch {
        let identity = identity_of(raw);
        if store.contains(&identity) {
            continue;
        }
        store.insert(identity.clone());
        fresh.push(build_entry(raw, identity, synopsis_max_chars));
    }
    fresh
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: i64, title: &str) -> RawEntry {
        RawEntry {
            mal_id: Some(id),
            title: Some(title.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn second_run_over_same_batch_is_empty() {
        let batch = vec![raw(1, "A"), raw(2, "B"), raw(3, "C")];
        let mut store = DedupStore::new();

        let first = diff(&batch, &mut store, 200);
        assert_eq!(first.len(), 3);
        assert_eq!(store.len(), 3);

        let second = diff(&batch, &mut store, 200);
        assert!(second.is_empty());
    }

    #[test]
    fn duplicates_within_one_batch_surface_once() {
        let batch = vec![raw(1, "A"), raw(2, "B"), raw(1, "A")];
        let mut store = DedupStore::new();
        let out = diff(&batch, &mut store, 200);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].identity, "1_A");
        assert_eq!(out[1].identity, "2_B");
    }

    #[test]
    fn same_id_with_different_title_is_distinct() {
        let batch = vec![raw(1, "A"), raw(1, "A Season 2")];
        let mut store = DedupStore::new();
        assert_eq!(diff(&batch, &mut store, 200).len(), 2);
    }

    #[test]
    fn order_is_preserved_across_merged_sources() {
        // Two endpoints concatenated, with overlap.
        let batch = vec![
            raw(5, "E"),
            raw(3, "C"),
            raw(9, "I"),
            raw(3, "C"),
            raw(1, "A"),
            raw(5, "E"),
        ];
        let mut store = DedupStore::new();
        let ids: Vec<_> = diff(&batch, &mut store, 200)
            .into_iter()
            .map(|e| e.mal_id.unwrap())
            .collect();
        assert_eq!(ids, vec![5, 3, 9, 1]);
    }

    #[test]
    fn clear_exposes_batch_again() {
        let batch = vec![raw(1, "A"), raw(2, "B")];
        let mut store = DedupStore::new();
        diff(&batch, &mut store, 200);
        assert_eq!(store.clear(), 2);
        assert_eq!(diff(&batch, &mut store, 200).len(), 2);
    }

    #[test]
    fn title_and_synopsis_fallbacks() {
        let mut r = raw(7, "Shingeki no Kyojin");
        r.title_english = Some("  ".to_string());
        let e = build_entry(&r, identity_of(&r), 200);
        assert_eq!(e.display_title, "Shingeki no Kyojin");
        assert_eq!(e.original_title, "Shingeki no Kyojin");
        assert_eq!(e.summary, NO_SYNOPSIS);
        assert_eq!(e.status, UNKNOWN_STATUS);

        r.title_english = Some("Attack on Titan".to_string());
        let e = build_entry(&r, identity_of(&r), 200);
        assert_eq!(e.display_title, "Attack on Titan");
    }

    #[test]
    fn missing_id_and_title() {
        let r = RawEntry::default();
        assert_eq!(identity_of(&r), "none_Unknown Anime");
        let e = build_entry(&r, identity_of(&r), 200);
        assert_eq!(e.display_title, UNKNOWN_TITLE);
        assert_eq!(e.url, "");
    }

    #[test]
    fn long_synopsis_is_truncated_to_limit() {
        let mut r = raw(1, "A");
        r.synopsis = Some("x".repeat(500));
        let e = build_entry(&r, identity_of(&r), 200);
        assert_eq!(e.summary, format!("{}...", "x".repeat(200)));
        assert_eq!(e.summary.chars().count(), 203);
    }

    #[test]
    fn short_synopsis_still_gets_ellipsis() {
        let mut r = raw(1, "A");
        r.synopsis = Some("Short and sweet.".to_string());
        let e = build_entry(&r, identity_of(&r), 200);
        assert_eq!(e.summary, "Short and sweet....");
    }
}
