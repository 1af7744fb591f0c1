//! Client-side merged item list.
//!
//! [`ClientFeedState`] only changes through [`ClientFeedState::apply`], so
//! every transition is a plain function of the current state and one
//! [`PollUpdate`].

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::feed::{sort_by_recency, NormalizedItem};

/// One step of the poll lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollUpdate {
    /// A request went out.
    Started,
    /// The document was fetched and parsed.
    Fetched(Vec<NormalizedItem>),
    /// The request or the parse failed.
    Failed(String),
}

/// What a single [`PollUpdate`] changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub added: usize,
    pub evicted: usize,
    pub total: usize,
}

/// Items keyed by link, newest first, bounded by `max_items`.
#[derive(Debug, Clone)]
pub struct ClientFeedState {
    items: Vec<NormalizedItem>,
    seen: HashSet<String>,
    max_items: usize,
    fetching: bool,
    error: Option<String>,
    last_updated: Option<DateTime<Utc>>,
}

impl ClientFeedState {
    /// `max_items == 0` means unbounded.
    pub fn new(max_items: usize) -> Self {
        Self {
            items: Vec::new(),
            seen: HashSet::new(),
            max_items,
            fetching: false,
            error: None,
            last_updated: None,
        }
    }

    pub fn apply(&mut self, update: PollUpdate) -> MergeSummary {
        match update {
            PollUpdate::Started => {
                self.fetching = true;
                MergeSummary {
                    total: self.items.len(),
                    ..MergeSummary::default()
                }
            }
            PollUpdate::Fetched(items) => {
                self.fetching = false;
                self.error = None;
                self.last_updated = Some(Utc::now());
                self.merge(items)
            }
            PollUpdate::Failed(reason) => {
                // Existing items stay visible; only the indicator changes.
                self.fetching = false;
                self.error = Some(reason);
                MergeSummary {
                    total: self.items.len(),
                    ..MergeSummary::default()
                }
            }
        }
    }

    fn merge(&mut self, incoming: Vec<NormalizedItem>) -> MergeSummary {
        let before = self.items.len();
        for item in incoming {
            if self.seen.insert(item.link.clone()) {
                self.items.push(item);
            }
        }
        let added = self.items.len() - before;

        sort_by_recency(&mut self.items);

        let mut evicted = 0;
        if self.max_items > 0 && self.items.len() > self.max_items {
            for item in self.items.drain(self.max_items..) {
                self.seen.remove(&item.link);
                evicted += 1;
            }
        }

        MergeSummary {
            added,
            evicted,
            total: self.items.len(),
        }
    }

    /// Items newest first.
    pub fn items(&self) -> &[NormalizedItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_fetching(&self) -> bool {
        self.fetching
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    /// True until the first poll has finished, successfully or not.
    pub fn is_loading(&self) -> bool {
        self.last_updated.is_none() && self.error.is_none()
    }
}

impl Default for ClientFeedState {
    fn default() -> Self {
        Self::new(crate::config::ClientConfig::default().max_items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn item(link: &str, day: Option<u32>) -> NormalizedItem {
        NormalizedItem {
            title: format!("title {link}"),
            link: link.to_string(),
            description: String::new(),
            snippet: None,
            published: day.map(|d| Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()),
            image: None,
            source: "Punch".to_string(),
        }
    }

    fn links(state: &ClientFeedState) -> Vec<&str> {
        state.items().iter().map(|i| i.link.as_str()).collect()
    }

    #[test]
    fn starts_loading_and_empty() {
        let state = ClientFeedState::new(10);
        assert!(state.is_loading());
        assert!(state.is_empty());
        assert!(!state.is_fetching());
    }

    #[test]
    fn fetched_items_sort_newest_first_with_undated_last() {
        let mut state = ClientFeedState::new(0);
        let summary = state.apply(PollUpdate::Fetched(vec![
            item("a", Some(1)),
            item("none", None),
            item("c", Some(3)),
            item("b", Some(2)),
        ]));

        assert_eq!(summary, MergeSummary { added: 4, evicted: 0, total: 4 });
        assert_eq!(links(&state), vec!["c", "b", "a", "none"]);
        assert!(!state.is_loading());
        assert!(state.last_updated().is_some());
    }

    #[test]
    fn identical_polls_are_idempotent() {
        let batch = vec![item("a", Some(1)), item("b", Some(2)), item("c", None)];
        let mut state = ClientFeedState::new(0);
        state.apply(PollUpdate::Fetched(batch.clone()));
        let first = links(&state).into_iter().map(String::from).collect::<Vec<_>>();

        let summary = state.apply(PollUpdate::Fetched(batch));
        assert_eq!(summary.added, 0);
        assert_eq!(links(&state), first);
    }

    #[test]
    fn new_links_are_merged_and_known_links_keep_first_copy() {
        let mut state = ClientFeedState::new(0);
        state.apply(PollUpdate::Fetched(vec![item("a", Some(1))]));

        let mut changed = item("a", Some(5));
        changed.title = "edited".to_string();
        let summary = state.apply(PollUpdate::Fetched(vec![changed, item("b", Some(2))]));

        assert_eq!(summary.added, 1);
        assert_eq!(links(&state), vec!["b", "a"]);
        assert_eq!(state.items()[1].title, "title a");
    }

    #[test]
    fn failure_keeps_items_and_sets_error() {
        let mut state = ClientFeedState::new(0);
        state.apply(PollUpdate::Fetched(vec![item("a", Some(1))]));
        state.apply(PollUpdate::Started);
        assert!(state.is_fetching());

        let summary = state.apply(PollUpdate::Failed("HTTP error: status 502".to_string()));
        assert_eq!(summary.total, 1);
        assert!(!state.is_fetching());
        assert_eq!(state.error(), Some("HTTP error: status 502"));
        assert_eq!(links(&state), vec!["a"]);

        state.apply(PollUpdate::Fetched(vec![]));
        assert_eq!(state.error(), None);
    }

    #[test]
    fn first_poll_failure_ends_loading() {
        let mut state = ClientFeedState::new(0);
        state.apply(PollUpdate::Started);
        state.apply(PollUpdate::Failed("offline".to_string()));
        assert!(!state.is_loading());
        assert!(state.is_empty());
    }

    #[test]
    fn bound_evicts_oldest_and_forgets_their_links() {
        let mut state = ClientFeedState::new(2);
        let summary = state.apply(PollUpdate::Fetched(vec![
            item("old", Some(1)),
            item("mid", Some(2)),
            item("new", Some(3)),
        ]));
        assert_eq!(summary, MergeSummary { added: 3, evicted: 1, total: 2 });
        assert_eq!(links(&state), vec!["new", "mid"]);

        // "old" was forgotten, so it is admitted again and evicted again.
        let again = state.apply(PollUpdate::Fetched(vec![item("old", Some(1))]));
        assert_eq!(again, MergeSummary { added: 1, evicted: 1, total: 2 });
        assert_eq!(links(&state), vec!["new", "mid"]);

        state.apply(PollUpdate::Fetched(vec![item("newest", Some(4))]));
        assert_eq!(links(&state), vec!["newest", "new"]);
    }

    #[test]
    fn undated_items_are_evicted_first() {
        let mut state = ClientFeedState::new(1);
        state.apply(PollUpdate::Fetched(vec![item("undated", None), item("dated", Some(1))]));
        assert_eq!(links(&state), vec!["dated"]);
    }
}
