use crate::client::{ClientFeedState, MergeSummary, PollUpdate};
use crate::feed::NormalizedItem;
use std::borrow::Cow;
use std::collections::BTreeSet;
use tokio::time::Instant;

/// Label of the filter entry that shows every source.
pub const ALL_SOURCES: &str = "All";

/// How long a status message stays up.
const STATUS_TTL_SECS: u64 = 3;

// ============================================================================
// Application State
// ============================================================================

/// View state for `feedmerge watch`.
///
/// Owns the merged item list and everything the renderer needs. Poll
/// results arrive through [`App::apply`]; key handling mutates the rest.
pub struct App {
    pub feed: ClientFeedState,
    /// Every source name seen so far. Kept even after its items are evicted.
    sources: BTreeSet<String>,
    /// `None` shows all sources.
    filter: Option<String>,
    /// Index into [`App::visible_items`].
    pub selected: usize,
    /// Where the client polls, shown in the header.
    pub api_url: String,
    /// Mirrors the poller's in-flight flag while a request is out.
    pub fetching: bool,
    pub status_message: Option<(Cow<'static, str>, Instant)>,
    /// Render only when state has changed.
    pub needs_redraw: bool,
}

impl App {
    pub fn new(max_items: usize, api_url: impl Into<String>) -> Self {
        Self {
            feed: ClientFeedState::new(max_items),
            sources: BTreeSet::new(),
            filter: None,
            selected: 0,
            api_url: api_url.into(),
            fetching: false,
            status_message: None,
            needs_redraw: true,
        }
    }

    /// Feeds one poll update through the reducer and keeps the selection on
    /// the same item where possible.
    pub fn apply(&mut self, update: PollUpdate) -> MergeSummary {
        let selected_link = self.selected_item().map(|item| item.link.clone());

        match &update {
            PollUpdate::Started => self.fetching = true,
            PollUpdate::Fetched(items) => {
                self.fetching = false;
                self.sources
                    .extend(items.iter().map(|item| item.source.clone()));
            }
            PollUpdate::Failed(_) => self.fetching = false,
        }
        let failed = matches!(update, PollUpdate::Failed(_));
        let summary = self.feed.apply(update);

        let position = selected_link
            .and_then(|link| self.visible_items().iter().position(|i| i.link == link));
        if let Some(pos) = position {
            self.selected = pos;
        }
        self.clamp_selection();

        if failed {
            self.set_status("Refresh failed, showing cached items");
        } else if summary.added > 0 && summary.added != summary.total {
            self.set_status(format!("{} new items", summary.added));
        }
        self.needs_redraw = true;
        summary
    }

    // ------------------------------------------------------------------------
    // Source filter
    // ------------------------------------------------------------------------

    /// `"All"` followed by every seen source, sorted.
    pub fn source_filters(&self) -> Vec<&str> {
        std::iter::once(ALL_SOURCES)
            .chain(self.sources.iter().map(String::as_str))
            .collect()
    }

    pub fn active_filter(&self) -> &str {
        self.filter.as_deref().unwrap_or(ALL_SOURCES)
    }

    /// Moves to the next (or previous) filter, wrapping around. Resets the
    /// selection.
    pub fn cycle_filter(&mut self, forward: bool) {
        let filters = self.source_filters();
        let current = filters
            .iter()
            .position(|f| *f == self.active_filter())
            .unwrap_or(0);
        let len = filters.len();
        let next = if forward {
            (current + 1) % len
        } else {
            (current + len - 1) % len
        };

        self.filter = if next == 0 {
            None
        } else {
            Some(filters[next].to_string())
        };
        self.selected = 0;
        self.needs_redraw = true;
    }

    /// Items passing the active filter, newest first.
    pub fn visible_items(&self) -> Vec<&NormalizedItem> {
        let items = self.feed.items().iter();
        match &self.filter {
            None => items.collect(),
            Some(source) => items.filter(|item| &item.source == source).collect(),
        }
    }

    pub fn selected_item(&self) -> Option<&NormalizedItem> {
        self.visible_items().get(self.selected).copied()
    }

    // ------------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------------

    pub fn nav_down(&mut self) {
        let len = self.visible_items().len();
        if len > 0 {
            self.selected = (self.selected + 1).min(len - 1);
        }
    }

    pub fn nav_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn nav_first(&mut self) {
        self.selected = 0;
    }

    pub fn nav_last(&mut self) {
        self.selected = self.visible_items().len().saturating_sub(1);
    }

    fn clamp_selection(&mut self) {
        let len = self.visible_items().len();
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    // ------------------------------------------------------------------------
    // Status
    // ------------------------------------------------------------------------

    /// Set status message (will auto-expire after 3 seconds)
    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
    }

    /// Clear status message if expired. Returns true if a message was cleared.
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed().as_secs() >= STATUS_TTL_SECS {
                self.status_message = None;
                return true;
            }
        }
        false
    }
}
