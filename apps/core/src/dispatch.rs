use std::time::Duration;

use chrono::{DateTime, Local};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::engines::{Destination, EngineRegistry, InteractionKind, QUERY_PLACEHOLDER};
use crate::history::{HistoryEntry, HistoryStore};

pub const QUICK_SELECT_DELIMITER: char = '`';
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(6);
pub const DEFAULT_CLICK_POINT: (i32, i32) = (500, 500);

/// Everything except RFC 3986 unreserved characters is escaped.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutomationProfile {
    pub settle_delay: Duration,
    pub click_at: (i32, i32),
}

impl Default for AutomationProfile {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
            click_at: DEFAULT_CLICK_POINT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchAction {
    OpenUrl { url: String },
    /// Open `url`, wait `settle_delay`, click at `click_at`, type `text`,
    /// press Enter. Nothing confirms that the click landed on an input.
    Scripted {
        url: String,
        settle_delay: Duration,
        click_at: (i32, i32),
        text: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatched {
    pub destination: &'static Destination,
    pub query: String,
    pub action: SearchAction,
}

/// Resolves the quick-select suffix. Returns the override ordinal and the
/// remaining query, or `None` when the input carries no valid override.
pub fn parse_quick_select(input: &str, engine_count: usize) -> Option<(usize, &str)> {
    let (base, suffix) = input.rsplit_once(QUICK_SELECT_DELIMITER)?;
    let ordinal = suffix.trim().parse::<usize>().ok()?;
    if ordinal == 0 || ordinal > engine_count {
        return None;
    }
    Some((ordinal, base.trim()))
}

pub fn encode_query(query: &str) -> String {
    utf8_percent_encode(query, QUERY_COMPONENT).to_string()
}

/// Substitutes the encoded query into the template's placeholder. A template
/// without a placeholder is returned verbatim.
pub fn search_url(template: &str, query: &str) -> String {
    if !template.contains(QUERY_PLACEHOLDER) {
        return template.to_string();
    }
    template.replacen(QUERY_PLACEHOLDER, &encode_query(query), 1)
}

pub fn build_action(
    destination: &Destination,
    query: &str,
    profile: &AutomationProfile,
) -> SearchAction {
    match destination.interaction_kind {
        InteractionKind::DirectQuery => SearchAction::OpenUrl {
            url: search_url(destination.url_template, query),
        },
        InteractionKind::NoQueryEndpoint => SearchAction::Scripted {
            url: destination.url_template.to_string(),
            settle_delay: profile.settle_delay,
            click_at: profile.click_at,
            text: query.to_string(),
        },
    }
}

pub struct SearchDispatcher {
    registry: EngineRegistry,
    history: HistoryStore,
    profile: AutomationProfile,
}

impl SearchDispatcher {
    pub fn new(registry: EngineRegistry, history: HistoryStore) -> Self {
        Self {
            registry,
            history,
            profile: AutomationProfile::default(),
        }
    }

    pub fn with_automation_profile(mut self, profile: AutomationProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn registry(&self) -> &EngineRegistry {
        &self.registry
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut HistoryStore {
        &mut self.history
    }

    pub fn dispatch(&mut self, raw_input: &str, selected: &'static Destination) -> Option<Dispatched> {
        self.dispatch_at(raw_input, selected, Local::now())
    }

    pub fn dispatch_at(
        &mut self,
        raw_input: &str,
        selected: &'static Destination,
        now: DateTime<Local>,
    ) -> Option<Dispatched> {
        let trimmed = raw_input.trim();
        if trimmed.is_empty() {
            return None;
        }

        let (destination, query) = match parse_quick_select(trimmed, self.registry.count()) {
            Some((ordinal, base)) => match self.registry.get(ordinal) {
                Some(destination) => (destination, base),
                None => (selected, trimmed),
            },
            None => (selected, trimmed),
        };

        let action = build_action(destination, query, &self.profile);
        let timestamp = now.format("%H:%M").to_string();
        self.history
            .append(HistoryEntry::new(&timestamp, destination.label, query))
            .log_if_ignored("history append");

        tracing::info!(engine = destination.label, "search dispatched");
        Some(Dispatched {
            destination,
            query: query.to_string(),
            action,
        })
    }

    /// Re-runs the history entry at `position` (1-based, newest first) against
    /// the engine it was recorded with, or `fallback` when that engine is no
    /// longer in the catalog. The engine currently selected in the panel is
    /// only the fallback: a listed `YouTube: first` replays on YouTube even
    /// while Bing is selected.
    pub fn replay(&mut self, position: usize, fallback: &'static Destination) -> Option<Dispatched> {
        let entry = self.history.nth_newest(position)?.clone();
        let destination = self
            .registry
            .index_of_label(&entry.engine)
            .ok()
            .and_then(|ordinal| self.registry.get(ordinal))
            .unwrap_or(fallback);
        self.dispatch(&entry.query, destination)
    }
}

#[cfg(test)]
mod tests {
    use super::{encode_query, parse_quick_select, search_url};

    #[test]
    fn quick_select_uses_last_delimiter() {
        assert_eq!(parse_quick_select("a`b`3", 20), Some((3, "a`b")));
        assert_eq!(parse_quick_select("hello world `3", 20), Some((3, "hello world")));
    }

    #[test]
    fn quick_select_rejects_out_of_range_and_garbage() {
        assert_eq!(parse_quick_select("query`0", 20), None);
        assert_eq!(parse_quick_select("query`21", 20), None);
        assert_eq!(parse_quick_select("query`x", 20), None);
        assert_eq!(parse_quick_select("query`-1", 20), None);
        assert_eq!(parse_quick_select("no delimiter", 20), None);
    }

    #[test]
    fn encoding_escapes_reserved_characters() {
        assert_eq!(encode_query("c++ & rust"), "c%2B%2B%20%26%20rust");
        assert_eq!(encode_query("safe-_.~"), "safe-_.~");
    }

    #[test]
    fn template_without_placeholder_is_verbatim() {
        assert_eq!(search_url("https://chat.openai.com/", "hi"), "https://chat.openai.com/");
        assert_eq!(
            search_url("https://en.wikipedia.org/wiki/{}", "Rust lang"),
            "https://en.wikipedia.org/wiki/Rust%20lang"
        );
    }
}
