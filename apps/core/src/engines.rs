use thiserror::Error;

/// Placeholder substituted with the percent-encoded query.
pub const QUERY_PLACEHOLDER: &str = "{}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
    /// The destination accepts the query in its URL.
    DirectQuery,
    /// The destination has no query-string search form; the query is typed
    /// into the opened page instead.
    NoQueryEndpoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Destination {
    pub ordinal: usize,
    pub label: &'static str,
    pub url_template: &'static str,
    pub interaction_kind: InteractionKind,
}

impl Destination {
    const fn direct(ordinal: usize, label: &'static str, url_template: &'static str) -> Self {
        Self {
            ordinal,
            label,
            url_template,
            interaction_kind: InteractionKind::DirectQuery,
        }
    }

    const fn scripted(ordinal: usize, label: &'static str, url_template: &'static str) -> Self {
        Self {
            ordinal,
            label,
            url_template,
            interaction_kind: InteractionKind::NoQueryEndpoint,
        }
    }

    pub fn display_name(&self) -> String {
        format!("{}. {}", self.ordinal, self.label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("engine not found: {0}")]
    NotFound(String),
}

const BUILTIN_DESTINATIONS: [Destination; 20] = [
    Destination::direct(1, "Google", "https://www.google.com/search?q={}"),
    Destination::direct(2, "YouTube", "https://www.youtube.com/results?search_query={}"),
    Destination::scripted(3, "ChatGPT", "https://chat.openai.com/"),
    Destination::scripted(4, "Gemini", "https://gemini.google.com/"),
    Destination::direct(5, "Bing", "https://www.bing.com/search?q={}"),
    Destination::direct(6, "Facebook", "https://www.facebook.com/search/top/?q={}"),
    Destination::direct(
        7,
        "LinkedIn",
        "https://www.linkedin.com/search/results/all/?keywords={}",
    ),
    Destination::direct(8, "Instagram", "https://www.instagram.com/explore/tags/{}/"),
    Destination::direct(9, "Twitter", "https://twitter.com/search?q={}"),
    Destination::direct(10, "Reddit", "https://www.reddit.com/search/?q={}"),
    Destination::direct(11, "Pinterest", "https://www.pinterest.com/search/pins/?q={}"),
    Destination::direct(12, "Quora", "https://www.quora.com/search?q={}"),
    Destination::direct(13, "Amazon", "https://www.amazon.com/s?k={}"),
    Destination::direct(14, "StackOverflow", "https://stackoverflow.com/search?q={}"),
    Destination::direct(15, "Wikipedia", "https://en.wikipedia.org/wiki/{}"),
    Destination::direct(16, "DuckDuckGo", "https://duckduckgo.com/?q={}"),
    Destination::direct(17, "Yahoo", "https://search.yahoo.com/search?p={}"),
    Destination::direct(18, "Snapchat", "https://www.snapchat.com/add/{}"),
    Destination::direct(19, "Spotify", "https://open.spotify.com/search/{}"),
    Destination::direct(20, "Netflix", "https://www.netflix.com/search?q={}"),
];

/// Ordered destination catalog. Position in the catalog is both the display
/// order and the quick-select ordinal.
#[derive(Debug, Clone, Copy)]
pub struct EngineRegistry {
    destinations: &'static [Destination],
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl EngineRegistry {
    pub fn builtin() -> Self {
        Self {
            destinations: &BUILTIN_DESTINATIONS,
        }
    }

    /// Ordinals of `destinations` must run 1..=len in order.
    pub fn from_static(destinations: &'static [Destination]) -> Self {
        debug_assert!(destinations
            .iter()
            .enumerate()
            .all(|(index, destination)| destination.ordinal == index + 1));
        Self { destinations }
    }

    pub fn count(&self) -> usize {
        self.destinations.len()
    }

    pub fn get(&self, ordinal: usize) -> Option<&'static Destination> {
        if ordinal == 0 {
            return None;
        }
        self.destinations.get(ordinal - 1)
    }

    pub fn first(&self) -> Option<&'static Destination> {
        self.destinations.first()
    }

    pub fn index_of_label(&self, label: &str) -> Result<usize, EngineError> {
        self.destinations
            .iter()
            .find(|destination| destination.label == label)
            .map(|destination| destination.ordinal)
            .ok_or_else(|| EngineError::NotFound(label.to_string()))
    }

    pub fn next_ordinal(&self, ordinal: usize) -> usize {
        let count = self.count();
        if count == 0 {
            return 0;
        }
        let current = ordinal.clamp(1, count);
        current % count + 1
    }

    pub fn previous_ordinal(&self, ordinal: usize) -> usize {
        let count = self.count();
        if count == 0 {
            return 0;
        }
        let current = ordinal.clamp(1, count);
        if current == 1 {
            count
        } else {
            current - 1
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static Destination> {
        self.destinations.iter()
    }
}
