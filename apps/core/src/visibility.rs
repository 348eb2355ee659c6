use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::foreground::ForegroundEscalator;
use crate::panel::Panel;

pub const TOGGLE_DEBOUNCE: Duration = Duration::from_millis(300);
pub const TOPMOST_RELEASE_DELAY: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Hidden,
    Shown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Debounced,
    Revealed,
    Withdrawn,
}

struct ToggleState {
    visibility: Visibility,
    last_toggle: Option<Instant>,
    auto_focus: bool,
}

/// Owns the panel's shown/hidden state. `toggle` is shared between the hotkey
/// thread and the interactive loop; the debounce check-and-set and the
/// transition run under one lock.
pub struct VisibilityController {
    panel: Arc<dyn Panel>,
    escalator: Option<Arc<dyn ForegroundEscalator>>,
    topmost_release: Duration,
    state: Mutex<ToggleState>,
}

impl VisibilityController {
    pub fn new(
        panel: Arc<dyn Panel>,
        escalator: Option<Arc<dyn ForegroundEscalator>>,
        auto_focus: bool,
    ) -> Self {
        Self {
            panel,
            escalator,
            topmost_release: TOPMOST_RELEASE_DELAY,
            state: Mutex::new(ToggleState {
                visibility: Visibility::Hidden,
                last_toggle: None,
                auto_focus,
            }),
        }
    }

    pub fn with_topmost_release(mut self, delay: Duration) -> Self {
        self.topmost_release = delay;
        self
    }

    pub fn visibility(&self) -> Visibility {
        self.state.lock().visibility
    }

    pub fn set_auto_focus(&self, auto_focus: bool) {
        self.state.lock().auto_focus = auto_focus;
    }

    /// Puts the panel in its startup state without touching the debounce
    /// window.
    pub fn apply_initial(&self, start_hidden: bool) {
        let mut state = self.state.lock();
        if start_hidden {
            self.panel.withdraw();
            state.visibility = Visibility::Hidden;
        } else {
            self.reveal(state.auto_focus);
            state.visibility = Visibility::Shown;
        }
    }

    pub fn toggle(&self) -> ToggleOutcome {
        self.toggle_at(Instant::now())
    }

    pub fn toggle_at(&self, now: Instant) -> ToggleOutcome {
        let mut state = self.state.lock();
        self.transition(&mut state, now)
    }

    /// Close/quit path: hides a shown panel through the regular debounced
    /// toggle and leaves a hidden one alone.
    pub fn dismiss(&self) -> Option<ToggleOutcome> {
        self.dismiss_at(Instant::now())
    }

    pub fn dismiss_at(&self, now: Instant) -> Option<ToggleOutcome> {
        let mut state = self.state.lock();
        if state.visibility == Visibility::Hidden {
            return None;
        }
        Some(self.transition(&mut state, now))
    }

    fn transition(&self, state: &mut ToggleState, now: Instant) -> ToggleOutcome {
        if let Some(last) = state.last_toggle {
            if now.saturating_duration_since(last) < TOGGLE_DEBOUNCE {
                tracing::debug!("toggle debounced");
                return ToggleOutcome::Debounced;
            }
        }
        state.last_toggle = Some(now);

        match state.visibility {
            Visibility::Hidden => {
                self.reveal(state.auto_focus);
                state.visibility = Visibility::Shown;
                tracing::debug!("panel revealed");
                ToggleOutcome::Revealed
            }
            Visibility::Shown => {
                self.panel.withdraw();
                state.visibility = Visibility::Hidden;
                tracing::debug!("panel withdrawn");
                ToggleOutcome::Withdrawn
            }
        }
    }

    fn reveal(&self, auto_focus: bool) {
        self.panel.reveal();
        self.panel.raise();
        self.panel.request_focus();
        if auto_focus {
            self.panel.focus_query_input();
        }

        self.panel.set_always_on_top(true);
        self.schedule_topmost_release();

        if let (Some(escalator), Some(handle)) = (&self.escalator, self.panel.window_handle()) {
            escalator.bring_to_foreground(handle);
        }
    }

    fn schedule_topmost_release(&self) {
        let panel = Arc::clone(&self.panel);
        let delay = self.topmost_release;
        let spawned = std::thread::Builder::new()
            .name("hotsearch-unpin".to_string())
            .spawn(move || {
                std::thread::sleep(delay);
                panel.set_always_on_top(false);
            });
        if let Err(error) = spawned {
            tracing::warn!(%error, "could not schedule always-on-top release; releasing now");
            self.panel.set_always_on_top(false);
        }
    }
}
