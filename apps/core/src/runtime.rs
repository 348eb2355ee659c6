use std::io::BufRead;
use std::sync::Arc;

use thiserror::Error;

use crate::action_executor::{ActionExecutor, Execution};
use crate::config::{self, Config, ConfigError};
use crate::dispatch::{Dispatched, SearchAction, SearchDispatcher};
use crate::engines::{Destination, EngineRegistry};
use crate::foreground;
use crate::history::HistoryStore;
use crate::hotkey_listener::HotkeyListener;
use crate::hotkey_runtime::{default_hotkey_registrar, HotkeyRuntimeError};
use crate::logging::{self, LoggingError};
use crate::panel::{parse_command, ConsolePanel, Panel, PanelCommand};
use crate::settings::{Settings, SettingsStore, HOTKEY_SUGGESTIONS};
use crate::visibility::{ToggleOutcome, VisibilityController};

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("logging error: {0}")]
    Logging(#[from] LoggingError),
    #[error("single-instance check failed: {0}")]
    SingleInstance(String),
    #[error("engine catalog is empty")]
    EmptyCatalog,
    #[error("failed to read panel input: {0}")]
    Input(#[source] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Lines to show in the panel plus whether the loop keeps going.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub lines: Vec<String>,
    pub flow: Flow,
}

impl Reply {
    fn quiet() -> Self {
        Self {
            lines: Vec::new(),
            flow: Flow::Continue,
        }
    }

    fn line(line: impl Into<String>) -> Self {
        Self {
            lines: vec![line.into()],
            flow: Flow::Continue,
        }
    }

    fn exit() -> Self {
        Self {
            lines: Vec::new(),
            flow: Flow::Exit,
        }
    }
}

/// State owned by the interactive loop. The hotkey thread only ever touches
/// the shared controller.
pub struct Session {
    settings_store: SettingsStore,
    settings: Settings,
    dispatcher: SearchDispatcher,
    executor: ActionExecutor,
    controller: Arc<VisibilityController>,
    panel: Arc<dyn Panel>,
    selected: &'static Destination,
}

impl Session {
    pub fn new(
        settings_store: SettingsStore,
        settings: Settings,
        dispatcher: SearchDispatcher,
        executor: ActionExecutor,
        controller: Arc<VisibilityController>,
        panel: Arc<dyn Panel>,
    ) -> Result<Self, RuntimeError> {
        let selected = settings
            .default_destination(dispatcher.registry())
            .ok_or(RuntimeError::EmptyCatalog)?;
        Ok(Self {
            settings_store,
            settings,
            dispatcher,
            executor,
            controller,
            panel,
            selected,
        })
    }

    pub fn selected(&self) -> &'static Destination {
        self.selected
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn history(&self) -> &HistoryStore {
        self.dispatcher.history()
    }

    pub fn handle_line(&mut self, line: &str) -> Reply {
        self.handle(parse_command(line))
    }

    pub fn handle(&mut self, command: PanelCommand) -> Reply {
        match command {
            PanelCommand::Submit(text) => {
                let dispatched = self.dispatcher.dispatch(&text, self.selected);
                self.launch(dispatched)
            }
            PanelCommand::NextEngine => {
                let ordinal = self.registry().next_ordinal(self.selected.ordinal);
                self.select(ordinal)
            }
            PanelCommand::PreviousEngine => {
                let ordinal = self.registry().previous_ordinal(self.selected.ordinal);
                self.select(ordinal)
            }
            PanelCommand::UseEngine(ordinal) => self.select(ordinal),
            PanelCommand::ListEngines => Reply {
                lines: self
                    .registry()
                    .iter()
                    .map(|destination| {
                        let marker = if destination.ordinal == self.selected.ordinal {
                            "*"
                        } else {
                            " "
                        };
                        format!("{marker} {}", destination.display_name())
                    })
                    .collect(),
                flow: Flow::Continue,
            },
            PanelCommand::ShowHistory => self.show_history(),
            PanelCommand::Replay(position) => {
                let dispatched = self.dispatcher.replay(position, self.selected);
                if dispatched.is_none() {
                    return Reply::line(format!("No history entry {position}."));
                }
                self.launch(dispatched)
            }
            PanelCommand::ClearHistory => {
                self.dispatcher
                    .history_mut()
                    .clear()
                    .log_if_ignored("history clear");
                Reply::line("History cleared.")
            }
            PanelCommand::ShowSettings => self.show_settings(),
            PanelCommand::SetSetting { key, value } => self.update_setting(&key, &value),
            PanelCommand::Toggle => {
                self.controller.toggle();
                Reply::quiet()
            }
            PanelCommand::Quit => {
                if self.controller.dismiss() == Some(ToggleOutcome::Withdrawn) {
                    tracing::info!("panel dismissed; still listening for the hotkey");
                }
                Reply::quiet()
            }
            PanelCommand::Exit => Reply::exit(),
            PanelCommand::Help => Reply {
                lines: HELP_LINES.iter().map(|line| line.to_string()).collect(),
                flow: Flow::Continue,
            },
            PanelCommand::Invalid(message) => Reply::line(message),
        }
    }

    fn registry(&self) -> EngineRegistry {
        *self.dispatcher.registry()
    }

    fn select(&mut self, ordinal: usize) -> Reply {
        match self.registry().get(ordinal) {
            Some(destination) => {
                self.selected = destination;
                Reply::line(format!("Engine: {}", destination.display_name()))
            }
            None => Reply::line(format!(
                "Engine must be between 1 and {}.",
                self.registry().count()
            )),
        }
    }

    fn launch(&self, dispatched: Option<Dispatched>) -> Reply {
        let Some(dispatched) = dispatched else {
            return Reply::quiet();
        };

        match self.executor.execute(&dispatched.action) {
            Ok(Execution::Opened) => Reply::quiet(),
            Ok(Execution::Automating(_detached)) => {
                let delay = match &dispatched.action {
                    SearchAction::Scripted { settle_delay, .. } => settle_delay.as_secs(),
                    SearchAction::OpenUrl { .. } => 0,
                };
                Reply::line(format!(
                    "Opening {}; the query is typed in after {delay}s.",
                    dispatched.destination.label
                ))
            }
            Err(error) => {
                tracing::warn!(%error, engine = dispatched.destination.label, "launch failed");
                Reply::line(format!("Could not open {}: {error}", dispatched.destination.label))
            }
        }
    }

    fn show_history(&self) -> Reply {
        let history = self.dispatcher.history();
        if history.is_empty() {
            return Reply::line("History is empty.");
        }
        Reply {
            lines: history
                .newest_first()
                .enumerate()
                .map(|(index, entry)| format!("{:>3}  {}", index + 1, entry.display_line()))
                .collect(),
            flow: Flow::Continue,
        }
    }

    fn show_settings(&self) -> Reply {
        let settings = &self.settings;
        let default_engine = settings
            .default_destination(&self.registry())
            .map(|destination| destination.display_name())
            .unwrap_or_default();
        Reply {
            lines: vec![
                format!("hotkey          {}", settings.hotkey),
                format!("default_engine  {default_engine}"),
                format!("auto_focus      {}", settings.auto_focus),
                format!("start_minimized {}", settings.start_hidden),
                format!("max_history     {}", settings.max_history),
                format!("transparency    {:.2}", settings.panel_opacity),
                format!("file            {}", self.settings_store.path().display()),
            ],
            flow: Flow::Continue,
        }
    }

    fn update_setting(&mut self, key: &str, value: &str) -> Reply {
        let mut updated = self.settings.clone();
        if let Err(error) = updated.apply_update(key, value, &self.registry()) {
            return Reply::line(error.to_string());
        }

        let mut lines = Vec::new();
        if let Err(error) = self.settings_store.save(&updated) {
            tracing::error!(%error, "settings save failed");
            lines.push(format!("Settings were not saved: {error}"));
        }

        let previous = std::mem::replace(&mut self.settings, updated);
        self.apply_live(&previous, &mut lines);
        if lines.is_empty() {
            lines.push("Saved.".to_string());
        }
        Reply {
            lines,
            flow: Flow::Continue,
        }
    }

    fn apply_live(&mut self, previous: &Settings, lines: &mut Vec<String>) {
        let current = &self.settings;
        if current.panel_opacity != previous.panel_opacity {
            self.panel.set_opacity(current.panel_opacity);
        }
        if current.auto_focus != previous.auto_focus {
            self.controller.set_auto_focus(current.auto_focus);
        }
        if current.max_history != previous.max_history {
            self.dispatcher
                .history_mut()
                .set_limit(current.max_history)
                .log_if_ignored("history limit change");
        }
        if current.default_engine != previous.default_engine {
            if let Some(destination) = current.default_destination(&self.registry()) {
                self.selected = destination;
            }
        }
        if current.hotkey != previous.hotkey {
            lines.push(format!(
                "Hotkey set to {}; restart to use it.",
                current.hotkey
            ));
        }
    }
}

const HELP_LINES: [&str; 13] = [
    "<query>          search the selected engine (append `N to pick engine N)",
    ":next / :prev    cycle engines",
    ":engines         list engines",
    ":use N           select engine N",
    ":history         list recent searches",
    ":replay N        run history entry N again",
    ":clear           clear history",
    ":settings        show settings",
    ":set KEY VALUE   change a setting",
    ":hide            toggle the panel",
    ":quit            hide the panel and keep listening",
    ":exit            stop",
    ":help            this list",
];

/// Startup notice for a binding that could not be registered. Suggests the
/// other known-good bindings so the user can `:set hotkey` and restart.
pub fn hotkey_unavailable_notice(hotkey: &str, error: &HotkeyRuntimeError) -> String {
    let alternatives: Vec<&str> = HOTKEY_SUGGESTIONS
        .into_iter()
        .filter(|candidate| !candidate.eq_ignore_ascii_case(hotkey))
        .collect();
    format!(
        "Hotkey {hotkey} unavailable: {error}. Try `:set hotkey` with one of: {}.",
        alternatives.join(", ")
    )
}

pub fn run() -> Result<(), RuntimeError> {
    let config = Config::from_env();
    config::validate(&config)?;
    let _log_guard = logging::init(&config.logs_dir)?;
    tracing::info!(data_dir = %config.data_dir.display(), "startup");

    #[cfg(target_os = "windows")]
    let _single_instance = match acquire_single_instance_guard() {
        Ok(Some(guard)) => guard,
        Ok(None) => {
            println!("[hotsearch] already running; exiting duplicate process");
            tracing::info!("runtime already active; exiting duplicate process");
            return Ok(());
        }
        Err(error) => return Err(RuntimeError::SingleInstance(error)),
    };

    let registry = EngineRegistry::builtin();
    let settings_store = SettingsStore::new(&config.settings_path, registry);
    let settings = settings_store.load();
    let history = HistoryStore::load(&config.history_path, settings.max_history);
    let dispatcher = SearchDispatcher::new(registry, history);

    let console = Arc::new(ConsolePanel::attach());
    let panel: Arc<dyn Panel> = console.clone();
    panel.set_opacity(settings.panel_opacity);
    let controller = Arc::new(VisibilityController::new(
        Arc::clone(&panel),
        foreground::detect(),
        settings.auto_focus,
    ));
    controller.apply_initial(settings.start_hidden);

    let listener = {
        let controller = Arc::clone(&controller);
        match HotkeyListener::spawn(&settings.hotkey, default_hotkey_registrar(), move || {
            controller.toggle();
        }) {
            Ok(listener) => Some(listener),
            Err(error) => {
                tracing::warn!(%error, hotkey = %settings.hotkey, "continuing without a global hotkey");
                console.notice(&hotkey_unavailable_notice(&settings.hotkey, &error));
                None
            }
        }
    };

    let mut session = Session::new(
        settings_store,
        settings,
        dispatcher,
        ActionExecutor::default(),
        Arc::clone(&controller),
        panel,
    )?;
    console.notice("Type a query and press Enter. :help lists commands.");

    let result = interactive_loop(&mut session, &console);

    if let Some(listener) = listener {
        match listener.shutdown() {
            Ok(()) | Err(HotkeyRuntimeError::UnsupportedPlatform) => {}
            Err(error) => tracing::warn!(%error, "hotkey listener did not stop cleanly"),
        }
    }
    tracing::info!("shutdown");
    result
}

fn interactive_loop(session: &mut Session, console: &ConsolePanel) -> Result<(), RuntimeError> {
    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        console.prompt(session.selected().label);
        let Some(line) = lines.next() else {
            return Ok(());
        };
        let line = line.map_err(RuntimeError::Input)?;

        let reply = session.handle_line(&line);
        for message in &reply.lines {
            console.notice(message);
        }
        if reply.flow == Flow::Exit {
            return Ok(());
        }
    }
}

#[cfg(target_os = "windows")]
struct SingleInstanceGuard {
    handle: windows_sys::Win32::Foundation::HANDLE,
}

#[cfg(target_os = "windows")]
impl Drop for SingleInstanceGuard {
    fn drop(&mut self) {
        unsafe {
            windows_sys::Win32::Foundation::CloseHandle(self.handle);
        }
    }
}

#[cfg(target_os = "windows")]
fn acquire_single_instance_guard() -> Result<Option<SingleInstanceGuard>, String> {
    use windows_sys::Win32::Foundation::{CloseHandle, GetLastError, ERROR_ALREADY_EXISTS};
    use windows_sys::Win32::System::Threading::CreateMutexW;

    let mutex_name: Vec<u16> = "Local\\HotSearchRuntimeSingleton"
        .encode_utf16()
        .chain(std::iter::once(0))
        .collect();
    let handle = unsafe { CreateMutexW(std::ptr::null(), 0, mutex_name.as_ptr()) };
    if handle.is_null() {
        let error = unsafe { GetLastError() };
        return Err(format!("CreateMutexW failed with error {error}"));
    }

    if unsafe { GetLastError() } == ERROR_ALREADY_EXISTS {
        unsafe {
            CloseHandle(handle);
        }
        return Ok(None);
    }

    Ok(Some(SingleInstanceGuard { handle }))
}
