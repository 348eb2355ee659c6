use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::engines::{Destination, EngineRegistry};
use crate::persistence::{read_optional, write_pretty_json, StoreError};

pub const DEFAULT_HOTKEY: &str = "Ctrl+Alt+Space";
pub const DEFAULT_MAX_HISTORY: usize = 100;
pub const MAX_HISTORY_LIMIT: usize = 10_000;
pub const DEFAULT_TRANSPARENCY: f64 = 0.95;

/// Bindings offered when the configured one cannot be registered.
pub const HOTKEY_SUGGESTIONS: [&str; 6] = [
    "Ctrl+Alt+Space",
    "Ctrl+Shift+Space",
    "Alt+Shift+Space",
    "Ctrl+Alt+Left",
    "Ctrl+Shift+K",
    "Ctrl+Alt+S",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("{0}")]
    InvalidHotkey(String),
    #[error("Max history must be between 0 and {MAX_HISTORY_LIMIT}.")]
    MaxHistoryOutOfRange,
    #[error("Transparency must be between 0.0 and 1.0.")]
    TransparencyOutOfRange,
    #[error("Default engine must be between 1 and {0}.")]
    EngineOutOfRange(usize),
    #[error("Unknown setting '{0}'.")]
    UnknownKey(String),
    #[error("Setting '{key}' expects {expected}.")]
    InvalidValue { key: String, expected: &'static str },
}

/// User preferences. Field names on disk follow the long-standing file
/// layout, so the serde names differ from the Rust ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub hotkey: String,
    /// Zero-based catalog index of the engine selected at startup.
    pub default_engine: usize,
    pub auto_focus: bool,
    #[serde(rename = "start_minimized")]
    pub start_hidden: bool,
    pub max_history: usize,
    #[serde(rename = "transparency")]
    pub panel_opacity: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hotkey: DEFAULT_HOTKEY.to_string(),
            default_engine: 0,
            auto_focus: true,
            start_hidden: false,
            max_history: DEFAULT_MAX_HISTORY,
            panel_opacity: DEFAULT_TRANSPARENCY,
        }
    }
}

impl Settings {
    /// Builds settings from an arbitrary JSON value, keeping every field that
    /// is individually valid and defaulting the rest.
    pub fn from_value(value: &Value, registry: &EngineRegistry) -> Self {
        let defaults = Self::default();
        let Some(map) = value.as_object() else {
            return defaults;
        };

        Self {
            hotkey: field(map, "hotkey", |v| {
                v.as_str().and_then(|raw| validate_hotkey(raw).ok())
            })
            .unwrap_or(defaults.hotkey),
            default_engine: field(map, "default_engine", |v| {
                whole_number(v).filter(|n| *n < registry.count())
            })
            .unwrap_or(defaults.default_engine),
            auto_focus: field(map, "auto_focus", Value::as_bool).unwrap_or(defaults.auto_focus),
            start_hidden: field(map, "start_minimized", Value::as_bool)
                .unwrap_or(defaults.start_hidden),
            max_history: field(map, "max_history", |v| {
                whole_number(v).filter(|n| validate_max_history(*n).is_ok())
            })
            .unwrap_or(defaults.max_history),
            panel_opacity: field(map, "transparency", |v| {
                v.as_f64().filter(|n| n.is_finite()).map(|n| n.clamp(0.0, 1.0))
            })
            .unwrap_or(defaults.panel_opacity),
        }
    }

    pub fn default_destination(&self, registry: &EngineRegistry) -> Option<&'static Destination> {
        registry
            .get(self.default_engine + 1)
            .or_else(|| registry.first())
    }

    /// Applies a single edit coming from the panel. The receiver is left
    /// untouched when the value is rejected.
    pub fn apply_update(
        &mut self,
        key: &str,
        value: &str,
        registry: &EngineRegistry,
    ) -> Result<(), SettingsError> {
        let value = value.trim();
        match key {
            "hotkey" => {
                self.hotkey = validate_hotkey(value)?;
            }
            "default_engine" => {
                let ordinal = parse_value::<usize>(key, value, "an engine number")?;
                if ordinal == 0 || ordinal > registry.count() {
                    return Err(SettingsError::EngineOutOfRange(registry.count()));
                }
                self.default_engine = ordinal - 1;
            }
            "auto_focus" => {
                self.auto_focus = parse_bool(key, value)?;
            }
            "start_minimized" | "start_hidden" => {
                self.start_hidden = parse_bool(key, value)?;
            }
            "max_history" => {
                let max = parse_value::<usize>(key, value, "a whole number")?;
                validate_max_history(max)?;
                self.max_history = max;
            }
            "transparency" | "opacity" => {
                let opacity = parse_value::<f64>(key, value, "a number")?;
                validate_transparency(opacity)?;
                self.panel_opacity = opacity;
            }
            other => return Err(SettingsError::UnknownKey(other.to_string())),
        }
        Ok(())
    }
}

fn field<T>(map: &Map<String, Value>, key: &str, read: impl FnOnce(&Value) -> Option<T>) -> Option<T> {
    let value = map.get(key)?;
    let parsed = read(value);
    if parsed.is_none() {
        tracing::warn!(key, %value, "invalid persisted setting; using default");
    }
    parsed
}

/// Hand-edited files may spell counts as `5.0`; json5 also reports some
/// integers as floats.
fn whole_number(value: &Value) -> Option<usize> {
    if let Some(n) = value.as_u64() {
        return usize::try_from(n).ok();
    }
    value
        .as_f64()
        .filter(|n| n.is_finite() && *n >= 0.0 && n.fract() == 0.0 && *n <= usize::MAX as f64)
        .map(|n| n as usize)
}

fn parse_value<T: std::str::FromStr>(
    key: &str,
    value: &str,
    expected: &'static str,
) -> Result<T, SettingsError> {
    value.parse::<T>().map_err(|_| SettingsError::InvalidValue {
        key: key.to_string(),
        expected,
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, SettingsError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => Err(SettingsError::InvalidValue {
            key: key.to_string(),
            expected: "true or false",
        }),
    }
}

pub struct SettingsStore {
    path: PathBuf,
    registry: EngineRegistry,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>, registry: EngineRegistry) -> Self {
        Self {
            path: path.into(),
            registry,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Never fails: a missing file, unparsable content or a non-object root
    /// all yield defaults.
    pub fn load(&self) -> Settings {
        let Some(raw) = read_optional(&self.path) else {
            return Settings::default();
        };

        match json5::from_str::<Value>(&raw) {
            Ok(value) => Settings::from_value(&value, &self.registry),
            Err(error) => {
                tracing::warn!(path = %self.path.display(), %error, "settings file is corrupt; using defaults");
                Settings::default()
            }
        }
    }

    /// Only called from an explicit save, so the error is handed back to be
    /// shown as a notice.
    pub fn save(&self, settings: &Settings) -> Result<(), StoreError> {
        write_pretty_json(&self.path, "settings", settings)
    }
}

/// Canonical form is `Ctrl`, `Alt`, `Shift` (each at most once, in that
/// order) followed by a single key.
pub fn validate_hotkey(input: &str) -> Result<String, SettingsError> {
    let mut tokens: Vec<&str> = input
        .split('+')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .collect();

    let key = match tokens.pop() {
        Some(key) if !tokens.is_empty() => key_label(key)?,
        _ => {
            return Err(invalid_hotkey(
                "A hotkey needs at least one modifier and a key, e.g. Ctrl+Alt+Space.",
            ))
        }
    };

    let mut modifiers = tokens
        .into_iter()
        .map(Modifier::parse)
        .collect::<Result<Vec<_>, _>>()?;
    modifiers.sort();
    modifiers.dedup();

    let canonical = modifiers
        .iter()
        .map(|modifier| modifier.label())
        .chain(std::iter::once(key.as_str()))
        .collect::<Vec<_>>()
        .join("+");
    if RESERVED_HOTKEYS.contains(&canonical.as_str()) {
        return Err(invalid_hotkey(format!(
            "{canonical} belongs to the system; pick another hotkey."
        )));
    }

    Ok(canonical)
}

pub fn validate_max_history(value: usize) -> Result<(), SettingsError> {
    if value <= MAX_HISTORY_LIMIT {
        Ok(())
    } else {
        Err(SettingsError::MaxHistoryOutOfRange)
    }
}

pub fn validate_transparency(value: f64) -> Result<(), SettingsError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SettingsError::TransparencyOutOfRange)
    }
}

const NAMED_KEYS: [&str; 5] = ["Space", "Left", "Right", "Up", "Down"];

const RESERVED_HOTKEYS: [&str; 8] = [
    "Alt+Tab",
    "Alt+F4",
    "Alt+Space",
    "Ctrl+C",
    "Ctrl+V",
    "Ctrl+X",
    "Ctrl+Alt+Delete",
    "Ctrl+Shift+Esc",
];

// Declaration order is display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Modifier {
    Ctrl,
    Alt,
    Shift,
}

impl Modifier {
    fn parse(token: &str) -> Result<Self, SettingsError> {
        match token.to_ascii_lowercase().as_str() {
            "ctrl" | "control" => Ok(Self::Ctrl),
            "alt" => Ok(Self::Alt),
            "shift" => Ok(Self::Shift),
            "win" | "windows" | "meta" | "super" => Err(invalid_hotkey(
                "The Windows key cannot be part of the hotkey.",
            )),
            _ => Err(invalid_hotkey(format!(
                "'{token}' is not a modifier; use Ctrl, Alt or Shift."
            ))),
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Ctrl => "Ctrl",
            Self::Alt => "Alt",
            Self::Shift => "Shift",
        }
    }
}

fn key_label(token: &str) -> Result<String, SettingsError> {
    if let Some(named) = NAMED_KEYS.iter().find(|name| name.eq_ignore_ascii_case(token)) {
        return Ok((*named).to_string());
    }

    let upper = token.to_ascii_uppercase();
    if let Some(number) = upper.strip_prefix('F').and_then(|n| n.parse::<u8>().ok()) {
        return match number {
            1..=24 => Ok(format!("F{number}")),
            _ => Err(invalid_hotkey("Function keys go from F1 to F24.")),
        };
    }

    match upper.as_bytes() {
        [c] if c.is_ascii_alphanumeric() => Ok(upper),
        _ => Err(invalid_hotkey(format!(
            "'{token}' cannot be bound; use a letter, a digit, Space, an arrow or F1-F24."
        ))),
    }
}

fn invalid_hotkey(message: impl Into<String>) -> SettingsError {
    SettingsError::InvalidHotkey(message.into())
}
