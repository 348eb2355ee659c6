use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use hotsearch_core::engines::EngineRegistry;
use hotsearch_core::settings::{
    validate_hotkey, validate_max_history, validate_transparency, Settings, SettingsError,
    SettingsStore, DEFAULT_HOTKEY, HOTKEY_SUGGESTIONS,
};

fn unique_temp_path(label: &str) -> PathBuf {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after unix epoch")
        .as_nanos();
    std::env::temp_dir().join(format!(
        "hotsearch-{label}-{}-{unique}",
        std::process::id()
    ))
}

#[test]
fn validates_and_canonicalizes_hotkey() {
    let canonical = validate_hotkey(" shift + ctrl + p ").unwrap();
    assert_eq!(canonical, "Ctrl+Shift+P");
    assert_eq!(validate_hotkey("alt+ctrl+left").unwrap(), "Ctrl+Alt+Left");
    assert_eq!(validate_hotkey("ctrl+alt+f12").unwrap(), "Ctrl+Alt+F12");
}

#[test]
fn rejects_reserved_hotkey() {
    assert!(validate_hotkey("Alt+Space").is_err());
    assert!(validate_hotkey("Alt+F4").is_err());
}

#[test]
fn rejects_win_modifier_hotkey() {
    assert!(validate_hotkey("Win+P").is_err());
}

#[test]
fn repeated_modifiers_collapse_and_names_are_case_insensitive() {
    assert_eq!(validate_hotkey("CTRL+control+SpAcE").unwrap(), "Ctrl+Space");
    assert_eq!(validate_hotkey("shift+alt+DOWN").unwrap(), "Alt+Shift+Down");
    assert_eq!(validate_hotkey("ctrl++f").unwrap(), "Ctrl+F");
    assert_eq!(validate_hotkey("ctrl+7").unwrap(), "Ctrl+7");
}

#[test]
fn reserved_check_applies_after_canonicalization() {
    assert!(validate_hotkey("ALT + space").is_err());
    assert!(validate_hotkey("control + c").is_err());
    assert!(validate_hotkey("Ctrl+Shift+C").is_ok());
}

#[test]
fn rejection_messages_name_the_problem() {
    assert_eq!(
        validate_hotkey("Ctrl+F0"),
        Err(SettingsError::InvalidHotkey(
            "Function keys go from F1 to F24.".to_string()
        ))
    );
    let Err(SettingsError::InvalidHotkey(message)) = validate_hotkey("Hyper+K") else {
        panic!("unknown modifier should be rejected");
    };
    assert!(message.contains("'Hyper'"));
}

#[test]
fn rejects_unsupported_keys() {
    assert!(validate_hotkey("Ctrl+F25").is_err());
    assert!(validate_hotkey("Ctrl+Home").is_err());
    assert!(validate_hotkey("Ctrl").is_err());
}

#[test]
fn suggested_hotkeys_are_already_canonical() {
    for suggestion in HOTKEY_SUGGESTIONS {
        assert_eq!(validate_hotkey(suggestion).as_deref(), Ok(suggestion));
    }
}

#[test]
fn validates_max_history_range() {
    assert!(validate_max_history(0).is_ok());
    assert!(validate_max_history(10_000).is_ok());
    assert_eq!(
        validate_max_history(10_001),
        Err(SettingsError::MaxHistoryOutOfRange)
    );
}

#[test]
fn validates_transparency_range() {
    assert!(validate_transparency(0.0).is_ok());
    assert!(validate_transparency(1.0).is_ok());
    assert!(validate_transparency(1.01).is_err());
    assert!(validate_transparency(-0.1).is_err());
}

#[test]
fn missing_file_loads_defaults() {
    let dir = unique_temp_path("settings-missing");
    let store = SettingsStore::new(dir.join("settings.json"), EngineRegistry::builtin());
    assert_eq!(store.load(), Settings::default());
}

#[test]
fn saved_settings_round_trip_with_on_disk_key_names() {
    let dir = unique_temp_path("settings-roundtrip");
    let path = dir.join("settings.json");
    let store = SettingsStore::new(&path, EngineRegistry::builtin());

    let settings = Settings {
        hotkey: "Ctrl+Shift+K".to_string(),
        default_engine: 2,
        auto_focus: false,
        start_hidden: true,
        max_history: 25,
        panel_opacity: 0.8,
    };
    store.save(&settings).unwrap();

    let raw = fs::read_to_string(&path).unwrap();
    assert!(raw.contains("\"start_minimized\": true"));
    assert!(raw.contains("\"transparency\": 0.8"));
    assert_eq!(store.load(), settings);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn corrupt_file_loads_defaults() {
    let dir = unique_temp_path("settings-corrupt");
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("settings.json");
    fs::write(&path, "{ hotkey: ").unwrap();

    let store = SettingsStore::new(&path, EngineRegistry::builtin());
    assert_eq!(store.load(), Settings::default());

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn hand_edited_file_with_comments_is_accepted() {
    let dir = unique_temp_path("settings-json5");
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("settings.json");
    fs::write(
        &path,
        r#"{
            // picked from the presets
            hotkey: "ctrl+shift+space",
            default_engine: 1,
            max_history: 5, // short
        }"#,
    )
    .unwrap();

    let store = SettingsStore::new(&path, EngineRegistry::builtin());
    let settings = store.load();
    assert_eq!(settings.hotkey, "Ctrl+Shift+Space");
    assert_eq!(settings.default_engine, 1);
    assert_eq!(settings.max_history, 5);
    assert!(settings.auto_focus);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn apply_update_validates_before_changing_anything() {
    let registry = EngineRegistry::builtin();
    let mut settings = Settings::default();

    assert!(settings.apply_update("transparency", "1.5", &registry).is_err());
    assert!(settings.apply_update("hotkey", "Win+Q", &registry).is_err());
    assert_eq!(
        settings.apply_update("default_engine", "21", &registry),
        Err(SettingsError::EngineOutOfRange(20))
    );
    assert_eq!(
        settings.apply_update("colour", "blue", &registry),
        Err(SettingsError::UnknownKey("colour".to_string()))
    );
    assert_eq!(settings, Settings::default());

    settings.apply_update("default_engine", "5", &registry).unwrap();
    settings.apply_update("auto_focus", "off", &registry).unwrap();
    settings.apply_update("hotkey", "shift+alt+space", &registry).unwrap();
    assert_eq!(settings.default_engine, 4);
    assert!(!settings.auto_focus);
    assert_eq!(settings.hotkey, "Alt+Shift+Space");
    assert_ne!(settings.hotkey, DEFAULT_HOTKEY);
}
