#[test]
fn parses_default_hotkey() {
    let parsed = hotsearch_core::hotkey::parse_hotkey("Ctrl+Alt+Space").unwrap();
    assert_eq!(parsed.modifiers, vec!["Ctrl".to_string(), "Alt".to_string()]);
    assert_eq!(parsed.key, "Space");
}

#[test]
fn trims_parts_and_skips_empty_segments() {
    let parsed = hotsearch_core::hotkey::parse_hotkey(" ctrl + + left ").unwrap();
    assert_eq!(parsed.modifiers, vec!["ctrl".to_string()]);
    assert_eq!(parsed.key, "left");
}

#[test]
fn rejects_bare_key() {
    assert!(hotsearch_core::hotkey::parse_hotkey("Space").is_err());
    assert!(hotsearch_core::hotkey::parse_hotkey("").is_err());
}
