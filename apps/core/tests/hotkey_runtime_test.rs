use hotsearch_core::hotkey_runtime::{
    default_hotkey_registrar, HotkeyRegistrar, HotkeyRegistration, HotkeyRuntimeError,
    MockHotkeyRegistrar,
};

#[test]
fn mock_registrar_tracks_registration_lifecycle() {
    let mut registrar = MockHotkeyRegistrar::default();

    let first = registrar.register_hotkey("Ctrl+Alt+Space").unwrap();
    assert_eq!(first, HotkeyRegistration::Noop("Ctrl+Alt+Space".to_string()));
    assert_eq!(registrar.registrations().len(), 1);

    registrar.unregister_all().unwrap();
    assert!(registrar.registrations().is_empty());
}

#[test]
fn mock_registrar_rejects_malformed_binding() {
    let mut registrar = MockHotkeyRegistrar::default();
    let result = registrar.register_hotkey("Space");
    assert!(matches!(result, Err(HotkeyRuntimeError::InvalidHotkey(_))));
    assert!(registrar.registrations().is_empty());
}

#[test]
fn mock_registrar_replays_scripted_presses_in_order() {
    let mut registrar = MockHotkeyRegistrar::with_presses(vec![1, 1, 2]);
    registrar.register_hotkey("Ctrl+Alt+Space").unwrap();

    let mut seen = Vec::new();
    registrar.wait_for_hotkeys(&mut |id: i32| seen.push(id)).unwrap();
    assert_eq!(seen, vec![1, 1, 2]);

    // Presses are consumed; a second wait returns immediately.
    registrar.wait_for_hotkeys(&mut |id: i32| seen.push(id)).unwrap();
    assert_eq!(seen.len(), 3);
}

#[test]
fn failing_mock_reports_registration_failure() {
    let mut registrar = MockHotkeyRegistrar::failing();
    let result = registrar.register_hotkey("Ctrl+Alt+Space");
    assert!(matches!(result, Err(HotkeyRuntimeError::RegistrationFailed(_))));
}

#[cfg(not(target_os = "windows"))]
#[test]
fn default_registrar_is_noop_on_non_windows() {
    let mut registrar = default_hotkey_registrar();

    let registration = registrar.register_hotkey("Ctrl+Alt+Space").unwrap();
    assert_eq!(
        registration,
        HotkeyRegistration::Noop("Ctrl+Alt+Space".to_string())
    );
    assert_eq!(
        registrar.wait_for_hotkeys(&mut |_: i32| {}),
        Err(HotkeyRuntimeError::UnsupportedPlatform)
    );
    registrar.unregister_all().unwrap();
}
