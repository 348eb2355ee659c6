use thiserror::Error;

use crate::hotkey::parse_hotkey;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HotkeyRegistration {
    Native(i32),
    Noop(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HotkeyRuntimeError {
    #[error("invalid hotkey: {0}")]
    InvalidHotkey(String),
    #[error("hotkey registration failed: {0}")]
    RegistrationFailed(String),
    #[error("hotkey event loop failed: {0}")]
    EventLoopFailed(String),
    #[error("global hotkeys are not supported on this platform")]
    UnsupportedPlatform,
}

/// Owns global shortcut registrations. Registration and the event wait must
/// happen on the same thread: on Windows the hotkey messages are posted to the
/// registering thread's queue.
pub trait HotkeyRegistrar: Send {
    fn register_hotkey(&mut self, hotkey: &str) -> Result<HotkeyRegistration, HotkeyRuntimeError>;
    fn unregister_all(&mut self) -> Result<(), HotkeyRuntimeError>;
    /// Blocks, calling `on_hotkey` with the registration id for every press,
    /// until the loop is told to quit.
    fn wait_for_hotkeys(
        &mut self,
        on_hotkey: &mut dyn FnMut(i32),
    ) -> Result<(), HotkeyRuntimeError>;
}

/// Test registrar that replays a fixed list of presses and then returns.
#[derive(Default)]
pub struct MockHotkeyRegistrar {
    registrations: Vec<String>,
    scripted_presses: Vec<i32>,
    fail_registration: bool,
}

impl MockHotkeyRegistrar {
    pub fn with_presses(presses: Vec<i32>) -> Self {
        Self {
            scripted_presses: presses,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_registration: true,
            ..Self::default()
        }
    }

    pub fn registrations(&self) -> &[String] {
        &self.registrations
    }
}

impl HotkeyRegistrar for MockHotkeyRegistrar {
    fn register_hotkey(&mut self, hotkey: &str) -> Result<HotkeyRegistration, HotkeyRuntimeError> {
        parse_hotkey(hotkey).map_err(HotkeyRuntimeError::InvalidHotkey)?;
        if self.fail_registration {
            return Err(HotkeyRuntimeError::RegistrationFailed(format!(
                "'{hotkey}' is already taken"
            )));
        }
        self.registrations.push(hotkey.to_string());
        Ok(HotkeyRegistration::Noop(hotkey.to_string()))
    }

    fn unregister_all(&mut self) -> Result<(), HotkeyRuntimeError> {
        self.registrations.clear();
        Ok(())
    }

    fn wait_for_hotkeys(
        &mut self,
        on_hotkey: &mut dyn FnMut(i32),
    ) -> Result<(), HotkeyRuntimeError> {
        for id in self.scripted_presses.drain(..) {
            on_hotkey(id);
        }
        Ok(())
    }
}

#[cfg(not(target_os = "windows"))]
pub struct NoopHotkeyRegistrar;

#[cfg(not(target_os = "windows"))]
impl HotkeyRegistrar for NoopHotkeyRegistrar {
    fn register_hotkey(&mut self, hotkey: &str) -> Result<HotkeyRegistration, HotkeyRuntimeError> {
        parse_hotkey(hotkey).map_err(HotkeyRuntimeError::InvalidHotkey)?;
        Ok(HotkeyRegistration::Noop(hotkey.to_string()))
    }

    fn unregister_all(&mut self) -> Result<(), HotkeyRuntimeError> {
        Ok(())
    }

    fn wait_for_hotkeys(
        &mut self,
        _on_hotkey: &mut dyn FnMut(i32),
    ) -> Result<(), HotkeyRuntimeError> {
        run_message_loop(|_| {})
    }
}

#[cfg(target_os = "windows")]
pub struct WindowsHotkeyRegistrar {
    next_id: i32,
    registered_ids: Vec<i32>,
}

#[cfg(target_os = "windows")]
impl Default for WindowsHotkeyRegistrar {
    fn default() -> Self {
        Self {
            next_id: 1,
            registered_ids: Vec::new(),
        }
    }
}

#[cfg(target_os = "windows")]
impl HotkeyRegistrar for WindowsHotkeyRegistrar {
    fn register_hotkey(&mut self, hotkey: &str) -> Result<HotkeyRegistration, HotkeyRuntimeError> {
        use windows_sys::Win32::UI::Input::KeyboardAndMouse::{
            RegisterHotKey, MOD_ALT, MOD_CONTROL, MOD_NOREPEAT, MOD_SHIFT, VK_DOWN, VK_F1, VK_LEFT,
            VK_RIGHT, VK_SPACE, VK_UP,
        };

        let parsed = parse_hotkey(hotkey).map_err(HotkeyRuntimeError::InvalidHotkey)?;

        // MOD_NOREPEAT keeps a held chord from flooding the toggle.
        let mut modifiers = MOD_NOREPEAT;
        for modifier in &parsed.modifiers {
            match modifier.to_ascii_lowercase().as_str() {
                "alt" => modifiers |= MOD_ALT,
                "ctrl" | "control" => modifiers |= MOD_CONTROL,
                "shift" => modifiers |= MOD_SHIFT,
                _ => {
                    return Err(HotkeyRuntimeError::InvalidHotkey(format!(
                        "unsupported modifier: {modifier}"
                    )))
                }
            }
        }

        let key_upper = parsed.key.to_ascii_uppercase();
        let vk: u32 = match key_upper.as_str() {
            "SPACE" => VK_SPACE as u32,
            "LEFT" => VK_LEFT as u32,
            "RIGHT" => VK_RIGHT as u32,
            "UP" => VK_UP as u32,
            "DOWN" => VK_DOWN as u32,
            _ if key_upper.len() == 1 && key_upper.as_bytes()[0].is_ascii_alphanumeric() => {
                key_upper.as_bytes()[0] as u32
            }
            _ => match key_upper
                .strip_prefix('F')
                .and_then(|n| n.parse::<u32>().ok())
            {
                Some(n) if (1..=24).contains(&n) => VK_F1 as u32 + (n - 1),
                _ => {
                    return Err(HotkeyRuntimeError::InvalidHotkey(format!(
                        "unsupported key: {}",
                        parsed.key
                    )))
                }
            },
        };

        let id = self.next_id;
        self.next_id += 1;

        let ok = unsafe { RegisterHotKey(std::ptr::null_mut(), id, modifiers, vk) };
        if ok == 0 {
            return Err(HotkeyRuntimeError::RegistrationFailed(format!(
                "RegisterHotKey failed for '{hotkey}'"
            )));
        }

        self.registered_ids.push(id);
        Ok(HotkeyRegistration::Native(id))
    }

    fn unregister_all(&mut self) -> Result<(), HotkeyRuntimeError> {
        use windows_sys::Win32::UI::Input::KeyboardAndMouse::UnregisterHotKey;

        for id in self.registered_ids.drain(..) {
            unsafe {
                UnregisterHotKey(std::ptr::null_mut(), id);
            }
        }
        Ok(())
    }

    fn wait_for_hotkeys(
        &mut self,
        on_hotkey: &mut dyn FnMut(i32),
    ) -> Result<(), HotkeyRuntimeError> {
        run_message_loop(on_hotkey)
    }
}

pub fn default_hotkey_registrar() -> Box<dyn HotkeyRegistrar> {
    #[cfg(target_os = "windows")]
    {
        Box::new(WindowsHotkeyRegistrar::default())
    }

    #[cfg(not(target_os = "windows"))]
    {
        Box::new(NoopHotkeyRegistrar)
    }
}

/// Id of the calling thread as the OS message queue knows it.
pub fn current_native_thread_id() -> u32 {
    #[cfg(target_os = "windows")]
    {
        unsafe { windows_sys::Win32::System::Threading::GetCurrentThreadId() }
    }

    #[cfg(not(target_os = "windows"))]
    {
        0
    }
}

/// Asks the message loop running on `thread_id` to return.
#[cfg(target_os = "windows")]
pub fn post_quit(thread_id: u32) -> Result<(), HotkeyRuntimeError> {
    use windows_sys::Win32::UI::WindowsAndMessaging::{PostThreadMessageW, WM_QUIT};

    let ok = unsafe { PostThreadMessageW(thread_id, WM_QUIT, 0, 0) };
    if ok == 0 {
        return Err(HotkeyRuntimeError::EventLoopFailed(format!(
            "PostThreadMessageW failed for thread {thread_id}"
        )));
    }
    Ok(())
}

#[cfg(not(target_os = "windows"))]
pub fn post_quit(_thread_id: u32) -> Result<(), HotkeyRuntimeError> {
    Ok(())
}

#[cfg(target_os = "windows")]
pub fn run_message_loop<F>(mut on_hotkey: F) -> Result<(), HotkeyRuntimeError>
where
    F: FnMut(i32),
{
    use windows_sys::Win32::UI::WindowsAndMessaging::{
        DispatchMessageW, GetMessageW, TranslateMessage, MSG, WM_HOTKEY,
    };

    let mut msg: MSG = unsafe { std::mem::zeroed() };
    loop {
        let status = unsafe { GetMessageW(&mut msg, std::ptr::null_mut(), 0, 0) };
        if status == -1 {
            return Err(HotkeyRuntimeError::EventLoopFailed(
                "GetMessageW returned -1".to_string(),
            ));
        }

        if status == 0 {
            return Ok(());
        }

        if msg.message == WM_HOTKEY {
            on_hotkey(msg.wParam as i32);
        }

        unsafe {
            TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }
}

#[cfg(not(target_os = "windows"))]
pub fn run_message_loop<F>(_on_hotkey: F) -> Result<(), HotkeyRuntimeError>
where
    F: FnMut(i32),
{
    Err(HotkeyRuntimeError::UnsupportedPlatform)
}
