use std::sync::Arc;

/// Native window identifier (an `HWND` on Windows).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowHandle(pub isize);

/// Forces a window to the foreground past the OS focus-stealing guard.
/// Implementations swallow every failure.
pub trait ForegroundEscalator: Send + Sync {
    fn bring_to_foreground(&self, handle: WindowHandle);
}

#[cfg(target_os = "windows")]
pub struct WindowsForegroundEscalator;

#[cfg(target_os = "windows")]
impl ForegroundEscalator for WindowsForegroundEscalator {
    fn bring_to_foreground(&self, handle: WindowHandle) {
        use windows_sys::Win32::UI::Input::KeyboardAndMouse::{
            keybd_event, KEYEVENTF_KEYUP, VK_MENU,
        };
        use windows_sys::Win32::UI::WindowsAndMessaging::{
            SetForegroundWindow, ShowWindow, SW_SHOWNORMAL,
        };

        let hwnd = handle.0 as windows_sys::Win32::Foundation::HWND;
        if hwnd.is_null() {
            return;
        }

        // A synthetic ALT press makes this process the last input receiver,
        // which SetForegroundWindow requires.
        let ok = unsafe {
            ShowWindow(hwnd, SW_SHOWNORMAL);
            keybd_event(VK_MENU as u8, 0, 0, 0);
            let ok = SetForegroundWindow(hwnd);
            keybd_event(VK_MENU as u8, 0, KEYEVENTF_KEYUP, 0);
            ok
        };
        if ok == 0 {
            tracing::debug!(hwnd = handle.0, "SetForegroundWindow refused");
        }
    }
}

/// The platform escalator, if this platform has one.
pub fn detect() -> Option<Arc<dyn ForegroundEscalator>> {
    #[cfg(target_os = "windows")]
    {
        Some(Arc::new(WindowsForegroundEscalator))
    }

    #[cfg(not(target_os = "windows"))]
    {
        None
    }
}
