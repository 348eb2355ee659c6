use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::foreground::WindowHandle;

/// Interface of the interactive surface. Every method may be called from the
/// hotkey thread as well as the interactive loop.
pub trait Panel: Send + Sync {
    fn reveal(&self);
    fn withdraw(&self);
    fn raise(&self);
    fn request_focus(&self);
    fn focus_query_input(&self);
    fn set_always_on_top(&self, on_top: bool);
    fn set_opacity(&self, opacity: f64);
    fn window_handle(&self) -> Option<WindowHandle>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelCommand {
    Submit(String),
    NextEngine,
    PreviousEngine,
    UseEngine(usize),
    ListEngines,
    ShowHistory,
    Replay(usize),
    ClearHistory,
    ShowSettings,
    SetSetting { key: String, value: String },
    Toggle,
    Quit,
    Exit,
    Help,
    Invalid(String),
}

/// Maps one line typed into the panel to a command. Lines that do not start
/// with `:` are queries.
pub fn parse_command(line: &str) -> PanelCommand {
    let trimmed = line.trim();
    let Some(rest) = trimmed.strip_prefix(':') else {
        return PanelCommand::Submit(trimmed.to_string());
    };

    let mut parts = rest.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or_default().to_ascii_lowercase();
    let arg = parts.next().map(str::trim).unwrap_or_default();

    match name.as_str() {
        "next" | "n" => PanelCommand::NextEngine,
        "prev" | "p" => PanelCommand::PreviousEngine,
        "engines" | "e" => PanelCommand::ListEngines,
        "use" | "u" => match arg.parse::<usize>() {
            Ok(ordinal) => PanelCommand::UseEngine(ordinal),
            Err(_) => PanelCommand::Invalid("usage: :use <engine number>".to_string()),
        },
        "history" | "h" => PanelCommand::ShowHistory,
        "replay" | "r" => match arg.parse::<usize>() {
            Ok(position) if position > 0 => PanelCommand::Replay(position),
            _ => PanelCommand::Invalid("usage: :replay <history number>".to_string()),
        },
        "clear" => PanelCommand::ClearHistory,
        "settings" => PanelCommand::ShowSettings,
        "set" => match arg.split_once(char::is_whitespace) {
            Some((key, value)) if !value.trim().is_empty() => PanelCommand::SetSetting {
                key: key.to_ascii_lowercase(),
                value: value.trim().to_string(),
            },
            _ => PanelCommand::Invalid("usage: :set <key> <value>".to_string()),
        },
        "hide" | "toggle" => PanelCommand::Toggle,
        "quit" | "q" => PanelCommand::Quit,
        "exit" => PanelCommand::Exit,
        "help" | "?" => PanelCommand::Help,
        other => PanelCommand::Invalid(format!("unknown command ':{other}'")),
    }
}

/// Panel backed by the process console. On Windows the console window itself
/// is shown, hidden, pinned and made translucent; elsewhere the state is only
/// tracked.
pub struct ConsolePanel {
    #[cfg_attr(not(target_os = "windows"), allow(dead_code))]
    hwnd: isize,
    visible: AtomicBool,
}

impl ConsolePanel {
    pub fn attach() -> Self {
        Self {
            hwnd: console_window(),
            visible: AtomicBool::new(false),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    pub fn notice(&self, message: &str) {
        println!("{message}");
    }

    pub fn prompt(&self, engine: &str) {
        print!("[{engine}] > ");
        flush_logged(&mut std::io::stdout(), "prompt");
    }
}

impl Panel for ConsolePanel {
    fn reveal(&self) {
        self.visible.store(true, Ordering::SeqCst);
        #[cfg(target_os = "windows")]
        native::show(self.hwnd, true);
    }

    fn withdraw(&self) {
        self.visible.store(false, Ordering::SeqCst);
        #[cfg(target_os = "windows")]
        native::show(self.hwnd, false);
    }

    fn raise(&self) {
        #[cfg(target_os = "windows")]
        native::raise(self.hwnd);
    }

    fn request_focus(&self) {
        #[cfg(target_os = "windows")]
        native::activate(self.hwnd);
    }

    /// The console has a single input line, so focusing it means making sure
    /// the pending prompt is on screen.
    fn focus_query_input(&self) {
        flush_logged(&mut std::io::stdout(), "focus query input");
    }

    fn set_always_on_top(&self, on_top: bool) {
        #[cfg(target_os = "windows")]
        native::set_topmost(self.hwnd, on_top);
        #[cfg(not(target_os = "windows"))]
        tracing::trace!(on_top, "always-on-top unsupported for this console");
    }

    fn set_opacity(&self, opacity: f64) {
        #[cfg(target_os = "windows")]
        native::set_opacity(self.hwnd, opacity);
        #[cfg(not(target_os = "windows"))]
        tracing::debug!(opacity, "panel opacity unsupported for this console");
    }

    fn window_handle(&self) -> Option<WindowHandle> {
        #[cfg(target_os = "windows")]
        if self.hwnd != 0 {
            return Some(WindowHandle(self.hwnd));
        }
        None
    }
}

#[cfg(target_os = "windows")]
fn console_window() -> isize {
    unsafe { windows_sys::Win32::System::Console::GetConsoleWindow() as isize }
}

#[cfg(not(target_os = "windows"))]
fn console_window() -> isize {
    0
}

#[cfg(target_os = "windows")]
mod native {
    use windows_sys::Win32::Foundation::HWND;
    use windows_sys::Win32::UI::Input::KeyboardAndMouse::SetActiveWindow;
    use windows_sys::Win32::UI::WindowsAndMessaging::{
        BringWindowToTop, GetWindowLongPtrW, SetLayeredWindowAttributes,
        SetWindowLongPtrW, SetWindowPos, ShowWindow, GWL_EXSTYLE, HWND_NOTOPMOST, HWND_TOPMOST,
        LWA_ALPHA, SWP_NOACTIVATE, SWP_NOMOVE, SWP_NOSIZE, SW_HIDE, SW_SHOW, WS_EX_LAYERED,
    };

    fn handle(raw: isize) -> Option<HWND> {
        let hwnd = raw as HWND;
        (!hwnd.is_null()).then_some(hwnd)
    }

    pub fn show(raw: isize, visible: bool) {
        if let Some(hwnd) = handle(raw) {
            unsafe {
                ShowWindow(hwnd, if visible { SW_SHOW } else { SW_HIDE });
            }
        }
    }

    pub fn raise(raw: isize) {
        if let Some(hwnd) = handle(raw) {
            unsafe {
                BringWindowToTop(hwnd);
            }
        }
    }

    pub fn activate(raw: isize) {
        if let Some(hwnd) = handle(raw) {
            unsafe {
                SetActiveWindow(hwnd);
            }
        }
    }

    pub fn set_topmost(raw: isize, on_top: bool) {
        if let Some(hwnd) = handle(raw) {
            let insert_after = if on_top { HWND_TOPMOST } else { HWND_NOTOPMOST };
            unsafe {
                SetWindowPos(
                    hwnd,
                    insert_after,
                    0,
                    0,
                    0,
                    0,
                    SWP_NOMOVE | SWP_NOSIZE | SWP_NOACTIVATE,
                );
            }
        }
    }

    pub fn set_opacity(raw: isize, opacity: f64) {
        let Some(hwnd) = handle(raw) else {
            return;
        };
        let alpha = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
        unsafe {
            let ex_style = GetWindowLongPtrW(hwnd, GWL_EXSTYLE);
            SetWindowLongPtrW(hwnd, GWL_EXSTYLE, ex_style | WS_EX_LAYERED as isize);
            if SetLayeredWindowAttributes(hwnd, 0, alpha, LWA_ALPHA) == 0 {
                tracing::debug!("SetLayeredWindowAttributes refused on console window");
            }
        }
    }
}

fn flush_logged(writer: &mut impl Write, context: &'static str) -> bool {
    match writer.flush() {
        Ok(()) => true,
        Err(error) => {
            tracing::debug!(%error, context, "console flush failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{flush_logged, parse_command, PanelCommand};
    use std::io::Write;

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }
    }

    #[test]
    fn flush_failure_is_reported_not_swallowed() {
        assert!(!flush_logged(&mut BrokenPipe, "prompt"));
        assert!(flush_logged(&mut Vec::<u8>::new(), "prompt"));
    }
    #[cfg(not(target_os = "windows"))]
    use super::{ConsolePanel, Panel};

    #[cfg(not(target_os = "windows"))]
    #[test]
    fn console_panel_tracks_visibility_without_a_window() {
        let panel = ConsolePanel::attach();
        assert!(!panel.is_visible());
        panel.reveal();
        assert!(panel.is_visible());
        assert!(panel.window_handle().is_none());
        panel.withdraw();
        assert!(!panel.is_visible());
    }

    #[test]
    fn plain_text_is_a_query() {
        assert_eq!(
            parse_command("  rust borrow checker`5 "),
            PanelCommand::Submit("rust borrow checker`5".to_string())
        );
    }

    #[test]
    fn parses_commands_with_arguments() {
        assert_eq!(parse_command(":use 3"), PanelCommand::UseEngine(3));
        assert_eq!(parse_command(":replay 2"), PanelCommand::Replay(2));
        assert_eq!(
            parse_command(":set transparency 0.8"),
            PanelCommand::SetSetting {
                key: "transparency".to_string(),
                value: "0.8".to_string()
            }
        );
        assert_eq!(parse_command(":next"), PanelCommand::NextEngine);
        assert_eq!(parse_command(":quit"), PanelCommand::Quit);
    }

    #[test]
    fn malformed_commands_are_reported() {
        assert!(matches!(parse_command(":replay 0"), PanelCommand::Invalid(_)));
        assert!(matches!(parse_command(":set hotkey"), PanelCommand::Invalid(_)));
        assert!(matches!(parse_command(":bogus"), PanelCommand::Invalid(_)));
    }
}
