use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::hotkey_runtime::{
    current_native_thread_id, post_quit, HotkeyRegistrar, HotkeyRegistration, HotkeyRuntimeError,
};

const LISTENER_THREAD_NAME: &str = "hotsearch-hotkey";
const QUIT_ATTEMPTS: u32 = 20;
const QUIT_RETRY_INTERVAL: Duration = Duration::from_millis(10);

/// Background thread that owns the global shortcut for the process lifetime.
/// It holds no locks of its own; the callback is expected to be safe to call
/// from any thread.
pub struct HotkeyListener {
    thread: JoinHandle<Result<(), HotkeyRuntimeError>>,
    native_thread_id: u32,
    registration: HotkeyRegistration,
}

impl HotkeyListener {
    /// Registers `binding` on a new thread and starts waiting for presses.
    /// Returns once the registration outcome is known.
    pub fn spawn<F>(
        binding: &str,
        mut registrar: Box<dyn HotkeyRegistrar>,
        on_hotkey: F,
    ) -> Result<Self, HotkeyRuntimeError>
    where
        F: Fn() + Send + 'static,
    {
        let (ready_tx, ready_rx) = mpsc::channel();
        let binding = binding.to_string();

        let thread = std::thread::Builder::new()
            .name(LISTENER_THREAD_NAME.to_string())
            .spawn(move || {
                let registration = match registrar.register_hotkey(&binding) {
                    Ok(registration) => registration,
                    Err(error) => {
                        let _ = ready_tx.send(Err(error.clone()));
                        return Err(error);
                    }
                };
                let _ = ready_tx.send(Ok((registration, current_native_thread_id())));

                let result = registrar.wait_for_hotkeys(&mut |id: i32| {
                    tracing::debug!(id, "hotkey pressed");
                    on_hotkey();
                });
                if let Err(error) = registrar.unregister_all() {
                    tracing::warn!(%error, "failed to unregister hotkey");
                }
                result
            })
            .map_err(|error| HotkeyRuntimeError::EventLoopFailed(error.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok((registration, native_thread_id))) => {
                log_registration(&registration);
                Ok(Self {
                    thread,
                    native_thread_id,
                    registration,
                })
            }
            Ok(Err(error)) => {
                let _ = thread.join();
                Err(error)
            }
            Err(_) => {
                let outcome = thread.join();
                Err(match outcome {
                    Ok(Err(error)) => error,
                    _ => HotkeyRuntimeError::EventLoopFailed(
                        "hotkey thread exited before registering".to_string(),
                    ),
                })
            }
        }
    }

    pub fn registration(&self) -> &HotkeyRegistration {
        &self.registration
    }

    /// Stops the wait loop and joins the thread, returning how the loop ended.
    pub fn shutdown(self) -> Result<(), HotkeyRuntimeError> {
        // The thread's message queue may not exist yet right after
        // registration, so a refused post is retried briefly.
        let mut attempts = 0;
        while !self.thread.is_finished() {
            match post_quit(self.native_thread_id) {
                Ok(()) => break,
                Err(error) if attempts >= QUIT_ATTEMPTS => {
                    if self.thread.is_finished() {
                        break;
                    }
                    return Err(error);
                }
                Err(_) => {
                    attempts += 1;
                    std::thread::sleep(QUIT_RETRY_INTERVAL);
                }
            }
        }
        self.thread.join().map_err(|_| {
            HotkeyRuntimeError::EventLoopFailed("hotkey thread panicked".to_string())
        })?
    }
}

fn log_registration(registration: &HotkeyRegistration) {
    match registration {
        HotkeyRegistration::Native(id) => {
            tracing::info!(native_id = id, "hotkey registered");
        }
        HotkeyRegistration::Noop(label) => {
            tracing::info!(noop = %label, "hotkey registered");
        }
    }
}
