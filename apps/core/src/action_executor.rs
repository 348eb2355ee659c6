use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use thiserror::Error;

use crate::dispatch::SearchAction;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LaunchError {
    #[error("empty url")]
    EmptyUrl,
    #[error("failed to open {url}: {message}")]
    OpenFailed { url: String, message: String },
    #[error("failed to start automation thread: {0}")]
    SpawnFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AutomationError {
    #[error("input backend unavailable: {0}")]
    Unavailable(String),
    #[error("input step {step:?} failed: {message}")]
    StepFailed { step: InputStep, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputStep {
    Click { x: i32, y: i32 },
    Type(String),
    Enter,
}

/// Opens a URL in the user's browser.
pub trait UrlOpener: Send + Sync {
    fn open(&self, url: &str) -> Result<(), LaunchError>;
}

/// Synthesizes mouse and keyboard input, in order.
pub trait InputDriver: Send + Sync {
    fn perform(&self, steps: &[InputStep]) -> Result<(), AutomationError>;
}

pub struct SystemBrowser;

impl UrlOpener for SystemBrowser {
    fn open(&self, url: &str) -> Result<(), LaunchError> {
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(LaunchError::EmptyUrl);
        }
        open::that(trimmed).map_err(|error| LaunchError::OpenFailed {
            url: trimmed.to_string(),
            message: error.to_string(),
        })
    }
}

pub struct EnigoDriver;

impl InputDriver for EnigoDriver {
    fn perform(&self, steps: &[InputStep]) -> Result<(), AutomationError> {
        use enigo::{Button, Coordinate, Direction, Enigo, Key, Keyboard, Mouse, Settings};

        let mut enigo = Enigo::new(&Settings::default())
            .map_err(|error| AutomationError::Unavailable(error.to_string()))?;

        for step in steps {
            let result = match step {
                InputStep::Click { x, y } => enigo
                    .move_mouse(*x, *y, Coordinate::Abs)
                    .and_then(|()| enigo.button(Button::Left, Direction::Click)),
                InputStep::Type(text) => enigo.text(text),
                InputStep::Enter => enigo.key(Key::Return, Direction::Click),
            };
            result.map_err(|error| AutomationError::StepFailed {
                step: step.clone(),
                message: error.to_string(),
            })?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutomationReport {
    Completed,
    OpenFailed(LaunchError),
    InputFailed(AutomationError),
}

#[derive(Debug)]
pub enum Execution {
    Opened,
    /// The scripted sequence runs on its own thread; the handle is only
    /// needed by callers that want to wait for it.
    Automating(JoinHandle<AutomationReport>),
}

#[derive(Clone)]
pub struct ActionExecutor {
    opener: Arc<dyn UrlOpener>,
    input: Arc<dyn InputDriver>,
}

impl Default for ActionExecutor {
    fn default() -> Self {
        Self::new(Arc::new(SystemBrowser), Arc::new(EnigoDriver))
    }
}

impl ActionExecutor {
    pub fn new(opener: Arc<dyn UrlOpener>, input: Arc<dyn InputDriver>) -> Self {
        Self { opener, input }
    }

    pub fn execute(&self, action: &SearchAction) -> Result<Execution, LaunchError> {
        match action {
            SearchAction::OpenUrl { url } => {
                self.opener.open(url)?;
                tracing::debug!(%url, "opened search url");
                Ok(Execution::Opened)
            }
            SearchAction::Scripted {
                url,
                settle_delay,
                click_at,
                text,
            } => {
                let opener = Arc::clone(&self.opener);
                let input = Arc::clone(&self.input);
                let url = url.clone();
                let settle_delay = *settle_delay;
                let steps = vec![
                    InputStep::Click {
                        x: click_at.0,
                        y: click_at.1,
                    },
                    InputStep::Type(text.clone()),
                    InputStep::Enter,
                ];
                let handle = std::thread::Builder::new()
                    .name("hotsearch-automation".to_string())
                    .spawn(move || {
                        run_scripted(opener.as_ref(), input.as_ref(), &url, settle_delay, &steps)
                    })
                    .map_err(|error| LaunchError::SpawnFailed(error.to_string()))?;
                Ok(Execution::Automating(handle))
            }
        }
    }
}

/// open → settle → click → type → submit. Runs to completion with no retry.
pub fn run_scripted(
    opener: &dyn UrlOpener,
    input: &dyn InputDriver,
    url: &str,
    settle_delay: Duration,
    steps: &[InputStep],
) -> AutomationReport {
    if let Err(error) = opener.open(url) {
        tracing::warn!(%error, "scripted search could not open page");
        return AutomationReport::OpenFailed(error);
    }

    if !settle_delay.is_zero() {
        std::thread::sleep(settle_delay);
    }

    match input.perform(steps) {
        Ok(()) => {
            tracing::debug!(%url, "scripted search submitted");
            AutomationReport::Completed
        }
        Err(error) => {
            tracing::warn!(%error, "scripted search input failed");
            AutomationReport::InputFailed(error)
        }
    }
}
