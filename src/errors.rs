use crate::date_key::DateKey;
use crate::edit_window::EditWindow;
use crate::optimistic::MutationKey;
use thiserror::Error;

/// Every variant is recoverable: state has already been rolled back (or was
/// never touched) by the time the caller sees it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HabitError {
    #[error("{}", window_notice(.key, .window))]
    WindowViolation { key: DateKey, window: EditWindow },

    #[error("{operation} failed: {message}")]
    RemoteRejection {
        operation: &'static str,
        status: Option<u16>,
        message: String,
    },

    #[error("{0}")]
    MalformedInput(String),

    #[error("habit `{0}` is not in the collection")]
    UnknownHabit(String),

    #[error("{0} is already in flight")]
    InFlight(MutationKey),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl HabitError {
    pub fn remote(operation: &'static str, message: impl Into<String>) -> Self {
        Self::RemoteRejection {
            operation,
            status: None,
            message: message.into(),
        }
    }

    pub fn rejected(operation: &'static str, status: u16, message: impl Into<String>) -> Self {
        Self::RemoteRejection {
            operation,
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedInput(message.into())
    }

    /// True when the failure came back from (or on the way to) the service.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::RemoteRejection { .. })
    }
}

fn window_notice(key: &DateKey, window: &EditWindow) -> String {
    match window {
        EditWindow::Past => format!("{key} is in the past; past dates are read-only"),
        EditWindow::Future => format!("{key} is in the future and cannot be completed yet"),
        EditWindow::Current => format!("{key} is editable"),
    }
}
