//! Command failure taxonomy and the chat text each failure produces.

use crate::backend::BackendError;
use crate::channels::ChannelError;

/// Reply sent when a required field has no human label.
pub const GENERIC_FAILURE: &str = "Sorry! Something went wrong!";

/// Lead-in sent before a Wise Old Man failure.
pub const WISE_OLD_MAN_HINT: &str =
    "There was an error with calling Wise old man. Maybe check group id.";

/// A required request field that had no value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingArgument {
    pub field: String,
    pub label: Option<String>,
}

impl MissingArgument {
    pub fn user_message(&self) -> String {
        match &self.label {
            Some(label) => format!("{} was not provided", label),
            None => GENERIC_FAILURE.to_string(),
        }
    }
}

/// Why a command invocation stopped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// One or more required fields were absent; nothing was sent upstream.
    #[error("missing arguments: {}", missing_fields(.0))]
    MissingArguments(Vec<MissingArgument>),

    /// A supplied argument cannot be used as given.
    #[error("{label} {reason}")]
    InvalidArgument { label: String, reason: String },

    /// The backend could not be reached.
    #[error("{0}")]
    Transport(String),

    /// The backend answered with an error message.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// The external roster service failed.
    #[error("wise old man lookup failed: {0}")]
    WiseOldMan(BackendError),

    /// Anything else. Logged, never shown in chat.
    #[error("{0}")]
    Unexpected(String),
}

impl CommandError {
    /// Chat messages to send for this failure, in order. Empty when the
    /// failure is only logged.
    pub fn user_messages(&self) -> Vec<String> {
        match self {
            Self::MissingArguments(missing) => {
                missing.iter().map(MissingArgument::user_message).collect()
            }
            Self::InvalidArgument { .. } => vec![self.to_string()],
            Self::Transport(description) => vec![description.clone()],
            Self::Rejected { message, .. } => vec![message.clone()],
            Self::WiseOldMan(inner) => match inner {
                BackendError::Transport(_) | BackendError::Rejected { .. } => {
                    vec![WISE_OLD_MAN_HINT.to_string(), inner.to_string()]
                }
                BackendError::Decode(_) | BackendError::Client(_) => {
                    vec![WISE_OLD_MAN_HINT.to_string()]
                }
            },
            Self::Unexpected(_) => Vec::new(),
        }
    }

    pub fn is_user_facing(&self) -> bool {
        !matches!(self, Self::Unexpected(_))
    }
}

fn missing_fields(missing: &[MissingArgument]) -> String {
    missing
        .iter()
        .map(|m| m.field.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<BackendError> for CommandError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Transport(description) => Self::Transport(description),
            BackendError::Rejected { status, message } => Self::Rejected { status, message },
            BackendError::Decode(_) | BackendError::Client(_) => Self::Unexpected(err.to_string()),
        }
    }
}

impl From<ChannelError> for CommandError {
    fn from(err: ChannelError) -> Self {
        Self::Unexpected(err.to_string())
    }
}
