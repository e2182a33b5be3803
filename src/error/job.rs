use serde::Serialize;
use std::any::Any;
use thiserror::Error;

use super::ScopeError;

/// Failure of a single job execution. Carried by `FailedExecution` events.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum JobError {
    #[error("{message}")]
    Failed { message: String },

    #[error("job panicked: {message}")]
    Panicked { message: String },

    #[error("job was cancelled")]
    Cancelled,
}

impl JobError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        Self::Panicked {
            message: panic_message(payload),
        }
    }
}

impl From<ScopeError> for JobError {
    fn from(err: ScopeError) -> Self {
        Self::failed(err.to_string())
    }
}

impl From<tokio::task::JoinError> for JobError {
    fn from(err: tokio::task::JoinError) -> Self {
        if err.is_panic() {
            let payload = err.into_panic();
            Self::from_panic(payload.as_ref())
        } else {
            Self::Cancelled
        }
    }
}

/// Best-effort text of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
