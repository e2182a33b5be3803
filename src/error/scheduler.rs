use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("invalid period '{value}': {reason}")]
    InvalidPeriod { value: String, reason: String },

    #[error("duplicate trigger identity: {identity}")]
    DuplicateIdentity { identity: String },

    #[error("unknown trigger identity: {identity}")]
    UnknownTrigger { identity: String },

    #[error("scheduler has already been started")]
    AlreadyStarted,

    #[error("scheduler has been shut down")]
    ShutDown,

    #[error("scheduler must be started from within a tokio runtime")]
    NoRuntime,

    #[error("event loop error: {message}")]
    EventLoop { message: String },
}

impl SchedulerError {
    pub fn invalid_period(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPeriod {
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn duplicate_identity(identity: impl Into<String>) -> Self {
        Self::DuplicateIdentity {
            identity: identity.into(),
        }
    }

    pub fn unknown_trigger(identity: impl Into<String>) -> Self {
        Self::UnknownTrigger {
            identity: identity.into(),
        }
    }

    pub fn event_loop(message: impl Into<String>) -> Self {
        Self::EventLoop {
            message: message.into(),
        }
    }
}
