mod config;
mod job;
mod resolution;
mod scheduler;
mod scope;

pub use config::ConfigError;
pub use job::{panic_message, JobError};
pub use resolution::ResolutionError;
pub use scheduler::SchedulerError;
pub use scope::ScopeError;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error(transparent)]
    Scope(#[from] ScopeError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, Error>;
