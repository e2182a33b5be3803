use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
    #[error("no request scope is active")]
    NotActive,

    #[error("request scope {scope_id} has already been destroyed")]
    Destroyed { scope_id: u64 },
}

impl ScopeError {
    pub fn destroyed(scope_id: u64) -> Self {
        Self::Destroyed { scope_id }
    }
}
