use thiserror::Error;

/// What can go wrong while processing a turn.
///
/// `EmptyMessage` is the caller's fault and maps to a client error at
/// any transport surface; the rest are server-side failures. Validation
/// failures and unparseable state updates are not errors: they degrade
/// inside the pipeline and surface as flags on the turn outcome.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("message must not be empty")]
    EmptyMessage,

    #[error("completion service failed: {0}")]
    Completion(String),

    #[error("completion call timed out after {0} seconds")]
    CompletionTimeout(u64),

    #[error("prompt template failure: {0}")]
    Template(String),

    #[error("storage failure: {0}")]
    Storage(String),
}

impl EngineError {
    pub fn completion(err: anyhow::Error) -> Self {
        EngineError::Completion(format!("{:#}", err))
    }

    pub fn template(err: anyhow::Error) -> Self {
        EngineError::Template(format!("{:#}", err))
    }

    pub fn storage(err: anyhow::Error) -> Self {
        EngineError::Storage(format!("{:#}", err))
    }

    /// Whether the caller, rather than the service, caused this error
    pub fn is_client_error(&self) -> bool {
        matches!(self, EngineError::EmptyMessage)
    }
}
