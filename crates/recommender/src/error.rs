//! Error type surfaced by the recommendation engine.

/// Failures that abort an engine call.
///
/// A generator declining to produce a recommendation is not an error; it is
/// logged by the dispatcher and the remaining generators still run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("failed to reserve space for {requested} recommendations")]
    AllocationFailure { requested: usize },
}

impl EngineError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        EngineError::InvalidInput {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
