use crate::engine::types::EventType;

/// Errors the orchestration engine surfaces to its caller.
///
/// Business-component failures are deliberately absent: they are recorded
/// as `ERROR_PEND` state on the execution path and retried through an
/// explicit external resume, never raised as an `Err`.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    /// Malformed workflow graph, surfaced at parse time.
    #[error("invalid process definition: {0}")]
    Definition(String),

    /// A journey record already exists for this case id.
    #[error("case '{0}' already exists")]
    DuplicateCase(String),

    /// No journey record exists for this case id.
    #[error("case '{0}' not found")]
    CaseNotFound(String),

    /// The case has already run to completion.
    #[error("case '{0}' is already completed")]
    AlreadyCompleted(String),

    /// The external event handler rejected a lifecycle event that gates
    /// continuation (start/resume). The case remains as persisted.
    #[error("event handler failed during {event} for case '{case_id}': {message}")]
    Handler {
        event: EventType,
        case_id: String,
        message: String,
    },

    /// Persisted or runtime state violated an engine invariant.
    #[error("internal consistency error: {0}")]
    Internal(String),

    /// The document store failed.
    #[error("storage failure: {0:#}")]
    Store(anyhow::Error),
}

impl From<anyhow::Error> for FlowError {
    fn from(e: anyhow::Error) -> Self {
        FlowError::Store(e)
    }
}
