use aerosync_design::DesignError;

/// Errors returned by [`crate::SyncHandle`] operations.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The edit was rejected by the design model.
    #[error(transparent)]
    Design(#[from] DesignError),

    /// The engine task has stopped.
    #[error("sync engine is shut down")]
    Closed,
}

pub type Result<T> = std::result::Result<T, SyncError>;
