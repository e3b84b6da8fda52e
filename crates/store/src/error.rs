use thiserror::Error;

/// Errors that can occur when interacting with the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A referenced row does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A row could not be mapped onto a model type.
    #[error("Invalid row: {0}")]
    InvalidRow(String),

    /// A failure switched on through the in-memory store's test hooks.
    #[error("Injected failure: {0}")]
    FaultInjected(&'static str),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
