//! Error types for the persistence layer.

/// Errors that can occur while reading or writing cell state.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `SQLite` operation failed.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] sqlx::Error),

    /// A schema migration failed.
    #[error("SQLite migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A coordinate does not fit in a database integer.
    #[error("coordinate {0} does not fit in an INTEGER column")]
    Coordinate(usize),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}
