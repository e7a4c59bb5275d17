//! Structured error types for rollbook-store.
//!
//! Uses `thiserror` so callers can match on the failure kind.
//! The CLI wraps these in `anyhow` for reporting.

use thiserror::Error;

/// Main error type for record store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Opening the database connection failed
    #[error("connection error ({target}): {source}")]
    Connection {
        target: String,
        source: sqlx::Error,
    },

    /// A statement failed to execute (constraint violation, bad SQL, ...)
    #[error("query error while {context}: {source}")]
    Query {
        context: String,
        source: sqlx::Error,
    },

    /// Operation attempted on a store with no open connection
    #[error("not connected to the database")]
    NotConnected,

    /// Configuration could not be read or parsed
    #[error("configuration error: {reason}")]
    Config { reason: String },
}

/// Result type alias for record store operations
pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    /// Create a connection error for the given target (`user@host:port/db`)
    pub fn connection(target: impl Into<String>, source: sqlx::Error) -> Self {
        Self::Connection {
            target: target.into(),
            source,
        }
    }

    /// Create a query error with context
    pub fn query(context: impl Into<String>, source: sqlx::Error) -> Self {
        Self::Query {
            context: context.into(),
            source,
        }
    }

    /// Create a config error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// True when the database rejected a write because of a UNIQUE constraint
    /// (for students, a duplicate email).
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::Query { source, .. } => source
                .as_database_error()
                .map(|db| db.is_unique_violation())
                .unwrap_or(false),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::query("adding student", sqlx::Error::RowNotFound);
        assert!(err.to_string().starts_with("query error while adding student"));

        let err = StoreError::config("bad port");
        assert_eq!(err.to_string(), "configuration error: bad port");

        assert_eq!(
            StoreError::NotConnected.to_string(),
            "not connected to the database"
        );
    }

    #[test]
    fn test_unique_violation_only_for_database_errors() {
        let err = StoreError::query("adding student", sqlx::Error::RowNotFound);
        assert!(!err.is_unique_violation());
        assert!(!StoreError::NotConnected.is_unique_violation());
    }

    #[test]
    fn test_connection_error_names_target() {
        let err = StoreError::connection(
            "postgres@localhost:5432/students",
            sqlx::Error::PoolTimedOut,
        );
        assert!(matches!(err, StoreError::Connection { .. }));
        assert!(err.to_string().contains("postgres@localhost:5432/students"));
    }
}
