//! Error types for unicat.

use thiserror::Error;

/// Result type alias using unicat's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for unicat operations.
///
/// Every variant aborts the migration that raised it. Expected per-row
/// disqualifications are counted in reports instead.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed
    #[error("Schema migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// A row expected to pre-exist is missing
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Item sequence outside the fixed-width bound
    #[error("Sequence out of range 0000-9999 for item id={item_id}: {seq}")]
    SequenceOutOfRange { item_id: i64, seq: i64 },

    /// A stored code already lives in the placeholder keyspace
    #[error("Placeholder conflict in table {table}: existing code {code}")]
    PlaceholderConflict { table: String, code: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("category id=7".to_string());
        assert_eq!(err.to_string(), "Not found: category id=7");
    }

    #[test]
    fn test_error_display_sequence_out_of_range() {
        let err = Error::SequenceOutOfRange {
            item_id: 42,
            seq: 10000,
        };
        assert_eq!(
            err.to_string(),
            "Sequence out of range 0000-9999 for item id=42: 10000"
        );
    }

    #[test]
    fn test_error_display_placeholder_conflict() {
        let err = Error::PlaceholderConflict {
            table: "category".to_string(),
            code: "TMP-CAT-00000001".to_string(),
        };
        assert!(err.to_string().contains("category"));
        assert!(err.to_string().contains("TMP-CAT-00000001"));
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("access denied"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
