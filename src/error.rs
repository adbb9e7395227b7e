use thiserror::Error;

/// Main error type for ExploreWiki
#[derive(Error, Debug)]
pub enum ExploreError {
    /// Seed name is blank after normalization
    #[error("Invalid seed: {0}")]
    InvalidSeed(String),

    /// Relation source lookup failed or returned data that breaks its contract
    #[error("Relation source unavailable: {0}")]
    SourceUnavailable(String),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Dataset parse errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Convenient Result type using ExploreError
pub type Result<T> = std::result::Result<T, ExploreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ExploreError::SourceUnavailable("connection refused".to_string());
        assert!(err.to_string().contains("Relation source unavailable"));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_error_from_rusqlite() {
        let rusqlite_err = rusqlite::Error::InvalidQuery;
        let err: ExploreError = rusqlite_err.into();
        assert!(matches!(err, ExploreError::Database(_)));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ExploreError = io_err.into();
        assert!(matches!(err, ExploreError::Io(_)));
    }
}
