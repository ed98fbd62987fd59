use thiserror::Error;

/// Errors raised by filesystem, scan and metadata operations.
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Path security violation: {0}")]
    PathSecurity(String),

    #[error("Insufficient permissions: {0}")]
    InsufficientPermissions(String),

    #[error("Metadata extraction failed: {0}")]
    MetadataExtraction(String),

    #[error("Scan operation failed: {0}")]
    ScanOperation(String),

    #[error("File operation failed: {0}")]
    FileOperation(String),

    #[error("Invalid file type: {0}")]
    InvalidFileType(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl LibraryError {
    pub fn file_op(msg: impl Into<String>) -> Self {
        Self::FileOperation(msg.into())
    }

    pub fn security(msg: impl Into<String>) -> Self {
        Self::PathSecurity(msg.into())
    }
}

impl From<sea_orm::DbErr> for LibraryError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<std::io::Error> for LibraryError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(err.to_string()),
            std::io::ErrorKind::PermissionDenied => Self::InsufficientPermissions(err.to_string()),
            _ => Self::FileOperation(err.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for LibraryError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::FileOperation(format!("Background task failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_map_by_kind() {
        let err: LibraryError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        assert!(matches!(err, LibraryError::InsufficientPermissions(_)));

        let err: LibraryError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, LibraryError::NotFound(_)));
    }

    #[test]
    fn display_includes_context() {
        let err = LibraryError::ScanOperation("Maximum concurrent scans reached".into());
        assert_eq!(
            err.to_string(),
            "Scan operation failed: Maximum concurrent scans reached"
        );
    }
}
