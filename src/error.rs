use thiserror::Error;

/// Unified error type for release-cycle operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Version file error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Hosting platform request failed: {0}")]
    Hosting(String),

    #[error("Failed to publish draft release: {0}")]
    Publish(String),
}

/// Convenience type alias for Results in release-cycle
pub type Result<T> = std::result::Result<T, ReleaseError>;

impl ReleaseError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        ReleaseError::Config(msg.into())
    }

    /// Create a version file parse error with context
    pub fn parse(msg: impl Into<String>) -> Self {
        ReleaseError::Parse(msg.into())
    }

    /// Create a hosting platform error with context
    pub fn hosting(msg: impl Into<String>) -> Self {
        ReleaseError::Hosting(msg.into())
    }

    /// Create a publish error with context
    pub fn publish(msg: impl Into<String>) -> Self {
        ReleaseError::Publish(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ReleaseError::config("no such remote: origin");
        assert_eq!(err.to_string(), "Configuration error: no such remote: origin");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: ReleaseError = io_err.into();
        assert!(matches!(err, ReleaseError::Io(_)));
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_error_from_git2() {
        let git_err = git2::Error::from_str("reference not found");
        let err: ReleaseError = git_err.into();
        assert!(err.to_string().starts_with("Git operation failed"));
    }

    #[test]
    fn test_error_messages_are_descriptive() {
        let error_pairs = vec![
            (ReleaseError::config("x"), "Configuration error"),
            (ReleaseError::parse("x"), "Version file error"),
            (ReleaseError::UnknownAction("x".to_string()), "Unknown action"),
            (ReleaseError::hosting("x"), "Hosting platform request failed"),
            (ReleaseError::publish("x"), "Failed to publish draft release"),
        ];

        for (err, expected_prefix) in error_pairs {
            let msg = err.to_string();
            assert!(
                msg.starts_with(expected_prefix),
                "Error message should start with '{}', but got '{}'",
                expected_prefix,
                msg
            );
        }
    }

    #[test]
    fn test_unknown_action_names_the_action() {
        let err = ReleaseError::UnknownAction("release".to_string());
        assert_eq!(err.to_string(), "Unknown action: release");
    }
}
