use thiserror::Error;

/// Main error type for ldapdex operations
#[derive(Error, Debug)]
pub enum LdapdexError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Directory error: {0}")]
    Directory(String),

    #[error("LDAP error: {0}")]
    Ldap(#[from] ldap3::LdapError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Snapshot error: incompatible version {actual}, expected <= {expected}")]
    IncompatibleSnapshot { expected: u32, actual: u32 },
}

/// Result type alias for ldapdex operations
pub type Result<T> = std::result::Result<T, LdapdexError>;

impl LdapdexError {
    /// Message surfaced through the record channel when a search degrades
    pub fn to_exception_message(&self) -> String {
        match self {
            LdapdexError::Directory(msg) => msg.clone(),
            other => other.to_string(),
        }
    }

    /// Check if this error was raised before any directory request was issued
    pub fn is_hard_failure(&self) -> bool {
        matches!(self, LdapdexError::InvalidQuery(_) | LdapdexError::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LdapdexError::InvalidQuery("no useful filter criteria given".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid query: no useful filter criteria given"
        );
    }

    #[test]
    fn test_exception_message_strips_prefix_for_directory_errors() {
        let err = LdapdexError::Directory("timeout".to_string());
        assert_eq!(err.to_exception_message(), "timeout");
    }

    #[test]
    fn test_hard_failures() {
        assert!(LdapdexError::InvalidQuery("x".to_string()).is_hard_failure());
        assert!(!LdapdexError::Directory("x".to_string()).is_hard_failure());
    }
}
