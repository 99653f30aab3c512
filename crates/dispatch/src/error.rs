//! Error types for command dispatch.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Too few or too many positional arguments
    #[error("Wrong number of arguments")]
    Usage,

    #[error("Invalid node selector '{selector}': expected an index in 0..{count}")]
    InvalidNodeSelector { selector: String, count: usize },

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Command '{0}' requires an argument")]
    MissingArgument(String),

    #[error("You should specify a file to send")]
    MissingFilename,

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Unable to read {}: {source}", path.display())]
    FileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Node registry or command table rejected at load time
    #[error("Invalid command table: {0}")]
    InvalidTable(String),

    /// Publish, subscribe or connect failure reported by the link
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DispatchError>;

impl DispatchError {
    pub fn transport(err: anyhow::Error) -> Self {
        DispatchError::Transport(format!("{:#}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DispatchError::InvalidNodeSelector { selector: "99".to_string(), count: 3 };
        assert_eq!(err.to_string(), "Invalid node selector '99': expected an index in 0..3");

        let err = DispatchError::FileNotFound(PathBuf::from("/tmp/none.txt"));
        assert!(err.to_string().contains("/tmp/none.txt"));
    }

    #[test]
    fn test_transport_keeps_context() {
        let err = anyhow::anyhow!("connection refused").context("publish failed");
        let err = DispatchError::transport(err);
        assert_eq!(err.to_string(), "Transport error: publish failed: connection refused");
    }
}
