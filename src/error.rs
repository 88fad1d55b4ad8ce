//! Error types for the Ruby analysis core
//!
//! Not finding a declaration is never an error here. These types cover real
//! faults such as unreadable files, parser setup, or listeners that misbehave
//! during dispatch.

use crate::FileId;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for indexing and workspace operations
#[derive(Error, Debug)]
pub enum IndexError {
    /// File system errors
    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Parsing errors
    #[error("Failed to parse '{uri}': {reason}")]
    ParseError { uri: String, reason: String },

    #[error("File ID {id:?} not found in index. The file may have been removed or never opened.")]
    FileNotFound { id: FileId },

    #[error("Failed to create file ID: maximum file count reached")]
    FileIdExhausted,
}

impl IndexError {
    /// Get a stable status code for this error type.
    ///
    /// Returns a string identifier that can be used in JSON responses
    /// for programmatic error handling.
    pub fn status_code(&self) -> String {
        match self {
            Self::FileRead { .. } => "FILE_READ_ERROR",
            Self::ParseError { .. } => "PARSE_ERROR",
            Self::FileNotFound { .. } => "FILE_NOT_FOUND",
            Self::FileIdExhausted => "FILE_ID_EXHAUSTED",
        }
        .to_string()
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::FileRead { .. } => vec![
                "Check that the file exists and you have read permissions",
                "Ensure the file is not locked by another process",
            ],
            Self::FileNotFound { .. } => vec!["Open or index the file before querying it"],
            _ => vec![],
        }
    }
}

impl From<ParseError> for IndexError {
    fn from(err: ParseError) -> Self {
        IndexError::ParseError {
            uri: String::new(),
            reason: err.to_string(),
        }
    }
}

/// Errors specific to parsing operations
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to initialize {language} parser: {reason}")]
    ParserInit { language: String, reason: String },

    #[error("Parser produced no tree for '{uri}'")]
    NoTree { uri: String },

    #[error("Could not extract Ruby from template '{uri}': {reason}")]
    Template { uri: String, reason: String },
}

/// Faults raised by a listener while handling one node
#[derive(Error, Debug)]
pub enum ListenerError {
    #[error("Listener '{listener}' failed on {node_kind}: {reason}")]
    Failed {
        listener: String,
        node_kind: String,
        reason: String,
    },

    #[error("Listener '{listener}' panicked on {node_kind}: {message}")]
    Panicked {
        listener: String,
        node_kind: String,
        message: String,
    },
}

impl ListenerError {
    pub fn failed(listener: &str, node_kind: &str, reason: impl Into<String>) -> Self {
        Self::Failed {
            listener: listener.to_string(),
            node_kind: node_kind.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for index operations
pub type IndexResult<T> = Result<T, IndexError>;

/// Result type alias for parse operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Result type alias for listener callbacks
pub type ListenerResult<T> = Result<T, ListenerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_are_stable() {
        let err = IndexError::FileNotFound {
            id: FileId::new(3).unwrap(),
        };
        assert_eq!(err.status_code(), "FILE_NOT_FOUND");
        assert!(!err.recovery_suggestions().is_empty());

        let err = IndexError::FileRead {
            path: PathBuf::from("lib/missing.rb"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(err.status_code(), "FILE_READ_ERROR");
        assert_eq!(err.to_string(), "Failed to read file 'lib/missing.rb': missing");
    }

    #[test]
    fn test_listener_error_message() {
        let err = ListenerError::failed("docs", "constant", "lookup failed");
        assert_eq!(
            err.to_string(),
            "Listener 'docs' failed on constant: lookup failed"
        );
    }
}
