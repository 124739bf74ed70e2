use std::{io, path::PathBuf};

use thiserror::Error;

use crate::class::ReaderState;

pub type Result<T> = std::result::Result<T, ParseError>;

/// Everything that can stop a class file from being read.
///
/// All variants are fatal for the parse they came from.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("class file not found: {}", .path.display())]
    SourceNotFound { path: PathBuf },

    #[error("unable to open class file {}", .path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unexpected end of input at offset {offset}, {needed} byte(s) required")]
    UnexpectedEndOfInput { offset: u64, needed: usize },

    #[error("malformed class file: {0}")]
    MalformedClassFile(String),

    #[error("{operation} called while reader is {state}")]
    OutOfOrder {
        operation: &'static str,
        state: ReaderState,
    },

    #[error("i/o error at offset {offset}")]
    Io {
        offset: u64,
        #[source]
        source: io::Error,
    },
}

impl ParseError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedClassFile(message.into())
    }

    pub fn is_unexpected_end(&self) -> bool {
        matches!(self, Self::UnexpectedEndOfInput { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_contains_path() {
        let err = ParseError::SourceNotFound {
            path: PathBuf::from("non/existent/file.class"),
        };
        assert!(err.to_string().contains("non/existent/file.class"));
    }

    #[test]
    fn test_unavailable_keeps_source() {
        let err = ParseError::SourceUnavailable {
            path: PathBuf::from("Locked.class"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(
            source.downcast_ref::<io::Error>().unwrap().kind(),
            io::ErrorKind::PermissionDenied
        );
    }

    #[test]
    fn test_out_of_order_message() {
        let err = ParseError::OutOfOrder {
            operation: "read_version",
            state: ReaderState::Created,
        };
        assert_eq!(err.to_string(), "read_version called while reader is created");
    }
}
