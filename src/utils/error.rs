//! Error handling for goinspect

use std::path::PathBuf;

use crate::utils::Span;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Inspection error
///
/// Only hard failures live here. A name or expression whose type cannot be
/// determined is reported as `None` by the resolver, never as an `Error`.
#[derive(Error, Debug, Clone)]
pub enum Error {
    // ==================== Syntax Errors ====================

    #[error("Unexpected token: expected {expected}, got {got}")]
    UnexpectedToken {
        expected: String,
        got: String,
        span: Span,
    },

    #[error("Expected identifier")]
    ExpectedIdent { span: Span },

    #[error("Expected type")]
    ExpectedType { span: Span },

    #[error("Expected expression")]
    ExpectedExpr { span: Span },

    #[error("Unterminated {what} literal")]
    UnterminatedLiteral { what: &'static str, span: Span },

    // ==================== Load Errors ====================

    #[error("Failed to parse {}: {source}", .file.display())]
    Parse {
        file: PathBuf,
        #[source]
        source: Box<Error>,
    },

    #[error("IO error: {0}")]
    Io(String),

    // ==================== Resolution Errors ====================

    #[error("{name} is not a type")]
    NotAType { name: String },
}

impl Error {
    /// Get the span associated with this error
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::UnexpectedToken { span, .. } => Some(*span),
            Self::ExpectedIdent { span } => Some(*span),
            Self::ExpectedType { span } => Some(*span),
            Self::ExpectedExpr { span } => Some(*span),
            Self::UnterminatedLiteral { span, .. } => Some(*span),
            Self::Parse { source, .. } => source.span(),
            Self::Io(_) | Self::NotAType { .. } => None,
        }
    }

    /// Wrap a syntax error with the file it came from
    pub fn in_file(self, file: impl Into<PathBuf>) -> Self {
        Self::Parse {
            file: file.into(),
            source: Box::new(self),
        }
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}
