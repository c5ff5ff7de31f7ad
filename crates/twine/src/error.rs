//! Error taxonomy for the bundler.
//!
//! Every failure is fatal for the bundle operation it occurred in and carries
//! the originating file path where one exists, so callers can report a precise
//! diagnostic. Nothing is retried and no partial output is produced.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by a bundle operation.
#[derive(Debug, Error)]
pub enum TwineError {
    /// A file or glob target could not be read.
    #[error("failed to read `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A source fragment did not parse.
    #[error("parse error in `{}` at line {line}, column {column}: {message}", file.display())]
    Parse {
        file: PathBuf,
        offset: usize,
        line: usize,
        column: usize,
        message: String,
    },

    /// A directive call carried a non-literal argument.
    #[error("unsupported require argument in `{}`: {kind} (arguments must be literals)", file.display())]
    UnsupportedArgument { file: PathBuf, kind: &'static str },

    /// An invalid option value, rejected before any file I/O.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

/// Position-annotated parse failure for a single source fragment.
///
/// The scanner attaches no file context; the assembler wraps this into
/// [`TwineError::Parse`] together with the path being scanned.
#[derive(Debug, Clone, Error)]
#[error("line {line}, column {column}: {message}")]
pub struct ParseError {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

/// Failure modes of a directive scan over one fragment.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("unsupported require argument type: {kind}")]
    UnsupportedArgument { kind: &'static str },
}

pub type Result<T> = std::result::Result<T, TwineError>;
