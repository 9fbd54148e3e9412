use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kinds of per-record failures, used for diagnostics and policy routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    LineFormat,
    OutOfBounds,
    TextMismatch,
    Overlap,
    DanglingReference,
    CyclicReference,
    AmbiguousId,
    DuplicateSpan,
    MissingPair,
    File,
}

impl ErrorKind {
    /// Returns the taxonomy name of this error kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::LineFormat => "LineFormatError",
            ErrorKind::OutOfBounds => "OutOfBoundsError",
            ErrorKind::TextMismatch => "TextMismatchError",
            ErrorKind::Overlap => "OverlapError",
            ErrorKind::DanglingReference => "DanglingReferenceError",
            ErrorKind::CyclicReference => "CyclicReferenceError",
            ErrorKind::AmbiguousId => "AmbiguousIDError",
            ErrorKind::DuplicateSpan => "DuplicateSpanError",
            ErrorKind::MissingPair => "MissingPairError",
            ErrorKind::File => "FileError",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure scoped to a single annotation line or record.
///
/// `line` is the 1-based line number in the `.ann` file the record came from.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnnotationError {
    #[error("line {line}: malformed annotation: {message} ({raw:?})")]
    LineFormat {
        line: usize,
        raw: String,
        message: String,
    },

    #[error("line {line}: {id}: span {start}..{end} outside text of length {len}")]
    OutOfBounds {
        line: usize,
        id: String,
        start: usize,
        end: usize,
        len: usize,
    },

    #[error("line {line}: {id}: text {found:?} at offsets does not match annotated {expected:?}")]
    TextMismatch {
        line: usize,
        id: String,
        expected: String,
        found: String,
    },

    #[error("line {line}: {id}: span {first:?} overlaps span {second:?}")]
    Overlap {
        line: usize,
        id: String,
        first: (usize, usize),
        second: (usize, usize),
    },

    #[error("line {line}: {id}: reference to {reference}: {reason}")]
    DanglingReference {
        line: usize,
        id: String,
        reference: String,
        reason: String,
    },

    #[error("line {line}: {id}: event argument cycle {}", .cycle.join(" -> "))]
    CyclicReference {
        line: usize,
        id: String,
        cycle: Vec<String>,
    },

    #[error("line {line}: identifier {id} is defined more than once")]
    AmbiguousId { line: usize, id: String },

    #[error("line {line}: {id}: same spans as entity {original}")]
    DuplicateSpan {
        line: usize,
        id: String,
        original: String,
    },
}

impl AnnotationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnnotationError::LineFormat { .. } => ErrorKind::LineFormat,
            AnnotationError::OutOfBounds { .. } => ErrorKind::OutOfBounds,
            AnnotationError::TextMismatch { .. } => ErrorKind::TextMismatch,
            AnnotationError::Overlap { .. } => ErrorKind::Overlap,
            AnnotationError::DanglingReference { .. } => ErrorKind::DanglingReference,
            AnnotationError::CyclicReference { .. } => ErrorKind::CyclicReference,
            AnnotationError::AmbiguousId { .. } => ErrorKind::AmbiguousId,
            AnnotationError::DuplicateSpan { .. } => ErrorKind::DuplicateSpan,
        }
    }

    pub fn line(&self) -> usize {
        match self {
            AnnotationError::LineFormat { line, .. }
            | AnnotationError::OutOfBounds { line, .. }
            | AnnotationError::TextMismatch { line, .. }
            | AnnotationError::Overlap { line, .. }
            | AnnotationError::DanglingReference { line, .. }
            | AnnotationError::CyclicReference { line, .. }
            | AnnotationError::AmbiguousId { line, .. }
            | AnnotationError::DuplicateSpan { line, .. } => *line,
        }
    }
}

/// Errors that can occur while building a corpus.
#[derive(Error, Debug)]
pub enum BratError {
    #[error("document {document}: {source}")]
    Annotation {
        document: String,
        #[source]
        source: AnnotationError,
    },

    #[error("missing pair: {key} has no .{missing} file")]
    MissingPair { key: String, missing: String },

    #[error("file error: {message} (path: {path})")]
    File { message: String, path: String },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BratError {
    /// Returns the taxonomy kind for errors that map onto one.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            BratError::Annotation { source, .. } => Some(source.kind()),
            BratError::MissingPair { .. } => Some(ErrorKind::MissingPair),
            BratError::File { .. } => Some(ErrorKind::File),
            _ => None,
        }
    }
}

/// Convenience alias for results using `BratError`.
pub type Result<T> = std::result::Result<T, BratError>;
