//! Routing of record-level failures according to the configured error policy.
//!
//! Every fallible step of the pipeline hands its error to a [`PolicyContext`]
//! owned by the current parse invocation. The context either drops the
//! failure, drops it and records a [`Diagnostic`], or turns it into a
//! [`BratError`] that aborts the current document (or corpus).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::{AnnotationError, BratError, ErrorKind, Result};

/// What to do with a record or file that fails to parse or resolve.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Drop the offending record and continue.
    Ignore,
    /// Drop the offending record and emit a diagnostic.
    Warn,
    /// Abort parsing of the current document.
    #[default]
    Raise,
}

impl ErrorPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorPolicy::Ignore => "ignore",
            ErrorPolicy::Warn => "warn",
            ErrorPolicy::Raise => "raise",
        }
    }
}

impl fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorPolicy {
    type Err = BratError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ignore" => Ok(ErrorPolicy::Ignore),
            "warn" => Ok(ErrorPolicy::Warn),
            "raise" => Ok(ErrorPolicy::Raise),
            other => Err(BratError::Config {
                message: format!("unknown error policy '{}'; expected ignore, warn or raise", other),
            }),
        }
    }
}

/// A dropped record or file, reported under the `warn` policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub document: String,
    /// 1-based annotation line, absent for file-level problems.
    pub line: Option<usize>,
    pub kind: ErrorKind,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(
                f,
                "{}:{}: {}: {}",
                self.document, line, self.kind, self.message
            ),
            None => write!(f, "{}: {}: {}", self.document, self.kind, self.message),
        }
    }
}

/// Per-invocation error sink. One context is created per document (or per
/// corpus scan), so concurrent parses never share one.
#[derive(Debug)]
pub struct PolicyContext {
    policy: ErrorPolicy,
    document: String,
    diagnostics: Vec<Diagnostic>,
    dropped: usize,
}

impl PolicyContext {
    pub fn new(policy: ErrorPolicy, document: impl Into<String>) -> Self {
        Self {
            policy,
            document: document.into(),
            diagnostics: Vec::new(),
            dropped: 0,
        }
    }

    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    pub fn document(&self) -> &str {
        &self.document
    }

    /// Routes a record-level failure. Returns `Err` only under `raise`.
    pub fn report(&mut self, error: AnnotationError) -> Result<()> {
        let (line, kind) = (error.line(), error.kind());
        match self.policy {
            ErrorPolicy::Raise => Err(BratError::Annotation {
                document: self.document.clone(),
                source: error,
            }),
            policy => {
                let document = self.document.clone();
                self.drop_with(policy, document, Some(line), kind, error.to_string());
                Ok(())
            }
        }
    }

    /// Unwraps a record-level result, routing the error through the policy.
    ///
    /// `Ok(None)` means the record was dropped.
    pub fn check<T>(&mut self, result: std::result::Result<T, AnnotationError>) -> Result<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(error) => self.report(error).map(|()| None),
        }
    }

    /// Routes a file-level failure (unpaired or unreadable file) for the
    /// document `key`.
    ///
    /// Errors without a taxonomy kind are always propagated.
    pub fn report_file(&mut self, key: &str, error: BratError) -> Result<()> {
        let Some(kind) = error.kind() else {
            return Err(error);
        };
        match self.policy {
            ErrorPolicy::Raise => Err(error),
            policy => {
                self.drop_with(policy, key.to_string(), None, kind, error.to_string());
                Ok(())
            }
        }
    }

    fn drop_with(
        &mut self,
        policy: ErrorPolicy,
        document: String,
        line: Option<usize>,
        kind: ErrorKind,
        message: String,
    ) {
        self.dropped += 1;
        if policy == ErrorPolicy::Ignore {
            debug!(%document, ?line, %kind, "dropped: {}", message);
            return;
        }
        warn!(%document, ?line, %kind, "{}", message);
        self.diagnostics.push(Diagnostic {
            document,
            line,
            kind,
            message,
        });
    }

    /// Number of records or files dropped so far, under any policy.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
