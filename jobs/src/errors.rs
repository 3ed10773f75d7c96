use std::io;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures that can occur while discovering jobs.
///
/// The recoverable kinds describe problems with the jobset expression
/// itself and are scoped to the attribute path at which they occur; the
/// walker converts them into error entries of the result document. The
/// remaining kinds abort the entire run.
#[derive(Debug, Error)]
pub enum Error {
    /// A forced value was neither a derivation, an attribute set to
    /// recurse into, nor a null placeholder.
    #[error("unsupported value: {0}")]
    UnsupportedValue(&'static str),

    /// A derivation lacks an attribute discovery cannot do without.
    #[error("derivation must have a '{0}' attribute")]
    MissingAttribute(&'static str),

    /// The evaluator failed to force or coerce a value.
    #[error("{0}")]
    Evaluation(String),

    /// An interruption was requested; the run must stop promptly.
    #[error("evaluation was interrupted")]
    Interrupted,

    /// I/O failure outside of expression content, e.g. while creating
    /// a GC root.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Evaluator-internal failure unrelated to the expression.
    #[error("internal evaluator error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether this error is scoped to a single attribute path. Only
    /// recoverable errors are caught at the visiting frame; everything
    /// else propagates out of the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedValue(_) | Error::MissingAttribute(_) | Error::Evaluation(_)
        )
    }
}
