//! Error surfaces between the evaluator and job discovery.

use std::rc::Rc;

use jobset_eval::ErrorKind;
use thiserror::Error;

/// Failures raised by the `derivation` builtin before a recipe can be
/// constructed.
#[derive(Clone, Debug, Error)]
pub enum DerivationError {
    #[error("derivation is missing the required '{0}' attribute")]
    MissingAttribute(&'static str),

    #[error("invalid derivation name: '{0}'")]
    InvalidName(String),

    #[error("invalid output name: '{0}'")]
    InvalidOutput(String),

    #[error("derivation has no outputs")]
    NoOutputs,

    #[error("output '{0}' is declared more than once")]
    DuplicateOutput(String),
}

impl From<DerivationError> for ErrorKind {
    fn from(err: DerivationError) -> Self {
        ErrorKind::External(Rc::new(err))
    }
}

/// Maps evaluator errors onto the discovery error surface: catchable
/// failures become containable evaluation errors, everything else
/// aborts the run.
pub fn eval_error(err: ErrorKind) -> hydra_jobs::Error {
    match err {
        ErrorKind::Interrupted => hydra_jobs::Error::Interrupted,
        err if err.is_catchable() => hydra_jobs::Error::Evaluation(err.to_string()),
        err => hydra_jobs::Error::Internal(err.to_string()),
    }
}
