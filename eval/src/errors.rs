//! Errors produced during evaluation.
//!
//! Most evaluation failures are *catchable*: they describe a problem
//! with the expression under evaluation and can be contained by a
//! caller that wants to keep going (the jobset walker contains them per
//! attribute). A few describe problems with the evaluation itself and
//! must abort the whole run.

use std::rc::Rc;

use thiserror::Error;

pub type EvalResult<T> = Result<T, ErrorKind>;

#[derive(Clone, Debug, Error)]
pub enum ErrorKind {
    #[error("{0}")]
    Throw(String),

    #[error("evaluation aborted: {0}")]
    Abort(String),

    #[error("assertion failed")]
    AssertionFailed,

    #[error("value is a {actual} while a {expected} was expected")]
    TypeError {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("attribute '{0}' is missing")]
    AttributeNotFound(String),

    #[error("variable '{0}' is not defined")]
    UnknownVariable(String),

    #[error("infinite recursion encountered")]
    InfiniteRecursion,

    #[error("division by zero")]
    DivisionByZero,

    #[error("function called without required argument '{0}'")]
    MissingArgument(String),

    #[error("function called with unexpected argument '{0}'")]
    UnexpectedArgument(String),

    #[error("cannot auto-call a function that has an argument without a default value ('{0}')")]
    MissingAutoArgument(String),

    #[error("attribute '{0}' is defined more than once")]
    DuplicateAttribute(String),

    #[error("dynamic attribute names are not allowed in {0}")]
    DynamicKeyInScope(&'static str),

    #[error("invalid literal: {0}")]
    InvalidLiteral(String),

    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    /// A failure raised by a native builtin, e.g. a malformed
    /// derivation.
    #[error("{0}")]
    External(Rc<dyn std::error::Error>),

    #[error("evaluation was interrupted")]
    Interrupted,

    #[error("failed to parse expression: {0}")]
    ParseFailure(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl ErrorKind {
    /// Whether the error is scoped to the expression under evaluation
    /// and may be contained by the caller. Interruption, parse failures
    /// and I/O problems always abort the run.
    pub fn is_catchable(&self) -> bool {
        !matches!(
            self,
            ErrorKind::Interrupted | ErrorKind::ParseFailure(_) | ErrorKind::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_errors_render_like_the_evaluator_speaks() {
        let err = ErrorKind::TypeError {
            expected: "set",
            actual: "string",
        };
        assert_eq!(err.to_string(), "value is a string while a set was expected");
    }

    #[test]
    fn interruption_is_not_catchable() {
        assert!(!ErrorKind::Interrupted.is_catchable());
        assert!(!ErrorKind::ParseFailure("x".into()).is_catchable());
        assert!(ErrorKind::Throw("x".into()).is_catchable());
        assert!(ErrorKind::Abort("x".into()).is_catchable());
        assert!(ErrorKind::AssertionFailed.is_catchable());
    }
}
