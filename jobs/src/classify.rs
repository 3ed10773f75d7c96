//! Decides what a forced value at some attribute path represents.

use crate::errors::{Error, Result};
use crate::evaluator::{Evaluator, ValueKind};

/// What the walker should do with a forced value.
pub enum Classification<E: Evaluator> {
    /// A concrete derivation; resolve it into a job descriptor.
    Job(E::Job),

    /// An attribute set to recurse into, with its named members in
    /// stable order.
    Namespace(Vec<(String, E::Value)>),

    /// An explicit "do nothing" marker (null).
    Skip,
}

impl<E: Evaluator> std::fmt::Debug for Classification<E>
where
    E::Job: std::fmt::Debug,
    E::Value: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Classification::Job(job) => f.debug_tuple("Job").field(job).finish(),
            Classification::Namespace(members) => {
                f.debug_tuple("Namespace").field(members).finish()
            }
            Classification::Skip => f.write_str("Skip"),
        }
    }
}

/// Classifies a value, forcing it first. Values that are neither
/// derivations, attribute sets nor null are unsupported and fail with
/// the value's kind in the message.
pub fn classify<E: Evaluator>(eval: &E, value: &E::Value) -> Result<Classification<E>> {
    match eval.force(value)? {
        ValueKind::AttrSet => match eval.as_job(value)? {
            Some(job) => Ok(Classification::Job(job)),
            None => Ok(Classification::Namespace(eval.attrs(value)?)),
        },
        ValueKind::Null => Ok(Classification::Skip),
        _ => Err(Error::UnsupportedValue(eval.type_name(value))),
    }
}
