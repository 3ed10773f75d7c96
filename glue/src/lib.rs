//! Wiring between the expression evaluator and job discovery: the
//! store-aware `derivation` builtin, pseudo store paths, and the
//! capability implementation the walker consumes.

use std::rc::Rc;

use jobset_eval::{Env, Value};

pub mod derivation;
mod errors;
mod evaluator;
mod store_path;

pub use errors::{eval_error, DerivationError};
pub use evaluator::{DrvJob, JobsetEvaluator};

/// The global environment for jobset expressions: the standard builtins
/// plus `derivation`.
pub fn jobset_environment() -> Rc<Env> {
    jobset_eval::builtins::base_environment_with([(
        "derivation",
        Value::Builtin(derivation::derivation_builtin()),
    )])
}
