//! A small, lazy evaluator for the jobset expression language.
//!
//! The walker crate drives evaluation through capability traits; this
//! crate provides the concrete machinery: parsing via `rnix`, thunked
//! lazy values, environment chains, contextful strings and a minimal
//! builtin set that consumers extend with store-aware functions.

use std::path::Path;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};

pub mod builtins;
mod errors;
mod eval;
mod value;

pub use errors::{ErrorKind, EvalResult};
pub use eval::{auto_call, call_function, coerce_to_string, eval_expr, Env};
pub use value::{
    Builtin, BuiltinFn, Closure, NixAttrs, NixContext, NixContextElement, NixList, NixString,
    Thunk, Value,
};

/// Cooperative interruption flag, set from signal handlers. Evaluation
/// itself never polls it; the driver checks at its own granularity via
/// [`check_interrupt`].
static INTERRUPTED: AtomicBool = AtomicBool::new(false);

pub fn request_interrupt() {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

pub fn check_interrupt() -> EvalResult<()> {
    if INTERRUPTED.load(Ordering::SeqCst) {
        Err(ErrorKind::Interrupted)
    } else {
        Ok(())
    }
}

/// Parses and evaluates an expression to weak head normal form.
/// Relative paths in the expression resolve against `base_dir`.
pub fn evaluate(code: &str, base_dir: Option<&Path>, env: &Rc<Env>) -> EvalResult<Value> {
    let parsed = rnix::ast::Root::parse(code);
    let parse_errors = parsed.errors();
    if !parse_errors.is_empty() {
        let rendered = parse_errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(ErrorKind::ParseFailure(rendered));
    }

    let expr = parsed
        .tree()
        .expr()
        .ok_or_else(|| ErrorKind::ParseFailure("empty expression".to_string()))?;

    let scope = match base_dir {
        Some(dir) => Env::with_base_dir(env, dir.to_path_buf()),
        None => env.clone(),
    };
    eval_expr(&expr, &scope)?.force()
}

/// Evaluates the expression in a file; relative paths resolve against
/// the file's directory.
pub fn evaluate_file(path: &Path, env: &Rc<Env>) -> EvalResult<Value> {
    let code = std::fs::read_to_string(path)
        .map_err(|e| ErrorKind::Io(format!("{}: {}", path.display(), e)))?;
    evaluate(&code, path.parent(), env)
}
