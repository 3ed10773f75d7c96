//! Suspended computations.
//!
//! A thunk wraps an unevaluated expression (or a native computation)
//! together with the environment it closed over. Forcing replaces the
//! suspension with the computed value so repeated forces are free, and
//! a blackhole marker detects self-referential forcing as infinite
//! recursion. A failed force restores the suspension, which keeps
//! errors repeatable instead of poisoning the thunk.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use rnix::ast;

use super::Value;
use crate::errors::{ErrorKind, EvalResult};
use crate::eval::{eval_expr, Env};

#[derive(Clone)]
pub struct Thunk(Rc<RefCell<ThunkRepr>>);

enum ThunkRepr {
    Suspended { expr: ast::Expr, env: Rc<Env> },
    Native(Rc<dyn Fn() -> EvalResult<Value>>),
    Blackhole,
    Evaluated(Value),
}

impl Thunk {
    pub fn new(expr: ast::Expr, env: Rc<Env>) -> Self {
        Thunk(Rc::new(RefCell::new(ThunkRepr::Suspended { expr, env })))
    }

    pub fn new_native(f: impl Fn() -> EvalResult<Value> + 'static) -> Self {
        Thunk(Rc::new(RefCell::new(ThunkRepr::Native(Rc::new(f)))))
    }

    pub fn force(&self) -> EvalResult<Value> {
        let repr = {
            let mut slot = self.0.borrow_mut();
            match &*slot {
                ThunkRepr::Evaluated(value) => return Ok(value.clone()),
                ThunkRepr::Blackhole => return Err(ErrorKind::InfiniteRecursion),
                _ => {}
            }
            std::mem::replace(&mut *slot, ThunkRepr::Blackhole)
        };

        let result = match &repr {
            ThunkRepr::Suspended { expr, env } => {
                eval_expr(expr, env).and_then(|value| value.force())
            }
            ThunkRepr::Native(f) => f().and_then(|value| value.force()),
            _ => unreachable!("suspension was taken above"),
        };

        let mut slot = self.0.borrow_mut();
        match result {
            Ok(value) => {
                *slot = ThunkRepr::Evaluated(value.clone());
                Ok(value)
            }
            Err(err) => {
                *slot = repr;
                Err(err)
            }
        }
    }
}

impl fmt::Debug for Thunk {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &*self.0.borrow() {
            ThunkRepr::Suspended { .. } => write!(f, "Thunk(suspended)"),
            ThunkRepr::Native(_) => write!(f, "Thunk(native)"),
            ThunkRepr::Blackhole => write!(f, "Thunk(blackhole)"),
            ThunkRepr::Evaluated(value) => write!(f, "Thunk({value:?})"),
        }
    }
}
