//! The two callable value kinds: closures over language lambdas, and
//! native builtins applied argument by argument.

use std::fmt;
use std::rc::Rc;

use rnix::ast;

use super::Value;
use crate::errors::EvalResult;
use crate::eval::Env;

/// A lambda closed over the environment it was defined in.
#[derive(Clone, Debug)]
pub struct Closure {
    pub(crate) lambda: ast::Lambda,
    pub(crate) env: Rc<Env>,
}

impl Closure {
    pub(crate) fn new(lambda: ast::Lambda, env: Rc<Env>) -> Self {
        Closure { lambda, env }
    }
}

pub type BuiltinFn = fn(Vec<Value>) -> EvalResult<Value>;

/// A named native function. Multi-argument builtins curry: each
/// application captures one argument until the arity is reached, at
/// which point the function runs with all captured arguments in order.
#[derive(Clone)]
pub struct Builtin {
    name: &'static str,
    arity: usize,
    func: BuiltinFn,
    partials: Vec<Value>,
}

impl Builtin {
    pub fn new(name: &'static str, arity: usize, func: BuiltinFn) -> Self {
        Builtin {
            name,
            arity,
            func,
            partials: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn apply(&self, arg: Value) -> EvalResult<Value> {
        let mut next = self.clone();
        next.partials.push(arg);
        if next.partials.len() == next.arity {
            (next.func)(next.partials)
        } else {
            Ok(Value::Builtin(next))
        }
    }
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "builtin[{}]", self.name)
    }
}
