//! The runtime representation of evaluated expressions.

use std::path::PathBuf;
use std::rc::Rc;

mod attrs;
mod function;
mod list;
mod string;
mod thunk;

pub use attrs::NixAttrs;
pub use function::{Builtin, BuiltinFn, Closure};
pub use list::NixList;
pub use string::{NixContext, NixContextElement, NixString};
pub use thunk::Thunk;

use crate::errors::{ErrorKind, EvalResult};

#[derive(Clone, Debug)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(NixString),
    Path(PathBuf),
    Attrs(Rc<NixAttrs>),
    List(NixList),
    Closure(Rc<Closure>),
    Builtin(Builtin),
    Thunk(Thunk),
}

impl Value {
    /// Evaluates the value to weak head normal form. Non-thunk values
    /// are returned as-is; thunks are evaluated through, memoising the
    /// result.
    pub fn force(&self) -> EvalResult<Value> {
        match self {
            Value::Thunk(thunk) => thunk.force(),
            other => Ok(other.clone()),
        }
    }

    /// The type name as surfaced in error messages and `builtins.typeOf`.
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Integer(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Path(_) => "path",
            Value::Attrs(_) => "set",
            Value::List(_) => "list",
            Value::Closure(_) | Value::Builtin(_) => "lambda",
            Value::Thunk(_) => "thunk",
        }
    }

    fn type_error<T>(&self, expected: &'static str) -> EvalResult<T> {
        Err(ErrorKind::TypeError {
            expected,
            actual: self.type_of(),
        })
    }

    pub fn to_str(&self) -> EvalResult<NixString> {
        match self.force()? {
            Value::String(s) => Ok(s),
            other => other.type_error("string"),
        }
    }

    pub fn as_bool(&self) -> EvalResult<bool> {
        match self.force()? {
            Value::Bool(b) => Ok(b),
            other => other.type_error("bool"),
        }
    }

    pub fn as_int(&self) -> EvalResult<i64> {
        match self.force()? {
            Value::Integer(i) => Ok(i),
            other => other.type_error("int"),
        }
    }

    pub fn to_attrs(&self) -> EvalResult<Rc<NixAttrs>> {
        match self.force()? {
            Value::Attrs(attrs) => Ok(attrs),
            other => other.type_error("set"),
        }
    }

    pub fn to_list(&self) -> EvalResult<NixList> {
        match self.force()? {
            Value::List(list) => Ok(list),
            other => other.type_error("list"),
        }
    }

    /// Selects an attribute that must exist.
    pub fn select_required(&self, name: &str) -> EvalResult<Value> {
        self.to_attrs()?
            .select(name)
            .cloned()
            .ok_or_else(|| ErrorKind::AttributeNotFound(name.to_string()))
    }
}

impl From<NixString> for Value {
    fn from(s: NixString) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(NixString::from(s))
    }
}

impl From<NixAttrs> for Value {
    fn from(attrs: NixAttrs) -> Self {
        Value::Attrs(Rc::new(attrs))
    }
}

impl From<Builtin> for Value {
    fn from(builtin: Builtin) -> Self {
        Value::Builtin(builtin)
    }
}
