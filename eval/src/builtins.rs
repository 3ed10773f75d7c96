//! The native functions available to jobset expressions, and the
//! global environment they live in.
//!
//! The set is deliberately small: what release expressions actually
//! reach for. Consumers can extend it through
//! [`base_environment_with`], which is how the store layer contributes
//! `derivation`.

use std::collections::BTreeMap;
use std::rc::Rc;

use smol_str::SmolStr;

use crate::errors::{ErrorKind, EvalResult};
use crate::eval::{call_function, coerce_to_string, Env};
use crate::value::{Builtin, NixAttrs, NixContext, NixList, NixString, Thunk, Value};

fn pure_builtins() -> Vec<(&'static str, Value)> {
    vec![
        ("abort", Builtin::new("abort", 1, abort).into()),
        ("attrNames", Builtin::new("attrNames", 1, attr_names).into()),
        ("baseNameOf", Builtin::new("baseNameOf", 1, base_name_of).into()),
        ("length", Builtin::new("length", 1, length).into()),
        ("map", Builtin::new("map", 2, map).into()),
        ("throw", Builtin::new("throw", 1, throw).into()),
        ("toString", Builtin::new("toString", 1, to_string).into()),
        ("typeOf", Builtin::new("typeOf", 1, type_of).into()),
    ]
}

/// The global scope with the standard builtins only.
pub fn base_environment() -> Rc<Env> {
    base_environment_with([])
}

/// The global scope, extended with caller-provided builtins. Each extra
/// entry becomes a global and a member of the `builtins` set.
pub fn base_environment_with(
    extra: impl IntoIterator<Item = (&'static str, Value)>,
) -> Rc<Env> {
    let env = Env::root();
    env.define("true", Value::Bool(true));
    env.define("false", Value::Bool(false));
    env.define("null", Value::Null);

    let mut members = BTreeMap::new();
    members.insert(SmolStr::new("true"), Value::Bool(true));
    members.insert(SmolStr::new("false"), Value::Bool(false));
    members.insert(SmolStr::new("null"), Value::Null);

    for (name, value) in pure_builtins().into_iter().chain(extra) {
        env.define(name, value.clone());
        members.insert(SmolStr::new(name), value);
    }

    let builtins: NixAttrs = members.into_iter().collect();
    env.define("builtins", Value::from(builtins));
    env
}

fn throw(args: Vec<Value>) -> EvalResult<Value> {
    let mut context = NixContext::new();
    let message = coerce_to_string(&args[0], &mut context, false)?;
    Err(ErrorKind::Throw(message))
}

fn abort(args: Vec<Value>) -> EvalResult<Value> {
    let mut context = NixContext::new();
    let message = coerce_to_string(&args[0], &mut context, false)?;
    Err(ErrorKind::Abort(message))
}

fn to_string(args: Vec<Value>) -> EvalResult<Value> {
    let mut context = NixContext::new();
    let text = coerce_to_string(&args[0], &mut context, true)?;
    Ok(Value::String(NixString::new(text, context)))
}

fn type_of(args: Vec<Value>) -> EvalResult<Value> {
    Ok(Value::from(args[0].force()?.type_of()))
}

fn attr_names(args: Vec<Value>) -> EvalResult<Value> {
    let attrs = args[0].to_attrs()?;
    let names = attrs
        .keys()
        .map(|name| Value::from(name.as_str()))
        .collect();
    Ok(Value::List(names))
}

fn length(args: Vec<Value>) -> EvalResult<Value> {
    Ok(Value::Integer(args[0].to_list()?.len() as i64))
}

fn map(mut args: Vec<Value>) -> EvalResult<Value> {
    let list = args.pop().unwrap().to_list()?;
    let function = args.pop().unwrap();

    let mapped: NixList = list
        .iter()
        .map(|item| {
            let function = function.clone();
            let item = item.clone();
            Value::Thunk(Thunk::new_native(move || {
                call_function(&function, item.clone())
            }))
        })
        .collect();
    Ok(Value::List(mapped))
}

fn base_name_of(args: Vec<Value>) -> EvalResult<Value> {
    let mut context = NixContext::new();
    let text = coerce_to_string(&args[0], &mut context, false)?;
    let base = text.rsplit('/').next().unwrap_or("").to_string();
    Ok(Value::String(NixString::new(base, context)))
}
