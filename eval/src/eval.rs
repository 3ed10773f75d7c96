//! The expression walker.
//!
//! Evaluation is a lazy tree walk over the `rnix` AST: every binding
//! and list element is suspended as a [`Thunk`] and only forced when
//! observed. Scopes form a parent chain of environments; lexical
//! bindings always win over `with` namespaces, which are consulted
//! innermost-first only after the whole lexical chain has been
//! searched.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use rnix::ast::{self, AstToken, HasEntry};
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::errors::{ErrorKind, EvalResult};
use crate::value::{Closure, NixAttrs, NixContext, NixList, NixString, Thunk, Value};

/// One scope in the chain. Bindings live behind a `RefCell` so that
/// recursive scopes can be populated after the environment is shared
/// with the thunks defined inside it.
#[derive(Debug, Default)]
pub struct Env {
    parent: Option<Rc<Env>>,
    bindings: RefCell<FxHashMap<SmolStr, Value>>,
    with_namespace: Option<Value>,
    base_dir: Option<PathBuf>,
}

impl Env {
    pub fn root() -> Rc<Env> {
        Rc::new(Env::default())
    }

    pub fn child(parent: &Rc<Env>) -> Rc<Env> {
        Rc::new(Env {
            parent: Some(parent.clone()),
            ..Env::default()
        })
    }

    pub fn with_base_dir(parent: &Rc<Env>, dir: PathBuf) -> Rc<Env> {
        Rc::new(Env {
            parent: Some(parent.clone()),
            base_dir: Some(dir),
            ..Env::default()
        })
    }

    fn with_namespace(parent: &Rc<Env>, namespace: Value) -> Rc<Env> {
        Rc::new(Env {
            parent: Some(parent.clone()),
            with_namespace: Some(namespace),
            ..Env::default()
        })
    }

    pub fn define(&self, name: impl Into<SmolStr>, value: Value) {
        self.bindings.borrow_mut().insert(name.into(), value);
    }

    fn defines_locally(&self, name: &str) -> bool {
        self.bindings.borrow().contains_key(name)
    }

    /// Resolves a name. Lexical bindings anywhere in the chain shadow
    /// every `with` namespace, regardless of nesting depth.
    pub fn lookup(&self, name: &str) -> EvalResult<Option<Value>> {
        let mut env = Some(self);
        while let Some(e) = env {
            if let Some(value) = e.bindings.borrow().get(name) {
                return Ok(Some(value.clone()));
            }
            env = e.parent.as_deref();
        }

        let mut env = Some(self);
        while let Some(e) = env {
            if let Some(namespace) = &e.with_namespace {
                if let Some(value) = namespace.to_attrs()?.select(name) {
                    return Ok(Some(value.clone()));
                }
            }
            env = e.parent.as_deref();
        }

        Ok(None)
    }

    /// The directory relative paths resolve against, from the nearest
    /// scope that set one.
    pub fn base_dir(&self) -> Option<&Path> {
        let mut env = Some(self);
        while let Some(e) = env {
            if let Some(dir) = &e.base_dir {
                return Some(dir);
            }
            env = e.parent.as_deref();
        }
        None
    }
}

pub fn eval_expr(expr: &ast::Expr, env: &Rc<Env>) -> EvalResult<Value> {
    match expr {
        ast::Expr::Literal(node) => eval_literal(node),
        ast::Expr::Str(node) => eval_str(node, env),
        ast::Expr::Path(node) => eval_path(node, env),
        ast::Expr::Ident(node) => eval_ident(node, env),
        ast::Expr::Paren(node) => eval_expr(&node.expr().unwrap(), env),
        ast::Expr::List(node) => eval_list(node, env),
        ast::Expr::AttrSet(node) => eval_attrset(node, env),
        ast::Expr::LetIn(node) => eval_let(node, env),
        ast::Expr::Select(node) => eval_select(node, env),
        ast::Expr::HasAttr(node) => eval_has_attr(node, env),
        ast::Expr::UnaryOp(node) => eval_unary_op(node, env),
        ast::Expr::BinOp(node) => eval_bin_op(node, env),
        ast::Expr::IfElse(node) => eval_if_else(node, env),
        ast::Expr::Assert(node) => eval_assert(node, env),
        ast::Expr::With(node) => eval_with(node, env),
        ast::Expr::Lambda(node) => Ok(Value::Closure(Rc::new(Closure::new(
            node.clone(),
            env.clone(),
        )))),
        ast::Expr::Apply(node) => eval_apply(node, env),
        ast::Expr::LegacyLet(_) => Err(ErrorKind::NotImplemented("legacy let syntax")),
        _ => Err(ErrorKind::ParseFailure("malformed expression".to_string())),
    }
}

fn eval_literal(node: &ast::Literal) -> EvalResult<Value> {
    match node.kind() {
        ast::LiteralKind::Integer(i) => i
            .value()
            .map(Value::Integer)
            .map_err(|e| ErrorKind::InvalidLiteral(e.to_string())),
        ast::LiteralKind::Float(f) => f
            .value()
            .map(Value::Float)
            .map_err(|e| ErrorKind::InvalidLiteral(e.to_string())),
        ast::LiteralKind::Uri(u) => Ok(Value::String(NixString::from(u.syntax().text()))),
    }
}

fn eval_str(node: &ast::Str, env: &Rc<Env>) -> EvalResult<Value> {
    let parts = node.normalized_parts();

    if parts.len() == 1 {
        if let ast::InterpolPart::Literal(lit) = &parts[0] {
            return Ok(Value::String(NixString::from(lit.as_str())));
        }
    }

    let mut text = String::new();
    let mut context = NixContext::new();
    for part in parts {
        match part {
            ast::InterpolPart::Literal(lit) => text.push_str(&lit),
            ast::InterpolPart::Interpolation(ipol) => {
                let value = eval_expr(&ipol.expr().unwrap(), env)?;
                text.push_str(&coerce_to_string(&value, &mut context, false)?);
            }
        }
    }

    Ok(Value::String(NixString::new(text, context)))
}

fn eval_path(node: &ast::Path, env: &Rc<Env>) -> EvalResult<Value> {
    let raw = node.to_string();
    if raw.starts_with('/') {
        Ok(Value::Path(PathBuf::from(raw)))
    } else if raw.starts_with('<') {
        Err(ErrorKind::NotImplemented("search-path lookup"))
    } else if raw.starts_with('~') {
        Err(ErrorKind::NotImplemented("home-relative paths"))
    } else {
        let base = env
            .base_dir()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(Value::Path(base.join(raw)))
    }
}

fn eval_ident(node: &ast::Ident, env: &Rc<Env>) -> EvalResult<Value> {
    let name = node.ident_token().unwrap();
    match env.lookup(name.text())? {
        Some(value) => Ok(value),
        None => Err(ErrorKind::UnknownVariable(name.text().to_string())),
    }
}

fn eval_list(node: &ast::List, env: &Rc<Env>) -> EvalResult<Value> {
    let items: Vec<Value> = node
        .items()
        .map(|item| Value::Thunk(Thunk::new(item, env.clone())))
        .collect();
    Ok(Value::List(NixList::from(items)))
}

fn eval_attrset(node: &ast::AttrSet, env: &Rc<Env>) -> EvalResult<Value> {
    let rec = node.rec_token().is_some();
    let scope = if rec { Env::child(env) } else { env.clone() };
    let mut map = BTreeMap::new();

    for inherit in node.inherits() {
        match inherit.from() {
            // Plain inherit resolves in the surrounding scope, never in
            // the set itself.
            None => {
                for attr in inherit.attrs() {
                    let name = static_attr_name(&attr, "inherit")?;
                    let value = env
                        .lookup(&name)?
                        .ok_or_else(|| ErrorKind::UnknownVariable(name.to_string()))?;
                    insert_unique(&mut map, name, value)?;
                }
            }
            Some(from) => {
                let source = Value::Thunk(Thunk::new(from.expr().unwrap(), scope.clone()));
                for attr in inherit.attrs() {
                    let name = static_attr_name(&attr, "inherit")?;
                    let source = source.clone();
                    let wanted = name.to_string();
                    let value =
                        Value::Thunk(Thunk::new_native(move || source.select_required(&wanted)));
                    insert_unique(&mut map, name, value)?;
                }
            }
        }
    }

    for entry in node.attrpath_values() {
        let mut path = Vec::new();
        for attr in entry.attrpath().unwrap().attrs() {
            path.push(attr_name(&attr, &scope)?);
        }
        let value = Value::Thunk(Thunk::new(entry.value().unwrap(), scope.clone()));
        insert_nested(&mut map, &path, value)?;
    }

    if rec {
        for (name, value) in &map {
            scope.define(name.clone(), value.clone());
        }
    }

    Ok(Value::Attrs(Rc::new(map.into_iter().collect())))
}

fn eval_let(node: &ast::LetIn, env: &Rc<Env>) -> EvalResult<Value> {
    let scope = Env::child(env);

    for inherit in node.inherits() {
        match inherit.from() {
            None => {
                for attr in inherit.attrs() {
                    let name = static_attr_name(&attr, "let")?;
                    if scope.defines_locally(&name) {
                        return Err(ErrorKind::DuplicateAttribute(name.to_string()));
                    }
                    let value = env
                        .lookup(&name)?
                        .ok_or_else(|| ErrorKind::UnknownVariable(name.to_string()))?;
                    scope.define(name, value);
                }
            }
            Some(from) => {
                let source = Value::Thunk(Thunk::new(from.expr().unwrap(), scope.clone()));
                for attr in inherit.attrs() {
                    let name = static_attr_name(&attr, "let")?;
                    if scope.defines_locally(&name) {
                        return Err(ErrorKind::DuplicateAttribute(name.to_string()));
                    }
                    let source = source.clone();
                    let wanted = name.to_string();
                    scope.define(
                        name,
                        Value::Thunk(Thunk::new_native(move || source.select_required(&wanted))),
                    );
                }
            }
        }
    }

    for entry in node.attrpath_values() {
        let attrs: Vec<ast::Attr> = entry.attrpath().unwrap().attrs().collect();
        if attrs.len() != 1 {
            return Err(ErrorKind::NotImplemented("nested let bindings"));
        }
        let name = static_attr_name(&attrs[0], "let")?;
        if scope.defines_locally(&name) {
            return Err(ErrorKind::DuplicateAttribute(name.to_string()));
        }
        let value = Value::Thunk(Thunk::new(entry.value().unwrap(), scope.clone()));
        scope.define(name, value);
    }

    eval_expr(&node.body().unwrap(), &scope)
}

fn eval_select(node: &ast::Select, env: &Rc<Env>) -> EvalResult<Value> {
    let default = node.default_expr();
    let mut current = eval_expr(&node.expr().unwrap(), env)?;

    for fragment in node.attrpath().unwrap().attrs() {
        let name = attr_name(&fragment, env)?;
        let selected = match current.force()? {
            Value::Attrs(attrs) => attrs.select(&name).cloned(),
            other if default.is_none() => {
                return Err(ErrorKind::TypeError {
                    expected: "set",
                    actual: other.type_of(),
                })
            }
            _ => None,
        };

        match selected {
            Some(value) => current = value,
            None => {
                return match &default {
                    Some(expr) => eval_expr(expr, env),
                    None => Err(ErrorKind::AttributeNotFound(name.to_string())),
                }
            }
        }
    }

    Ok(current)
}

fn eval_has_attr(node: &ast::HasAttr, env: &Rc<Env>) -> EvalResult<Value> {
    let mut current = eval_expr(&node.expr().unwrap(), env)?;
    let path: Vec<ast::Attr> = node.attrpath().unwrap().attrs().collect();

    for (i, fragment) in path.iter().enumerate() {
        let name = attr_name(fragment, env)?;
        let attrs = match current.force()? {
            Value::Attrs(attrs) => attrs,
            _ => return Ok(Value::Bool(false)),
        };
        match attrs.select(&name) {
            Some(value) if i + 1 < path.len() => current = value.clone(),
            Some(_) => return Ok(Value::Bool(true)),
            None => return Ok(Value::Bool(false)),
        }
    }

    Ok(Value::Bool(true))
}

fn eval_unary_op(node: &ast::UnaryOp, env: &Rc<Env>) -> EvalResult<Value> {
    let value = eval_expr(&node.expr().unwrap(), env)?;
    match node.operator().unwrap() {
        ast::UnaryOpKind::Invert => Ok(Value::Bool(!value.as_bool()?)),
        ast::UnaryOpKind::Negate => match value.force()? {
            Value::Integer(i) => Ok(Value::Integer(-i)),
            Value::Float(f) => Ok(Value::Float(-f)),
            other => Err(ErrorKind::TypeError {
                expected: "int",
                actual: other.type_of(),
            }),
        },
    }
}

fn eval_bin_op(node: &ast::BinOp, env: &Rc<Env>) -> EvalResult<Value> {
    use ast::BinOpKind;

    let op = node.operator().unwrap();
    let lhs = node.lhs().unwrap();
    let rhs = node.rhs().unwrap();

    // The logical operators short-circuit; everything else is strict in
    // both operands.
    match op {
        BinOpKind::And => {
            if !eval_expr(&lhs, env)?.as_bool()? {
                return Ok(Value::Bool(false));
            }
            return Ok(Value::Bool(eval_expr(&rhs, env)?.as_bool()?));
        }
        BinOpKind::Or => {
            if eval_expr(&lhs, env)?.as_bool()? {
                return Ok(Value::Bool(true));
            }
            return Ok(Value::Bool(eval_expr(&rhs, env)?.as_bool()?));
        }
        BinOpKind::Implication => {
            if !eval_expr(&lhs, env)?.as_bool()? {
                return Ok(Value::Bool(true));
            }
            return Ok(Value::Bool(eval_expr(&rhs, env)?.as_bool()?));
        }
        _ => {}
    }

    let lhs = eval_expr(&lhs, env)?.force()?;
    let rhs = eval_expr(&rhs, env)?.force()?;

    match op {
        BinOpKind::Add => add_values(lhs, rhs),
        BinOpKind::Sub => arithmetic(lhs, rhs, i64::wrapping_sub, |a, b| a - b),
        BinOpKind::Mul => arithmetic(lhs, rhs, i64::wrapping_mul, |a, b| a * b),
        BinOpKind::Div => {
            let zero = matches!(&rhs, Value::Integer(0))
                || matches!(&rhs, Value::Float(f) if *f == 0.0);
            if zero {
                return Err(ErrorKind::DivisionByZero);
            }
            arithmetic(lhs, rhs, i64::wrapping_div, |a, b| a / b)
        }
        BinOpKind::Update => Ok(Value::Attrs(Rc::new(
            lhs.to_attrs()?.update(&*rhs.to_attrs()?),
        ))),
        BinOpKind::Concat => Ok(Value::List(lhs.to_list()?.concat(&rhs.to_list()?))),
        BinOpKind::Equal => Ok(Value::Bool(nix_eq(&lhs, &rhs)?)),
        BinOpKind::NotEqual => Ok(Value::Bool(!nix_eq(&lhs, &rhs)?)),
        BinOpKind::Less => Ok(Value::Bool(compare(&lhs, &rhs)?.is_lt())),
        BinOpKind::LessOrEq => Ok(Value::Bool(compare(&lhs, &rhs)?.is_le())),
        BinOpKind::More => Ok(Value::Bool(compare(&lhs, &rhs)?.is_gt())),
        BinOpKind::MoreOrEq => Ok(Value::Bool(compare(&lhs, &rhs)?.is_ge())),
        BinOpKind::And | BinOpKind::Or | BinOpKind::Implication => {
            unreachable!("handled above")
        }
    }
}

fn add_values(lhs: Value, rhs: Value) -> EvalResult<Value> {
    match lhs {
        Value::String(a) => {
            let mut context = NixContext::new();
            context.mimic(&a);
            let text = coerce_to_string(&rhs, &mut context, false)?;
            Ok(Value::String(NixString::new(
                format!("{}{}", a.as_str(), text),
                context,
            )))
        }
        Value::Path(a) => {
            let mut context = NixContext::new();
            let text = coerce_to_string(&rhs, &mut context, false)?;
            Ok(Value::Path(PathBuf::from(format!(
                "{}{}",
                a.display(),
                text
            ))))
        }
        lhs => arithmetic(lhs, rhs, i64::wrapping_add, |a, b| a + b),
    }
}

fn arithmetic(
    lhs: Value,
    rhs: Value,
    int_op: fn(i64, i64) -> i64,
    float_op: fn(f64, f64) -> f64,
) -> EvalResult<Value> {
    match (lhs, rhs) {
        (Value::Integer(a), Value::Integer(b)) => Ok(Value::Integer(int_op(a, b))),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(float_op(a, b))),
        (Value::Integer(a), Value::Float(b)) => Ok(Value::Float(float_op(a as f64, b))),
        (Value::Float(a), Value::Integer(b)) => Ok(Value::Float(float_op(a, b as f64))),
        (Value::Integer(_), other) | (Value::Float(_), other) => Err(ErrorKind::TypeError {
            expected: "int",
            actual: other.type_of(),
        }),
        (other, _) => Err(ErrorKind::TypeError {
            expected: "int",
            actual: other.type_of(),
        }),
    }
}

fn nix_eq(lhs: &Value, rhs: &Value) -> EvalResult<bool> {
    match (lhs.force()?, rhs.force()?) {
        (Value::Null, Value::Null) => Ok(true),
        (Value::Bool(a), Value::Bool(b)) => Ok(a == b),
        (Value::Integer(a), Value::Integer(b)) => Ok(a == b),
        (Value::Float(a), Value::Float(b)) => Ok(a == b),
        (Value::Integer(a), Value::Float(b)) | (Value::Float(b), Value::Integer(a)) => {
            Ok(a as f64 == b)
        }
        (Value::String(a), Value::String(b)) => Ok(a == b),
        (Value::Path(a), Value::Path(b)) => Ok(a == b),
        (Value::List(a), Value::List(b)) => {
            if a.len() != b.len() {
                return Ok(false);
            }
            for (x, y) in a.iter().zip(b.iter()) {
                if !nix_eq(x, y)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        (Value::Attrs(a), Value::Attrs(b)) => {
            if a.len() != b.len() {
                return Ok(false);
            }
            for ((ka, va), (kb, vb)) in a.iter().zip(b.iter()) {
                if ka != kb || !nix_eq(va, vb)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        _ => Ok(false),
    }
}

fn compare(lhs: &Value, rhs: &Value) -> EvalResult<std::cmp::Ordering> {
    use std::cmp::Ordering;

    match (lhs, rhs) {
        (Value::Integer(a), Value::Integer(b)) => Ok(a.cmp(b)),
        (Value::Float(a), Value::Float(b)) => {
            Ok(a.partial_cmp(b).unwrap_or(Ordering::Equal))
        }
        (Value::Integer(a), Value::Float(b)) => {
            Ok((*a as f64).partial_cmp(b).unwrap_or(Ordering::Equal))
        }
        (Value::Float(a), Value::Integer(b)) => {
            Ok(a.partial_cmp(&(*b as f64)).unwrap_or(Ordering::Equal))
        }
        (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
        (a, b) => Err(ErrorKind::TypeError {
            expected: a.type_of(),
            actual: b.type_of(),
        }),
    }
}

fn eval_if_else(node: &ast::IfElse, env: &Rc<Env>) -> EvalResult<Value> {
    if eval_expr(&node.condition().unwrap(), env)?.as_bool()? {
        eval_expr(&node.body().unwrap(), env)
    } else {
        eval_expr(&node.else_body().unwrap(), env)
    }
}

fn eval_assert(node: &ast::Assert, env: &Rc<Env>) -> EvalResult<Value> {
    if eval_expr(&node.condition().unwrap(), env)?.as_bool()? {
        eval_expr(&node.body().unwrap(), env)
    } else {
        Err(ErrorKind::AssertionFailed)
    }
}

fn eval_with(node: &ast::With, env: &Rc<Env>) -> EvalResult<Value> {
    let namespace = Value::Thunk(Thunk::new(node.namespace().unwrap(), env.clone()));
    let scope = Env::with_namespace(env, namespace);
    eval_expr(&node.body().unwrap(), &scope)
}

fn eval_apply(node: &ast::Apply, env: &Rc<Env>) -> EvalResult<Value> {
    let function = eval_expr(&node.lambda().unwrap(), env)?;
    let argument = Value::Thunk(Thunk::new(node.argument().unwrap(), env.clone()));
    call_function(&function, argument)
}

/// Applies a function value to one argument.
pub fn call_function(function: &Value, argument: Value) -> EvalResult<Value> {
    match function.force()? {
        Value::Closure(closure) => call_closure(&closure, argument),
        Value::Builtin(builtin) => builtin.apply(argument),
        other => Err(ErrorKind::TypeError {
            expected: "lambda",
            actual: other.type_of(),
        }),
    }
}

fn call_closure(closure: &Closure, argument: Value) -> EvalResult<Value> {
    let scope = Env::child(&closure.env);

    match closure.lambda.param().unwrap() {
        ast::Param::IdentParam(param) => {
            let name = param.ident().unwrap().ident_token().unwrap();
            scope.define(name.text(), argument);
        }
        ast::Param::Pattern(pattern) => {
            let attrs = argument.to_attrs()?;

            if let Some(bind) = pattern.pat_bind() {
                let name = bind.ident().unwrap().ident_token().unwrap();
                scope.define(name.text(), Value::Attrs(attrs.clone()));
            }

            let mut formals = BTreeSet::new();
            for entry in pattern.pat_entries() {
                let name = SmolStr::new(entry.ident().unwrap().ident_token().unwrap().text());
                formals.insert(name.clone());
                match attrs.select(&name) {
                    Some(value) => scope.define(name, value.clone()),
                    None => match entry.default() {
                        // Defaults may refer to the other parameters, so
                        // they close over the call scope.
                        Some(default) => {
                            let value = Value::Thunk(Thunk::new(default, scope.clone()));
                            scope.define(name, value);
                        }
                        None => return Err(ErrorKind::MissingArgument(name.to_string())),
                    },
                }
            }

            if pattern.ellipsis_token().is_none() {
                for name in attrs.keys() {
                    if !formals.contains(name) {
                        return Err(ErrorKind::UnexpectedArgument(name.to_string()));
                    }
                }
            }
        }
    }

    eval_expr(&closure.lambda.body().unwrap(), &scope)
}

/// Calls a set-pattern function with arguments drawn from `args`,
/// falling back to parameter defaults. Values that are not set-pattern
/// functions are returned unchanged, including plain lambdas.
pub fn auto_call(value: &Value, args: &BTreeMap<SmolStr, Value>) -> EvalResult<Value> {
    let closure = match value.force()? {
        Value::Closure(closure) => closure,
        other => return Ok(other),
    };

    let pattern = match closure.lambda.param().unwrap() {
        ast::Param::Pattern(pattern) => pattern,
        ast::Param::IdentParam(_) => return Ok(Value::Closure(closure)),
    };

    let mut call_args = BTreeMap::new();
    for entry in pattern.pat_entries() {
        let name = SmolStr::new(entry.ident().unwrap().ident_token().unwrap().text());
        match args.get(&name) {
            Some(value) => {
                call_args.insert(name, value.clone());
            }
            None if entry.default().is_some() => {}
            None => return Err(ErrorKind::MissingAutoArgument(name.to_string())),
        }
    }

    let attrs: NixAttrs = call_args.into_iter().collect();
    call_closure(&closure, Value::Attrs(Rc::new(attrs)))
}

/// Coerces a value to a string, accumulating the dependency context of
/// every string that contributes to the result. With `coerce_more`,
/// scalars and lists coerce too (the `toString` behaviour); without it
/// only strings, paths and sets with an `outPath` do.
pub fn coerce_to_string(
    value: &Value,
    context: &mut NixContext,
    coerce_more: bool,
) -> EvalResult<String> {
    match value.force()? {
        Value::String(s) => {
            context.mimic(&s);
            Ok(s.as_str().to_string())
        }
        Value::Path(p) => Ok(p.to_string_lossy().into_owned()),
        Value::Attrs(attrs) => match attrs.select("outPath") {
            Some(out) => coerce_to_string(out, context, coerce_more),
            None => Err(ErrorKind::TypeError {
                expected: "string",
                actual: "set",
            }),
        },
        Value::Null if coerce_more => Ok(String::new()),
        Value::Bool(b) if coerce_more => Ok(if b { "1".to_string() } else { String::new() }),
        Value::Integer(i) if coerce_more => Ok(i.to_string()),
        Value::Float(f) if coerce_more => Ok(f.to_string()),
        Value::List(items) if coerce_more => {
            let mut parts = Vec::with_capacity(items.len());
            for item in items.iter() {
                parts.push(coerce_to_string(item, context, true)?);
            }
            Ok(parts.join(" "))
        }
        other => Err(ErrorKind::TypeError {
            expected: "string",
            actual: other.type_of(),
        }),
    }
}

fn attr_name(attr: &ast::Attr, env: &Rc<Env>) -> EvalResult<SmolStr> {
    match attr {
        ast::Attr::Ident(ident) => Ok(SmolStr::new(ident.ident_token().unwrap().text())),
        ast::Attr::Str(s) => {
            let value = eval_str(s, env)?;
            Ok(SmolStr::new(value.to_str()?.as_str()))
        }
        ast::Attr::Dynamic(d) => {
            let value = eval_expr(&d.expr().unwrap(), env)?;
            Ok(SmolStr::new(value.to_str()?.as_str()))
        }
    }
}

fn static_attr_name(attr: &ast::Attr, scope: &'static str) -> EvalResult<SmolStr> {
    match attr {
        ast::Attr::Ident(ident) => Ok(SmolStr::new(ident.ident_token().unwrap().text())),
        ast::Attr::Str(s) => {
            let mut text = String::new();
            for part in s.normalized_parts() {
                match part {
                    ast::InterpolPart::Literal(lit) => text.push_str(&lit),
                    ast::InterpolPart::Interpolation(_) => {
                        return Err(ErrorKind::DynamicKeyInScope(scope))
                    }
                }
            }
            Ok(SmolStr::new(text))
        }
        ast::Attr::Dynamic(_) => Err(ErrorKind::DynamicKeyInScope(scope)),
    }
}

fn insert_unique(
    map: &mut BTreeMap<SmolStr, Value>,
    name: SmolStr,
    value: Value,
) -> EvalResult<()> {
    match map.entry(name) {
        std::collections::btree_map::Entry::Occupied(entry) => {
            Err(ErrorKind::DuplicateAttribute(entry.key().to_string()))
        }
        std::collections::btree_map::Entry::Vacant(slot) => {
            slot.insert(value);
            Ok(())
        }
    }
}

/// Inserts a dotted binding like `a.b.c = …`, creating intermediate
/// sets and merging with sets created by sibling bindings.
fn insert_nested(
    map: &mut BTreeMap<SmolStr, Value>,
    path: &[SmolStr],
    value: Value,
) -> EvalResult<()> {
    let (key, rest) = path.split_first().expect("attribute paths are never empty");
    if rest.is_empty() {
        return insert_unique(map, key.clone(), value);
    }

    let slot = map
        .entry(key.clone())
        .or_insert_with(|| Value::Attrs(Rc::new(NixAttrs::default())));
    match slot {
        Value::Attrs(attrs) => insert_nested(&mut Rc::make_mut(attrs).0, rest, value),
        _ => Err(ErrorKind::DuplicateAttribute(key.to_string())),
    }
}
