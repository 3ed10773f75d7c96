//! A trivial in-memory evaluator used to drive the walker in tests.

use std::cell::Cell;

use crate::errors::{Error, Result};
use crate::evaluator::{ContextMarker, Evaluator, Job, ValueKind};

#[derive(Clone, Debug)]
pub enum TestValue {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
    /// A string carrying dependency markers.
    ContextStr(String, Vec<ContextMarker>),
    List(Vec<TestValue>),
    Attrs(Vec<(String, TestValue)>),
    Drv(Box<TestDrv>),
    /// Auto-calling yields the wrapped value.
    Lambda(Box<TestValue>),
    /// Fails with a recoverable error when forced.
    Throw(String),
}

#[derive(Clone, Debug, Default)]
pub struct TestDrv {
    pub name: String,
    pub system: String,
    pub drv_path: String,
    pub outputs: Vec<(String, String)>,
    pub meta: Vec<(String, TestValue)>,
    /// Extra members visible on the derivation's attribute set, e.g.
    /// the aggregate marker.
    pub attrs: Vec<(String, TestValue)>,
}

pub fn drv(name: &str, system: &str) -> TestDrv {
    TestDrv {
        name: name.to_string(),
        system: system.to_string(),
        drv_path: format!("/nix/store/0000-{name}.drv"),
        outputs: vec![("out".to_string(), format!("/nix/store/1111-{name}"))],
        ..Default::default()
    }
}

pub fn drv_with_meta(name: &str, system: &str, meta: Vec<(&str, TestValue)>) -> TestDrv {
    TestDrv {
        meta: meta.into_iter().map(|(n, v)| (n.to_string(), v)).collect(),
        ..drv(name, system)
    }
}

pub struct MockEval {
    /// Remaining interrupt checks before the run is considered
    /// interrupted; `None` disables interruption.
    fuse: Cell<Option<u32>>,
}

impl MockEval {
    pub fn new() -> Self {
        MockEval {
            fuse: Cell::new(None),
        }
    }

    pub fn interrupt_after(checks: u32) -> Self {
        MockEval {
            fuse: Cell::new(Some(checks)),
        }
    }

    fn forced<'v>(&self, value: &'v TestValue) -> Result<&'v TestValue> {
        match value {
            TestValue::Throw(msg) => Err(Error::Evaluation(msg.clone())),
            other => Ok(other),
        }
    }
}

impl Evaluator for MockEval {
    type Value = TestValue;
    type Job = TestDrv;

    fn check_interrupt(&self) -> Result<()> {
        match self.fuse.get() {
            Some(0) => Err(Error::Interrupted),
            Some(n) => {
                self.fuse.set(Some(n - 1));
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn auto_call(&self, value: &TestValue) -> Result<TestValue> {
        match value {
            TestValue::Lambda(inner) => Ok((**inner).clone()),
            other => Ok(other.clone()),
        }
    }

    fn force(&self, value: &TestValue) -> Result<ValueKind> {
        Ok(match self.forced(value)? {
            TestValue::Null => ValueKind::Null,
            TestValue::Bool(_) => ValueKind::Bool,
            TestValue::Int(_) => ValueKind::Integer,
            TestValue::Str(_) | TestValue::ContextStr(..) => ValueKind::String,
            TestValue::List(_) => ValueKind::List,
            TestValue::Attrs(_) | TestValue::Drv(_) => ValueKind::AttrSet,
            TestValue::Lambda(_) => ValueKind::Other,
            TestValue::Throw(_) => unreachable!(),
        })
    }

    fn type_name(&self, value: &TestValue) -> &'static str {
        match value {
            TestValue::Null => "null",
            TestValue::Bool(_) => "bool",
            TestValue::Int(_) => "int",
            TestValue::Str(_) | TestValue::ContextStr(..) => "string",
            TestValue::List(_) => "list",
            TestValue::Attrs(_) | TestValue::Drv(_) => "set",
            TestValue::Lambda(_) => "lambda",
            TestValue::Throw(_) => "error",
        }
    }

    fn as_job(&self, value: &TestValue) -> Result<Option<TestDrv>> {
        match self.forced(value)? {
            TestValue::Drv(drv) => Ok(Some((**drv).clone())),
            _ => Ok(None),
        }
    }

    fn attrs(&self, value: &TestValue) -> Result<Vec<(String, TestValue)>> {
        match self.forced(value)? {
            TestValue::Attrs(entries) => Ok(entries.clone()),
            other => Err(Error::Evaluation(format!(
                "value is a {} while a set was expected",
                self.type_name(other)
            ))),
        }
    }

    fn list(&self, value: &TestValue) -> Result<Vec<TestValue>> {
        match self.forced(value)? {
            TestValue::List(items) => Ok(items.clone()),
            other => Err(Error::Evaluation(format!(
                "value is a {} while a list was expected",
                self.type_name(other)
            ))),
        }
    }

    fn lookup(&self, value: &TestValue, name: &str) -> Result<Option<TestValue>> {
        let entries = match self.forced(value)? {
            TestValue::Attrs(entries) => entries,
            TestValue::Drv(drv) => &drv.attrs,
            _ => return Ok(None),
        };
        Ok(entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone()))
    }

    fn force_string(&self, value: &TestValue) -> Result<String> {
        match self.forced(value)? {
            TestValue::Str(s) | TestValue::ContextStr(s, _) => Ok(s.clone()),
            other => Err(Error::Evaluation(format!(
                "value is a {} while a string was expected",
                self.type_name(other)
            ))),
        }
    }

    fn force_bool(&self, value: &TestValue) -> Result<bool> {
        match self.forced(value)? {
            TestValue::Bool(b) => Ok(*b),
            other => Err(Error::Evaluation(format!(
                "value is a {} while a bool was expected",
                self.type_name(other)
            ))),
        }
    }

    fn force_int(&self, value: &TestValue) -> Result<i64> {
        match self.forced(value)? {
            TestValue::Int(i) => Ok(*i),
            other => Err(Error::Evaluation(format!(
                "value is an {} while an int was expected",
                self.type_name(other)
            ))),
        }
    }

    fn coerce_to_string(&self, value: &TestValue) -> Result<(String, Vec<ContextMarker>)> {
        match self.forced(value)? {
            TestValue::Str(s) => Ok((s.clone(), Vec::new())),
            TestValue::ContextStr(s, markers) => Ok((s.clone(), markers.clone())),
            TestValue::List(items) => {
                let mut text = Vec::new();
                let mut markers = Vec::new();
                for item in items {
                    let (s, m) = self.coerce_to_string(item)?;
                    text.push(s);
                    markers.extend(m);
                }
                Ok((text.join(" "), markers))
            }
            other => Err(Error::Evaluation(format!(
                "cannot coerce a {} to a string",
                self.type_name(other)
            ))),
        }
    }
}

impl Job for TestDrv {
    type Value = TestValue;

    fn name(&self) -> Result<String> {
        Ok(self.name.clone())
    }

    fn system(&self) -> Result<String> {
        Ok(self.system.clone())
    }

    fn drv_path(&self) -> Result<String> {
        Ok(self.drv_path.clone())
    }

    fn outputs(&self) -> Result<Vec<(String, String)>> {
        Ok(self.outputs.clone())
    }

    fn meta(&self, field: &str) -> Result<Option<TestValue>> {
        Ok(self
            .meta
            .iter()
            .find(|(n, _)| n == field)
            .map(|(_, v)| v.clone()))
    }
}
