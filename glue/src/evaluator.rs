//! The capability implementation that lets job discovery drive the
//! expression evaluator.

use std::collections::BTreeMap;
use std::rc::Rc;

use hydra_jobs::{ContextMarker, ValueKind};
use jobset_eval::{NixAttrs, NixContext, NixContextElement, Value};
use smol_str::SmolStr;

use crate::errors::eval_error;

/// Adapts the evaluator to the discovery traits. Carries the default
/// bindings used to auto-call top-level functions.
#[derive(Default)]
pub struct JobsetEvaluator {
    auto_args: BTreeMap<SmolStr, Value>,
}

impl JobsetEvaluator {
    pub fn new() -> Self {
        JobsetEvaluator::default()
    }

    pub fn with_auto_args(auto_args: BTreeMap<SmolStr, Value>) -> Self {
        JobsetEvaluator { auto_args }
    }
}

impl hydra_jobs::Evaluator for JobsetEvaluator {
    type Value = Value;
    type Job = DrvJob;

    fn check_interrupt(&self) -> hydra_jobs::Result<()> {
        jobset_eval::check_interrupt().map_err(eval_error)
    }

    fn auto_call(&self, value: &Value) -> hydra_jobs::Result<Value> {
        jobset_eval::auto_call(value, &self.auto_args).map_err(eval_error)
    }

    fn force(&self, value: &Value) -> hydra_jobs::Result<ValueKind> {
        Ok(match value.force().map_err(eval_error)? {
            Value::Attrs(_) => ValueKind::AttrSet,
            Value::List(_) => ValueKind::List,
            Value::String(_) => ValueKind::String,
            Value::Integer(_) => ValueKind::Integer,
            Value::Bool(_) => ValueKind::Bool,
            Value::Null => ValueKind::Null,
            _ => ValueKind::Other,
        })
    }

    fn type_name(&self, value: &Value) -> &'static str {
        match value.force() {
            Ok(forced) => forced.type_of(),
            Err(_) => "error",
        }
    }

    fn as_job(&self, value: &Value) -> hydra_jobs::Result<Option<DrvJob>> {
        let attrs = match value.force().map_err(eval_error)? {
            Value::Attrs(attrs) => attrs,
            _ => return Ok(None),
        };

        match attrs.select("type") {
            Some(marker) => match marker.force().map_err(eval_error)? {
                Value::String(s) if s.as_str() == "derivation" => Ok(Some(DrvJob(attrs))),
                _ => Ok(None),
            },
            None => Ok(None),
        }
    }

    fn attrs(&self, value: &Value) -> hydra_jobs::Result<Vec<(String, Value)>> {
        let attrs = value.to_attrs().map_err(eval_error)?;
        Ok(attrs
            .iter()
            .map(|(name, member)| (name.to_string(), member.clone()))
            .collect())
    }

    fn list(&self, value: &Value) -> hydra_jobs::Result<Vec<Value>> {
        let list = value.to_list().map_err(eval_error)?;
        Ok(list.iter().cloned().collect())
    }

    fn lookup(&self, value: &Value, name: &str) -> hydra_jobs::Result<Option<Value>> {
        let attrs = value.to_attrs().map_err(eval_error)?;
        Ok(attrs.select(name).cloned())
    }

    fn force_string(&self, value: &Value) -> hydra_jobs::Result<String> {
        value
            .to_str()
            .map(|s| s.as_str().to_string())
            .map_err(eval_error)
    }

    fn force_bool(&self, value: &Value) -> hydra_jobs::Result<bool> {
        value.as_bool().map_err(eval_error)
    }

    fn force_int(&self, value: &Value) -> hydra_jobs::Result<i64> {
        value.as_int().map_err(eval_error)
    }

    fn coerce_to_string(&self, value: &Value) -> hydra_jobs::Result<(String, Vec<ContextMarker>)> {
        // Lenient coercion: constituent lists and scalar markers must
        // flatten rather than fail.
        let mut context = NixContext::new();
        let text = jobset_eval::coerce_to_string(value, &mut context, true).map_err(eval_error)?;
        Ok((text, markers(&context)))
    }
}

fn markers(context: &NixContext) -> Vec<ContextMarker> {
    context
        .iter()
        .map(|element| match element {
            NixContextElement::Single { name, derivation } => ContextMarker::Output {
                output: name.clone(),
                drv_path: derivation.clone(),
            },
            NixContextElement::Derivation(path) => ContextMarker::Derivation(path.clone()),
            NixContextElement::Plain(path) => ContextMarker::Plain(path.clone()),
        })
        .collect()
}

/// A value already probed to look like a derivation.
pub struct DrvJob(Rc<NixAttrs>);

impl DrvJob {
    fn string_attr(&self, name: &str) -> hydra_jobs::Result<Option<String>> {
        match self.0.select(name) {
            Some(value) => value
                .to_str()
                .map(|s| Some(s.as_str().to_string()))
                .map_err(eval_error),
            None => Ok(None),
        }
    }
}

impl hydra_jobs::Job for DrvJob {
    type Value = Value;

    fn name(&self) -> hydra_jobs::Result<String> {
        self.string_attr("name")?
            .ok_or(hydra_jobs::Error::MissingAttribute("name"))
    }

    fn system(&self) -> hydra_jobs::Result<String> {
        Ok(self
            .string_attr("system")?
            .unwrap_or_else(|| "unknown".to_string()))
    }

    fn drv_path(&self) -> hydra_jobs::Result<String> {
        Ok(self.string_attr("drvPath")?.unwrap_or_default())
    }

    fn outputs(&self) -> hydra_jobs::Result<Vec<(String, String)>> {
        let Some(declared) = self.0.select("outputs") else {
            // Handcrafted derivation values may carry a bare outPath.
            let path = self.string_attr("outPath")?.unwrap_or_default();
            return Ok(vec![("out".to_string(), path)]);
        };

        let mut outputs = Vec::new();
        for name in declared.to_list().map_err(eval_error)?.iter() {
            let name = name.to_str().map_err(eval_error)?.as_str().to_string();
            let path = match self.0.select(&name) {
                Some(member) => match member.force().map_err(eval_error)? {
                    Value::Attrs(member) => match member.select("outPath") {
                        Some(path) => path.to_str().map_err(eval_error)?.as_str().to_string(),
                        None => String::new(),
                    },
                    _ => String::new(),
                },
                None => String::new(),
            };
            outputs.push((name, path));
        }
        Ok(outputs)
    }

    fn meta(&self, field: &str) -> hydra_jobs::Result<Option<Value>> {
        match self.0.select("meta") {
            Some(value) => match value.force().map_err(eval_error)? {
                Value::Attrs(meta) => Ok(meta.select(field).cloned()),
                _ => Ok(None),
            },
            None => Ok(None),
        }
    }
}
