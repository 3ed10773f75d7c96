//! The `derivation` builtin.
//!
//! Instantiation is strict: every attribute is coerced to a string so
//! the recipe's fingerprint covers the whole closure of its inputs,
//! mirroring how real instantiation serialises the environment. The
//! resulting value is the input set extended with the derivation
//! markers: `type`, `drvPath`, the output list, one member per output
//! and the default output's `outPath`.
//!
//! `meta` is exempt from the strict pass. It never influences the
//! recipe and may hold arbitrarily shaped values that the metadata
//! accessors pick apart later.

use std::collections::{BTreeMap, BTreeSet};

use jobset_eval::{
    coerce_to_string, Builtin, EvalResult, NixAttrs, NixContext, NixContextElement, NixList,
    NixString, Value,
};
use smol_str::SmolStr;

use crate::errors::DerivationError;
use crate::store_path;

pub fn derivation_builtin() -> Builtin {
    Builtin::new("derivation", 1, derivation)
}

fn derivation(args: Vec<Value>) -> EvalResult<Value> {
    let attrs = args[0].to_attrs()?;

    let name = required_string(&attrs, "name")?;
    validate_name(&name)?;
    let system = required_string(&attrs, "system")?;
    let outputs = output_names(&attrs)?;

    let mut context = NixContext::new();
    let mut fingerprint = format!("{name};{system}");
    for (key, value) in attrs.iter() {
        if key == "meta" {
            continue;
        }
        let text = coerce_to_string(value, &mut context, true)?;
        fingerprint.push(';');
        fingerprint.push_str(key.as_str());
        fingerprint.push('=');
        fingerprint.push_str(&text);
    }

    let drv = store_path::drv_path(&name, &fingerprint);
    let mut drv_context = NixContext::new();
    drv_context.append(NixContextElement::Derivation(drv.clone()));
    let drv_value = Value::String(NixString::new(drv.clone(), drv_context));

    let mut result: BTreeMap<SmolStr, Value> =
        attrs.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    result.insert("type".into(), Value::from("derivation"));
    result.insert("name".into(), Value::from(name.as_str()));
    result.insert("system".into(), Value::from(system.as_str()));
    result.insert("drvPath".into(), drv_value.clone());
    result.insert(
        "outputs".into(),
        Value::List(
            outputs
                .iter()
                .map(|output| Value::from(output.as_str()))
                .collect::<NixList>(),
        ),
    );

    let mut default_out = None;
    for output in &outputs {
        let out_path = store_path::output_path(&name, output, &fingerprint);
        let mut out_context = NixContext::new();
        out_context.append(NixContextElement::Single {
            name: output.clone(),
            derivation: drv.clone(),
        });
        let out_value = Value::String(NixString::new(out_path, out_context));
        if default_out.is_none() {
            default_out = Some(out_value.clone());
        }

        let mut member = BTreeMap::new();
        member.insert(SmolStr::new("type"), Value::from("derivation"));
        member.insert(SmolStr::new("name"), Value::from(name.as_str()));
        member.insert(SmolStr::new("drvPath"), drv_value.clone());
        member.insert(SmolStr::new("outputName"), Value::from(output.as_str()));
        member.insert(SmolStr::new("outPath"), out_value.clone());

        result.insert(
            SmolStr::new(output),
            Value::from(member.into_iter().collect::<NixAttrs>()),
        );
    }

    // The first declared output is the default one.
    if let Some(out_value) = default_out {
        result.insert("outPath".into(), out_value);
        result.insert("outputName".into(), Value::from(outputs[0].as_str()));
    }

    Ok(Value::from(result.into_iter().collect::<NixAttrs>()))
}

fn required_string(attrs: &NixAttrs, attribute: &'static str) -> EvalResult<String> {
    match attrs.select(attribute) {
        Some(value) => Ok(value.to_str()?.as_str().to_string()),
        None => Err(DerivationError::MissingAttribute(attribute).into()),
    }
}

fn validate_name(name: &str) -> EvalResult<()> {
    if name.is_empty() || name.starts_with('.') || name.contains('/') {
        return Err(DerivationError::InvalidName(name.to_string()).into());
    }
    Ok(())
}

fn output_names(attrs: &NixAttrs) -> EvalResult<Vec<String>> {
    let Some(value) = attrs.select("outputs") else {
        return Ok(vec!["out".to_string()]);
    };

    let mut names = Vec::new();
    let mut seen = BTreeSet::new();
    for item in value.to_list()?.iter() {
        let name = item.to_str()?.as_str().to_string();
        if name.is_empty() || name == "drv" {
            return Err(DerivationError::InvalidOutput(name).into());
        }
        if !seen.insert(name.clone()) {
            return Err(DerivationError::DuplicateOutput(name).into());
        }
        names.push(name);
    }

    if names.is_empty() {
        return Err(DerivationError::NoOutputs.into());
    }
    Ok(names)
}
