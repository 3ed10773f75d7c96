//! Extraction of job metadata fields.
//!
//! Hydra metadata is loosely shaped: `description` is a plain string,
//! `license` may be a string, a list, or an attribute set with a
//! `shortName`, `maintainers` a list of such sets, and the scheduling
//! knobs are integers that people sometimes write as strings. The
//! accessors here tolerate all of that the way the original queryMeta
//! family did.

use crate::errors::Result;
use crate::evaluator::{Evaluator, Job, ValueKind};

/// Flattens a possibly nested metadata value into a `", "`-joined
/// string: string leaves count, lists flatten recursively in order, and
/// attribute sets contribute their forced `shortName` member (sets
/// without one contribute nothing).
pub fn meta_strings<E: Evaluator>(eval: &E, job: &E::Job, field: &str) -> Result<String> {
    let mut fragments = Vec::new();
    if let Some(value) = job.meta(field)? {
        flatten(eval, &value, &mut fragments)?;
    }
    Ok(fragments.join(", "))
}

fn flatten<E: Evaluator>(eval: &E, value: &E::Value, out: &mut Vec<String>) -> Result<()> {
    match eval.force(value)? {
        ValueKind::String => out.push(eval.force_string(value)?),
        ValueKind::List => {
            for item in eval.list(value)? {
                flatten(eval, &item, out)?;
            }
        }
        ValueKind::AttrSet => {
            if let Some(short) = eval.lookup(value, "shortName")? {
                out.push(eval.force_string(&short)?);
            }
        }
        _ => {}
    }
    Ok(())
}

/// A plain string field; anything that does not force to a string
/// yields the empty string.
pub fn meta_string<E: Evaluator>(eval: &E, job: &E::Job, field: &str) -> Result<String> {
    match job.meta(field)? {
        Some(value) if eval.force(&value)? == ValueKind::String => eval.force_string(&value),
        _ => Ok(String::new()),
    }
}

/// An integer field; accepts integers and strings that parse as one,
/// falling back to `default` otherwise.
pub fn meta_int<E: Evaluator>(eval: &E, job: &E::Job, field: &str, default: i64) -> Result<i64> {
    match job.meta(field)? {
        Some(value) => match eval.force(&value)? {
            ValueKind::Integer => eval.force_int(&value),
            ValueKind::String => Ok(eval
                .force_string(&value)?
                .parse()
                .unwrap_or(default)),
            _ => Ok(default),
        },
        None => Ok(default),
    }
}

/// A boolean field with a default.
pub fn meta_bool<E: Evaluator>(eval: &E, job: &E::Job, field: &str, default: bool) -> Result<bool> {
    match job.meta(field)? {
        Some(value) if eval.force(&value)? == ValueKind::Bool => eval.force_bool(&value),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{drv_with_meta, MockEval, TestValue};

    fn eval_and_job(meta: Vec<(&str, TestValue)>) -> (MockEval, crate::test_utils::TestDrv) {
        (MockEval::new(), drv_with_meta("pkg", "x86_64-linux", meta))
    }

    #[test]
    fn flattens_nested_lists_in_order() {
        let (eval, job) = eval_and_job(vec![(
            "license",
            TestValue::List(vec![
                TestValue::Str("a".into()),
                TestValue::Attrs(vec![("shortName".into(), TestValue::Str("b".into()))]),
                TestValue::List(vec![TestValue::Str("c".into())]),
            ]),
        )]);
        assert_eq!(meta_strings(&eval, &job, "license").unwrap(), "a, b, c");
    }

    #[test]
    fn absent_field_yields_empty_string() {
        let (eval, job) = eval_and_job(vec![]);
        assert_eq!(meta_strings(&eval, &job, "license").unwrap(), "");
        assert_eq!(meta_string(&eval, &job, "description").unwrap(), "");
    }

    #[test]
    fn attrset_without_short_name_is_ignored() {
        // A set lacking shortName contributes no fragment and no error,
        // even when it carries other members.
        let (eval, job) = eval_and_job(vec![(
            "maintainers",
            TestValue::List(vec![
                TestValue::Attrs(vec![("email".into(), TestValue::Str("x@y.z".into()))]),
                TestValue::Str("alice".into()),
            ]),
        )]);
        assert_eq!(meta_strings(&eval, &job, "maintainers").unwrap(), "alice");
    }

    #[test]
    fn scalar_leaves_of_other_kinds_are_skipped() {
        let (eval, job) = eval_and_job(vec![(
            "license",
            TestValue::List(vec![TestValue::Int(1), TestValue::Str("mit".into())]),
        )]);
        assert_eq!(meta_strings(&eval, &job, "license").unwrap(), "mit");
    }

    #[test]
    fn forcing_failures_propagate_as_extraction_failures() {
        let (eval, job) = eval_and_job(vec![(
            "license",
            TestValue::List(vec![TestValue::Throw("bad license".into())]),
        )]);
        assert!(meta_strings(&eval, &job, "license").is_err());
    }

    #[test]
    fn meta_string_ignores_non_strings() {
        let (eval, job) = eval_and_job(vec![("description", TestValue::Int(4))]);
        assert_eq!(meta_string(&eval, &job, "description").unwrap(), "");
    }

    #[test]
    fn meta_int_accepts_integers_and_numeric_strings() {
        let (eval, job) = eval_and_job(vec![
            ("timeout", TestValue::Int(600)),
            ("schedulingPriority", TestValue::Str("50".into())),
            ("maxSilent", TestValue::Str("not a number".into())),
        ]);
        assert_eq!(meta_int(&eval, &job, "timeout", 36000).unwrap(), 600);
        assert_eq!(meta_int(&eval, &job, "schedulingPriority", 100).unwrap(), 50);
        assert_eq!(meta_int(&eval, &job, "maxSilent", 7200).unwrap(), 7200);
        assert_eq!(meta_int(&eval, &job, "absent", 100).unwrap(), 100);
    }

    #[test]
    fn meta_bool_defaults_unless_boolean() {
        let (eval, job) = eval_and_job(vec![
            ("isHydraChannel", TestValue::Bool(true)),
            ("odd", TestValue::Str("true".into())),
        ]);
        assert!(meta_bool(&eval, &job, "isHydraChannel", false).unwrap());
        assert!(!meta_bool(&eval, &job, "odd", false).unwrap());
        assert!(meta_bool(&eval, &job, "absent", true).unwrap());
    }
}
