//! The recursive core: depth-first traversal of the jobset tree.

use tracing::debug;

use crate::aggregate;
use crate::classify::{classify, Classification};
use crate::document::{JobDescriptor, ResultDocument};
use crate::errors::{Error, Result};
use crate::evaluator::{Evaluator, Job};
use crate::meta;
use crate::path::AttrPath;
use crate::roots::GcRootsDir;

/// Discovers all jobs reachable from `root`, starting at the empty
/// attribute path.
pub fn discover_jobs<E: Evaluator>(
    eval: &E,
    roots: &GcRootsDir,
    root: &E::Value,
) -> Result<ResultDocument> {
    Walker::new(eval, roots).discover(root)
}

/// Walks the attribute tree depth-first, recording one entry per
/// visited job path.
///
/// Errors are contained per subtree: a recoverable failure anywhere in
/// the handling of path `p` becomes an error entry at `p` and nothing
/// below `p` is visited, while siblings and ancestors are unaffected.
/// Fatal errors (interruption, I/O, evaluator internals) abort the
/// whole run.
pub struct Walker<'a, E: Evaluator> {
    eval: &'a E,
    roots: &'a GcRootsDir,
    doc: ResultDocument,
}

impl<'a, E: Evaluator> Walker<'a, E> {
    pub fn new(eval: &'a E, roots: &'a GcRootsDir) -> Self {
        Walker {
            eval,
            roots,
            doc: ResultDocument::new(),
        }
    }

    pub fn discover(mut self, root: &E::Value) -> Result<ResultDocument> {
        self.visit(&AttrPath::root(), root)?;
        Ok(self.doc)
    }

    fn visit(&mut self, path: &AttrPath, value: &E::Value) -> Result<()> {
        match self.visit_value(path, value) {
            Ok(()) => Ok(()),
            Err(err) if err.is_recoverable() => {
                self.doc.insert_error(path.clone(), err.to_string());
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    fn visit_value(&mut self, path: &AttrPath, value: &E::Value) -> Result<()> {
        debug!(path = %path, "visiting attribute path");
        self.eval.check_interrupt()?;

        let value = self.eval.auto_call(value)?;
        match classify(self.eval, &value)? {
            Classification::Job(job) => self.visit_job(path, &value, &job),
            Classification::Namespace(members) => {
                for (name, member) in members {
                    self.visit(&path.child(&name), &member)?;
                }
                Ok(())
            }
            Classification::Skip => Ok(()),
        }
    }

    /// Resolves a derivation into a complete descriptor, registers its
    /// recipe as a GC root, and records it. The descriptor is built in
    /// full before anything is written, so a failure during extraction
    /// leaves no partial entry behind.
    fn visit_job(&mut self, path: &AttrPath, value: &E::Value, job: &E::Job) -> Result<()> {
        let system = job.system()?;
        if system == "unknown" {
            return Err(Error::MissingAttribute("system"));
        }

        let drv_path = job.drv_path()?;
        let constituents = self.aggregate_constituents(value)?;

        let descriptor = JobDescriptor {
            nix_name: job.name()?,
            system,
            drv_path: drv_path.clone(),
            description: meta::meta_string(self.eval, job, "description")?,
            license: meta::meta_strings(self.eval, job, "license")?,
            homepage: meta::meta_string(self.eval, job, "homepage")?,
            maintainers: meta::meta_strings(self.eval, job, "maintainers")?,
            scheduling_priority: meta::meta_int(self.eval, job, "schedulingPriority", 100)?,
            timeout: meta::meta_int(self.eval, job, "timeout", 36000)?,
            max_silent: meta::meta_int(self.eval, job, "maxSilent", 7200)?,
            is_channel: meta::meta_bool(self.eval, job, "isHydraChannel", false)?,
            constituents,
            outputs: job.outputs()?.into_iter().collect(),
        };

        self.roots.register(&drv_path)?;
        self.doc.insert_job(path.clone(), descriptor);
        Ok(())
    }

    /// Returns the space-joined constituent recipe paths if the value
    /// is marked as an aggregate, `None` otherwise.
    fn aggregate_constituents(&self, value: &E::Value) -> Result<Option<String>> {
        let Some(marker) = self.eval.lookup(value, "_hydraAggregate")? else {
            return Ok(None);
        };
        if !self.eval.force_bool(&marker)? {
            return Ok(None);
        }

        let Some(constituents) = self.eval.lookup(value, "constituents")? else {
            return Err(Error::MissingAttribute("constituents"));
        };
        let (_, markers) = self.eval.coerce_to_string(&constituents)?;
        Ok(Some(aggregate::constituents(&markers)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Entry;
    use crate::evaluator::ContextMarker;
    use crate::test_utils::{drv, drv_with_meta, MockEval, TestValue};
    use pretty_assertions::assert_eq;

    fn attrs(entries: Vec<(&str, TestValue)>) -> TestValue {
        TestValue::Attrs(
            entries
                .into_iter()
                .map(|(n, v)| (n.to_string(), v))
                .collect(),
        )
    }

    fn discover(root: TestValue) -> ResultDocument {
        discover_jobs(&MockEval::new(), &GcRootsDir::disabled(), &root).unwrap()
    }

    fn job_entry<'a>(doc: &'a ResultDocument, path: &str) -> &'a JobDescriptor {
        match doc.get(&AttrPath::from(path)) {
            Some(Entry::Job(job)) => job,
            other => panic!("expected a job at '{path}', got {other:?}"),
        }
    }

    fn error_entry<'a>(doc: &'a ResultDocument, path: &str) -> &'a str {
        match doc.get(&AttrPath::from(path)) {
            Some(Entry::Error { error }) => error,
            other => panic!("expected an error at '{path}', got {other:?}"),
        }
    }

    #[test]
    fn single_job_at_root_child() {
        let doc = discover(attrs(vec![(
            "a",
            TestValue::Drv(Box::new(drv("hello", "x86_64-linux"))),
        )]));
        assert_eq!(doc.len(), 1);
        let job = job_entry(&doc, "a");
        assert_eq!(job.nix_name, "hello");
        assert_eq!(job.system, "x86_64-linux");
        assert_eq!(job.scheduling_priority, 100);
        assert_eq!(job.timeout, 36000);
        assert_eq!(job.max_silent, 7200);
        assert!(!job.is_channel);
        assert_eq!(job.constituents, None);
    }

    #[test]
    fn broken_siblings_do_not_abort_the_walk() {
        // N members, M failing: every child path gets exactly one
        // entry except nulls, and failures stay scoped.
        let doc = discover(attrs(vec![
            ("bad", TestValue::Throw("kaboom".into())),
            ("good", TestValue::Drv(Box::new(drv("ok", "x86_64-linux")))),
            ("nothing", TestValue::Null),
            ("scalar", TestValue::Int(7)),
        ]));

        assert_eq!(doc.len(), 3);
        assert_eq!(error_entry(&doc, "bad"), "kaboom");
        assert_eq!(job_entry(&doc, "good").nix_name, "ok");
        assert_eq!(error_entry(&doc, "scalar"), "unsupported value: int");
        assert!(doc.get(&AttrPath::from("nothing")).is_none());
    }

    #[test]
    fn nested_namespaces_emit_only_leaf_paths() {
        let doc = discover(attrs(vec![(
            "a",
            attrs(vec![(
                "b",
                attrs(vec![("c", TestValue::Drv(Box::new(drv("deep", "x86_64-linux"))))]),
            )]),
        )]));

        assert_eq!(doc.len(), 1);
        assert_eq!(job_entry(&doc, "a.b.c").nix_name, "deep");
        assert!(doc.get(&AttrPath::from("a")).is_none());
        assert!(doc.get(&AttrPath::from("a.b")).is_none());
    }

    #[test]
    fn failure_inside_namespace_is_scoped_to_its_path() {
        let doc = discover(attrs(vec![
            (
                "ns",
                attrs(vec![
                    ("bad", TestValue::Throw("inner".into())),
                    ("ok", TestValue::Drv(Box::new(drv("fine", "x86_64-linux")))),
                ]),
            ),
            ("top", TestValue::Drv(Box::new(drv("also", "x86_64-linux")))),
        ]));

        assert_eq!(error_entry(&doc, "ns.bad"), "inner");
        assert_eq!(job_entry(&doc, "ns.ok").nix_name, "fine");
        assert_eq!(job_entry(&doc, "top").nix_name, "also");
    }

    #[test]
    fn unknown_system_yields_an_error_entry() {
        let doc = discover(attrs(vec![(
            "b",
            TestValue::Drv(Box::new(drv("nosys", "unknown"))),
        )]));
        assert_eq!(
            error_entry(&doc, "b"),
            "derivation must have a 'system' attribute"
        );
    }

    #[test]
    fn failing_metadata_never_leaks_partial_fields() {
        let broken = drv_with_meta(
            "partial",
            "x86_64-linux",
            vec![("license", TestValue::Throw("bad meta".into()))],
        );
        let doc = discover(attrs(vec![("p", TestValue::Drv(Box::new(broken)))]));

        assert_eq!(doc.len(), 1);
        assert_eq!(error_entry(&doc, "p"), "bad meta");
    }

    #[test]
    fn auto_callable_roots_are_invoked() {
        let inner = attrs(vec![(
            "a",
            TestValue::Drv(Box::new(drv("called", "x86_64-linux"))),
        )]);
        let doc = discover(TestValue::Lambda(Box::new(inner)));
        assert_eq!(job_entry(&doc, "a").nix_name, "called");
    }

    #[test]
    fn aggregates_resolve_constituents() {
        let mut agg = drv("agg", "x86_64-linux");
        agg.attrs = vec![
            ("_hydraAggregate".to_string(), TestValue::Bool(true)),
            (
                "constituents".to_string(),
                TestValue::ContextStr(
                    "ignored".to_string(),
                    vec![
                        ContextMarker::Output {
                            output: "out".to_string(),
                            drv_path: "/nix/store/bbbb-y.drv".to_string(),
                        },
                        ContextMarker::Output {
                            output: "out".to_string(),
                            drv_path: "/nix/store/aaaa-x.drv".to_string(),
                        },
                        ContextMarker::Output {
                            output: "lib".to_string(),
                            drv_path: "/nix/store/aaaa-x.drv".to_string(),
                        },
                    ],
                ),
            ),
        ];
        let doc = discover(attrs(vec![("agg", TestValue::Drv(Box::new(agg)))]));
        assert_eq!(
            job_entry(&doc, "agg").constituents.as_deref(),
            Some("/nix/store/aaaa-x.drv /nix/store/bbbb-y.drv")
        );
    }

    #[test]
    fn aggregate_without_constituents_is_an_error() {
        let mut agg = drv("agg", "x86_64-linux");
        agg.attrs = vec![("_hydraAggregate".to_string(), TestValue::Bool(true))];
        let doc = discover(attrs(vec![("agg", TestValue::Drv(Box::new(agg)))]));
        assert_eq!(
            error_entry(&doc, "agg"),
            "derivation must have a 'constituents' attribute"
        );
    }

    #[test]
    fn false_aggregate_marker_skips_resolution() {
        let mut agg = drv("agg", "x86_64-linux");
        agg.attrs = vec![("_hydraAggregate".to_string(), TestValue::Bool(false))];
        let doc = discover(attrs(vec![("agg", TestValue::Drv(Box::new(agg)))]));
        assert_eq!(job_entry(&doc, "agg").constituents, None);
    }

    #[test]
    fn interruption_aborts_the_whole_run() {
        let eval = MockEval::interrupt_after(2);
        let root = attrs(vec![
            ("a", TestValue::Drv(Box::new(drv("a", "x86_64-linux")))),
            ("b", TestValue::Drv(Box::new(drv("b", "x86_64-linux")))),
            ("c", TestValue::Drv(Box::new(drv("c", "x86_64-linux")))),
        ]);
        let err = discover_jobs(&eval, &GcRootsDir::disabled(), &root).unwrap_err();
        assert!(matches!(err, Error::Interrupted));
    }

    #[test]
    fn registers_roots_for_discovered_jobs() {
        let dir = tempfile::tempdir().unwrap();
        let roots = GcRootsDir::new(Some(dir.path().to_owned()));
        let mut a = drv("a", "x86_64-linux");
        a.drv_path = "/nix/store/aaaa-a.drv".to_string();
        let mut b = drv("b", "x86_64-linux");
        b.drv_path = "/nix/store/aaaa-a.drv".to_string(); // shared recipe

        let root = attrs(vec![
            ("a", TestValue::Drv(Box::new(a))),
            ("b", TestValue::Drv(Box::new(b))),
        ]);
        let doc = discover_jobs(&MockEval::new(), &roots, &root).unwrap();
        assert_eq!(doc.job_count(), 2);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
