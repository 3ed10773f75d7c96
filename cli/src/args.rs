use std::collections::BTreeMap;
use std::path::PathBuf;
use std::rc::Rc;

use clap::Parser;
use smol_str::SmolStr;
use tracing::Level;

use jobset_eval::{Env, EvalResult, Value};

/// Evaluates a jobset expression and emits every job it defines as a
/// JSON document on standard output.
#[derive(Parser, Clone)]
pub struct Args {
    /// The file containing the jobset expression.
    pub release_expr: PathBuf,

    /// Directory in which a GC root is registered for every discovered
    /// build recipe. Without it, recipes may be garbage collected
    /// before they are built.
    #[arg(long)]
    pub gc_roots_dir: Option<PathBuf>,

    /// Evaluate without registering GC roots.
    #[arg(long)]
    pub dry_run: bool,

    /// Pass an evaluated expression as a top-level function argument.
    #[arg(long = "arg", num_args = 2, value_names = ["NAME", "EXPR"], action = clap::ArgAction::Append)]
    pub arg: Vec<String>,

    /// Pass a literal string as a top-level function argument.
    #[arg(long = "argstr", num_args = 2, value_names = ["NAME", "STRING"], action = clap::ArgAction::Append)]
    pub argstr: Vec<String>,

    /// A global log level to use.
    #[arg(long, env = "HYDRA_EVAL_LOG_LEVEL", default_value = "INFO")]
    pub log_level: Level,
}

impl Args {
    /// The default bindings used to auto-call a top-level function.
    /// `--arg` values are evaluated lazily against the given
    /// environment; `--arg` wins over `--argstr` for the same name.
    pub fn auto_args(&self, env: &Rc<Env>) -> EvalResult<BTreeMap<SmolStr, Value>> {
        let mut bindings = BTreeMap::new();
        for pair in self.argstr.chunks_exact(2) {
            bindings.insert(SmolStr::new(&pair[0]), Value::from(pair[1].as_str()));
        }
        for pair in self.arg.chunks_exact(2) {
            let value = jobset_eval::evaluate(&pair[1], None, env)?;
            bindings.insert(SmolStr::new(&pair[0]), value);
        }
        Ok(bindings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn positional_expression_and_defaults() {
        let args = parse(&["hydra-eval-jobs", "release.nix"]);
        assert_eq!(args.release_expr, PathBuf::from("release.nix"));
        assert!(args.gc_roots_dir.is_none());
        assert!(!args.dry_run);
        assert_eq!(args.log_level, Level::INFO);
    }

    #[test]
    fn repeated_args_collect_in_pairs() {
        let args = parse(&[
            "hydra-eval-jobs",
            "--argstr",
            "system",
            "x86_64-linux",
            "--arg",
            "checkMeta",
            "true",
            "release.nix",
        ]);
        assert_eq!(args.argstr, vec!["system", "x86_64-linux"]);
        assert_eq!(args.arg, vec!["checkMeta", "true"]);
    }

    #[test]
    fn auto_args_evaluate_expressions() {
        let args = parse(&[
            "hydra-eval-jobs",
            "--argstr",
            "system",
            "x86_64-linux",
            "--arg",
            "jobs",
            "2 + 2",
            "release.nix",
        ]);
        let env = jobset_eval::builtins::base_environment();
        let bindings = args.auto_args(&env).unwrap();

        assert_eq!(
            bindings[&SmolStr::new("system")]
                .to_str()
                .unwrap()
                .as_str(),
            "x86_64-linux"
        );
        assert_eq!(bindings[&SmolStr::new("jobs")].as_int().unwrap(), 4);
    }

    #[test]
    fn malformed_arg_expressions_fail() {
        let args = parse(&["hydra-eval-jobs", "--arg", "x", "{ oops", "release.nix"]);
        let env = jobset_eval::builtins::base_environment();
        assert!(args.auto_args(&env).is_err());
    }
}
