use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};

use hydra_glue::JobsetEvaluator;
use hydra_jobs::{discover_jobs, GcRootsDir, ResultDocument};

mod args;

use args::Args;

fn main() -> ExitCode {
    // The inherited expression search path must not influence
    // evaluation; jobsets are self-contained.
    std::env::remove_var("NIX_PATH");

    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .compact()
        .with_max_level(args.log_level)
        .init();

    match run(&args) {
        Ok(doc) => {
            if std::env::var("HYDRA_SHOW_STATS").as_deref() == Ok("1") {
                info!(
                    jobs = doc.job_count(),
                    errors = doc.error_count(),
                    "evaluation finished"
                );
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<ResultDocument, Box<dyn std::error::Error>> {
    let roots = if args.dry_run {
        GcRootsDir::disabled()
    } else {
        GcRootsDir::new(args.gc_roots_dir.clone())
    };
    if !roots.is_enabled() {
        warn!("no --gc-roots-dir specified, discovered recipes may be garbage collected");
    }

    let env = hydra_glue::jobset_environment();
    let auto_args = args.auto_args(&env)?;
    let root = jobset_eval::evaluate_file(&args.release_expr, &env)?;

    let eval = JobsetEvaluator::with_auto_args(auto_args);
    let doc = discover_jobs(&eval, &roots, &root)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    doc.write_json(&mut out)?;
    out.flush()?;

    Ok(doc)
}
