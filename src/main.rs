//! CLI entry point: parse arguments, run the pipeline once in the current
//! directory, report the outcome, and set the process exit code.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod error;
mod ops;
mod pipeline;

use cli::Args;
use pipeline::{Pipeline, PipelineOptions, RunOutcome};

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.quiet);

    let outcome = match run(&args) {
        Ok(outcome) => outcome,
        Err(err) => {
            error!("{err:#}");
            return ExitCode::FAILURE;
        }
    };

    report(&outcome);
    if outcome.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn run(args: &Args) -> Result<RunOutcome> {
    let root = std::env::current_dir().context("determine the working directory")?;
    let options = PipelineOptions {
        create_bibliography: args.bib,
        create_glossary: args.gls,
        verbose: args.verbose,
        quiet: args.quiet,
    };

    let mut pipeline = Pipeline::new(args.subject(), root, &options);
    debug!(
        subject = args.subject(),
        steps = pipeline.step_count(),
        "pipeline constructed"
    );
    Ok(pipeline.execute())
}

fn report(outcome: &RunOutcome) {
    match (&outcome.error, outcome.success) {
        (None, _) => info!("pipeline finished without incident"),
        (Some(err), true) => warn!(issue = err.message(), "pipeline finished with a minor issue"),
        (Some(err), false) => error!("pipeline failed: {err}"),
    }
}

fn init_logging(quiet: bool) {
    let default_level = if quiet { "warn" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
