//! Ordered-step runner and the severity policy deciding continuation.
//!
//! The pipeline owns a fixed sequence of operations decided at construction
//! time, executes them strictly in order, and classifies every reported error
//! by severity: low keeps the run healthy, high degrades it, critical aborts
//! it on the spot.

use std::path::PathBuf;

use tracing::{debug, error, warn};

use crate::config::RunConfig;
use crate::error::{PipelineError, Severity};
use crate::ops::{
    BibliographyStep, CleanStep, CompileStep, CopyStep, GlossaryStep, StripDraftStep,
};

/// Result of one step invocation.
///
/// `Ok(())` means the step finished without incident. A failed step reports
/// through `Err`; the runner decides from the error's severity whether the
/// run is still a success. Steps must never panic for expected failure
/// conditions such as a missing input file.
pub type StepResult = Result<(), PipelineError>;

/// One unit of pipeline work over the shared working directory.
///
/// The only side channel an operation may use is writing
/// [`RunConfig::new_name`] to signal that the working file was renamed.
pub trait Operation {
    fn name(&self) -> &'static str;
    fn run(&self, subject: &str, config: &mut RunConfig) -> StepResult;
}

/// Flags selecting the optional steps and tool verbosity for one run.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineOptions {
    pub create_bibliography: bool,
    pub create_glossary: bool,
    pub verbose: bool,
    pub quiet: bool,
}

/// Aggregate result of a full run.
///
/// A successful run can still carry a low-severity error worth reporting, so
/// `success` and `error` are independent.
#[derive(Debug)]
pub struct RunOutcome {
    pub success: bool,
    pub error: Option<PipelineError>,
}

/// Drives one document through the toolchain.
///
/// The step list is immutable after construction; each run request should
/// build a fresh pipeline so no renamed working name leaks between runs.
pub struct Pipeline {
    subject: String,
    config: RunConfig,
    steps: Vec<Box<dyn Operation>>,
}

impl Pipeline {
    /// Build the step sequence for one run. No I/O happens here.
    pub fn new(
        subject: impl Into<String>,
        root: impl Into<PathBuf>,
        options: &PipelineOptions,
    ) -> Self {
        let mut steps: Vec<Box<dyn Operation>> = vec![
            Box::new(CopyStep),
            Box::new(StripDraftStep),
            Box::new(CompileStep),
        ];

        if options.create_bibliography {
            steps.push(Box::new(BibliographyStep));
        }
        if options.create_glossary {
            steps.push(Box::new(GlossaryStep));
        }

        // Second compile pass resolves bibliography and glossary
        // cross-references.
        steps.push(Box::new(CompileStep));
        steps.push(Box::new(CleanStep));

        Self {
            subject: subject.into(),
            config: RunConfig::new(root, options.verbose, options.quiet),
            steps,
        }
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Execute every step in order and aggregate the outcome.
    ///
    /// After each step the runner adopts `config.new_name` (when set) as the
    /// subject for all later steps; its absence is normal. Errors are
    /// classified by severity: low is recorded and the run stays successful,
    /// high is recorded and flips the run to failed, critical returns
    /// immediately and discards anything recorded before it. When two
    /// recorded errors tie on severity the earlier one is kept.
    pub fn execute(&mut self) -> RunOutcome {
        let mut success = true;
        let mut aggregate: Option<PipelineError> = None;
        let mut current = self.subject.clone();

        debug!(
            steps = self.steps.len(),
            verbose = self.config.verbose,
            quiet = self.config.quiet,
            "starting pipeline run"
        );

        for step in &self.steps {
            debug!(step = step.name(), subject = %current, "executing step");
            let result = step.run(&current, &mut self.config);

            if let Some(new_name) = self.config.new_name.as_deref() {
                current = new_name.to_string();
            }

            let Err(err) = result else {
                continue;
            };

            match err.severity() {
                Severity::Low => {
                    warn!(
                        step = step.name(),
                        %err,
                        "minor issue; the run continues unaffected"
                    );
                    aggregate = Some(PipelineError::merge(aggregate.take(), err));
                }
                Severity::High => {
                    warn!(
                        step = step.name(),
                        "step failed; the run continues but the result is degraded"
                    );
                    debug!(step = step.name(), %err, "degrading error detail");
                    aggregate = Some(PipelineError::merge(aggregate.take(), err));
                    success = false;
                }
                Severity::Critical => {
                    warn!(step = step.name(), "step failed; aborting the run");
                    error!(step = step.name(), %err, "critical error");
                    // Preemptive exit: whatever was recorded so far is
                    // superseded by the critical error.
                    return RunOutcome {
                        success: false,
                        error: Some(err),
                    };
                }
            }
        }

        RunOutcome {
            success,
            error: aggregate,
        }
    }
}
