//! Concrete pipeline steps.
//!
//! Each step implements [`Operation`] over the shared working directory:
//! prepare a working copy, strip the draft class option, drive the external
//! toolchain (`pdflatex`, `biber`, `makeglossaries`), and finally deliver the
//! produced PDF and clean up. Expected failure conditions are reported as
//! [`PipelineError`] values, never as panics; unexpected I/O errors are
//! wrapped with the causing error attached.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::Local;
use regex::Regex;
use tracing::debug;

use crate::config::RunConfig;
use crate::error::{PipelineError, Severity};
use crate::pipeline::{Operation, StepResult};

/// Directory the finished PDF is delivered to, relative to the working root.
pub const DEPLOY_DIR: &str = "DEPLOY";

/// Creates the prefixed working copy the rest of the run operates on.
///
/// The user's original file is never touched after this step; the new name is
/// recorded in the config so the runner redirects all later steps to it.
pub struct CopyStep;

/// Removes the `draft` option from the `\documentclass` line.
pub struct StripDraftStep;

/// Runs the typesetting engine over the working copy.
pub struct CompileStep;

/// Runs the bibliography processor over the compiled auxiliary files.
pub struct BibliographyStep;

/// Runs the glossary processor over the compiled auxiliary files.
pub struct GlossaryStep;

/// Delivers the produced PDF and removes the pipeline's working files.
pub struct CleanStep;

impl Operation for CopyStep {
    fn name(&self) -> &'static str {
        "copy latex file"
    }

    fn run(&self, subject: &str, config: &mut RunConfig) -> StepResult {
        let source = require_source(subject, config)?;
        let new_name = format!("{}_{subject}", config.file_prefix);
        let dest = config.resolve(&new_name, "tex");

        if let Err(err) = fs::copy(&source, &dest) {
            return Err(PipelineError::with_cause(
                format!("could not create the working copy {new_name}.tex"),
                Severity::Critical,
                err,
            ));
        }

        config.new_name = Some(new_name);
        Ok(())
    }
}

impl Operation for StripDraftStep {
    fn name(&self) -> &'static str {
        "remove draft option"
    }

    fn run(&self, subject: &str, config: &mut RunConfig) -> StepResult {
        let path = require_source(subject, config)?;
        let contents = fs::read_to_string(&path).map_err(|err| {
            PipelineError::with_cause(
                format!("could not read {subject}.tex"),
                Severity::Critical,
                err,
            )
        })?;

        let mut lines: Vec<String> = contents.lines().map(str::to_string).collect();
        let Some(class_line) = lines.first() else {
            return Err(PipelineError::new(
                "the file is empty; there is no class definition to strip",
                Severity::Low,
            ));
        };

        let rewritten = strip_draft_from_class_line(class_line)?;
        lines[0] = rewritten;

        let mut output = lines.join("\n");
        if contents.ends_with('\n') {
            output.push('\n');
        }
        fs::write(&path, output).map_err(|err| {
            PipelineError::with_cause(
                format!("could not rewrite {subject}.tex"),
                Severity::Critical,
                err,
            )
        })?;

        Ok(())
    }
}

impl Operation for CompileStep {
    fn name(&self) -> &'static str {
        "compile latex file"
    }

    fn run(&self, subject: &str, config: &mut RunConfig) -> StepResult {
        require_source(subject, config)?;
        invoke_tool(
            "pdflatex",
            "-quiet",
            &format!("{subject}.tex"),
            config,
            Severity::Critical,
        )
    }
}

impl Operation for BibliographyStep {
    fn name(&self) -> &'static str {
        "create bibliography"
    }

    fn run(&self, subject: &str, config: &mut RunConfig) -> StepResult {
        require_artifact(subject, "bcf", config, "the bibliography")?;

        let has_bib = contains_bib_file(&config.root).map_err(|err| {
            PipelineError::with_cause(
                "could not search the project for a bibliography file",
                Severity::High,
                err,
            )
        })?;
        if !has_bib {
            return Err(PipelineError::new(
                "there is no bibliography file in the project; the bibliography cannot be generated",
                Severity::High,
            ));
        }

        invoke_tool("biber", "-q", subject, config, Severity::High)
    }
}

impl Operation for GlossaryStep {
    fn name(&self) -> &'static str {
        "create glossary"
    }

    fn run(&self, subject: &str, config: &mut RunConfig) -> StepResult {
        require_artifact(subject, "glo", config, "the glossary")?;
        require_artifact(subject, "ist", config, "the glossary")?;
        require_artifact(subject, "aux", config, "the glossary")?;

        invoke_tool("makeglossaries", "-q", subject, config, Severity::High)
    }
}

impl Operation for CleanStep {
    fn name(&self) -> &'static str {
        "clean working directory"
    }

    fn run(&self, subject: &str, config: &mut RunConfig) -> StepResult {
        let deploy = config.root.join(DEPLOY_DIR);
        let mut pending: Option<PipelineError> = None;

        match fs::create_dir(&deploy) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                pending = Some(PipelineError::new(
                    "the deploy directory already exists; reusing it",
                    Severity::Low,
                ));
            }
            Err(err) => {
                return Err(PipelineError::with_cause(
                    "could not create the deploy directory",
                    Severity::Critical,
                    err,
                ));
            }
        }

        let pdf = config.resolve(subject, "pdf");
        if !pdf.is_file() {
            return Err(PipelineError::new(
                format!("the file {subject}.pdf was not produced; there is nothing to deliver"),
                Severity::Critical,
            ));
        }

        let stamp = Local::now().format("%Y_%m_%d_%H_%M");
        let dest = deploy.join(format!("{stamp}_{subject}.pdf"));
        move_file(&pdf, &dest).map_err(|err| {
            PipelineError::with_cause(
                "could not move the produced PDF into the deploy directory",
                Severity::Critical,
                err,
            )
        })?;
        debug!(dest = %dest.display(), "delivered PDF");

        remove_working_files(config, &mut pending);

        match pending {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// The tex source every preparation and compile step requires. Its absence
/// means the run cannot proceed at all.
fn require_source(subject: &str, config: &RunConfig) -> Result<PathBuf, PipelineError> {
    let path = config.resolve(subject, "tex");
    if path.is_file() {
        Ok(path)
    } else {
        Err(PipelineError::new(
            format!("the file {subject}.tex is not in the working directory"),
            Severity::Critical,
        ))
    }
}

/// An intermediate artifact a generation step depends on. Its absence only
/// blocks that feature, not the run.
fn require_artifact(
    subject: &str,
    ext: &str,
    config: &RunConfig,
    what: &str,
) -> Result<(), PipelineError> {
    if config.resolve(subject, ext).is_file() {
        Ok(())
    } else {
        Err(PipelineError::new(
            format!("the file {subject}.{ext} has not been created; {what} cannot be generated"),
            Severity::High,
        ))
    }
}

/// Rewrite a `\documentclass[...]{...}` line without its `draft` option.
///
/// A line that carries no options, no class, or no draft option reports a
/// low-severity error and leaves the file untouched.
fn strip_draft_from_class_line(class_line: &str) -> Result<String, PipelineError> {
    let options_re = Regex::new(r"\[(.+?)\]").expect("regex for class options");
    let class_re = Regex::new(r"\{(.+?)\}").expect("regex for document class");

    let nothing_to_strip = || {
        PipelineError::new(
            "the draft option is not in the class definition",
            Severity::Low,
        )
    };

    let options = options_re
        .captures(class_line)
        .ok_or_else(nothing_to_strip)?;
    let class = class_re.captures(class_line).ok_or_else(nothing_to_strip)?;

    let mut options: Vec<&str> = options[1].split(',').collect();
    let draft_index = options
        .iter()
        .position(|option| option.trim() == "draft")
        .ok_or_else(nothing_to_strip)?;
    options.remove(draft_index);

    Ok(format!(
        "\\documentclass[{}]{{{}}}",
        options.join(","),
        &class[1]
    ))
}

/// Invoke an external tool inside the working directory, silencing it with
/// `quiet_flag` unless the run is verbose. The exit status is logged but not
/// inspected; downstream steps surface a missing PDF or bibliography instead.
fn invoke_tool(
    program: &str,
    quiet_flag: &str,
    target: &str,
    config: &RunConfig,
    missing_severity: Severity,
) -> StepResult {
    let program_path = which::which(program).map_err(|err| {
        PipelineError::with_cause(
            format!("{program} is not installed or not on PATH"),
            missing_severity,
            err,
        )
    })?;

    let mut command = Command::new(program_path);
    command.current_dir(&config.root);
    if !config.verbose {
        command.arg(quiet_flag);
    }
    command.arg(target);

    let status = command.status().map_err(|err| {
        PipelineError::with_cause(
            format!("failed to launch {program}"),
            missing_severity,
            err,
        )
    })?;
    debug!(program, code = ?status.code(), "external tool finished");

    Ok(())
}

/// True when a `.bib` file exists anywhere under `dir`.
fn contains_bib_file(dir: &Path) -> io::Result<bool> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            if contains_bib_file(&path)? {
                return Ok(true);
            }
        } else if path.extension().is_some_and(|ext| ext == "bib") {
            return Ok(true);
        }
    }
    Ok(false)
}

fn move_file(source: &Path, dest: &Path) -> io::Result<()> {
    fs::rename(source, dest).or_else(|_| {
        fs::copy(source, dest)?;
        fs::remove_file(source)
    })
}

/// Delete every file in the working directory carrying the pipeline prefix.
/// Failures here are cosmetic; they are merged into `pending` as low
/// severity instead of failing the delivery.
fn remove_working_files(config: &RunConfig, pending: &mut Option<PipelineError>) {
    let entries = match fs::read_dir(&config.root) {
        Ok(entries) => entries,
        Err(err) => {
            let scan_err = PipelineError::with_cause(
                "could not scan the working directory for leftover files",
                Severity::Low,
                err,
            );
            *pending = Some(PipelineError::merge(pending.take(), scan_err));
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let name = entry.file_name();
        let is_working_file = name
            .to_str()
            .is_some_and(|name| name.contains(config.file_prefix.as_str()));
        if !is_working_file || !path.is_file() {
            continue;
        }
        if let Err(err) = fs::remove_file(&path) {
            let remove_err = PipelineError::with_cause(
                format!("could not remove the working file {}", path.display()),
                Severity::Low,
                err,
            );
            *pending = Some(PipelineError::merge(pending.take(), remove_err));
        }
    }
}
