//! Shared per-run configuration handed to every pipeline step.

use std::path::PathBuf;

/// Fixed prefix marking working copies owned by the pipeline. Cleanup removes
/// every file carrying it.
pub const FILE_PREFIX: &str = "[piped]";

/// Mutable state shared by the runner and the steps of one run.
///
/// `new_name` is the only field steps write: a step that renames the working
/// file records the new subject here, and the runner hands it to every later
/// step. Created at pipeline construction and dropped with the pipeline.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Current working name after a renaming step; `None` until a step sets
    /// it, which is the normal state early in a run.
    pub new_name: Option<String>,
    /// Prefix applied when creating the working copy.
    pub file_prefix: String,
    /// Pass external tool output through instead of silencing it.
    pub verbose: bool,
    /// Lower console log verbosity (consumed by the CLI entry point).
    pub quiet: bool,
    /// Directory all steps operate in.
    pub root: PathBuf,
}

impl RunConfig {
    pub fn new(root: impl Into<PathBuf>, verbose: bool, quiet: bool) -> Self {
        Self {
            new_name: None,
            file_prefix: FILE_PREFIX.to_string(),
            verbose,
            quiet,
            root: root.into(),
        }
    }

    /// Path of `{name}.{ext}` inside the working directory.
    pub fn resolve(&self, name: &str, ext: &str) -> PathBuf {
        self.root.join(format!("{name}.{ext}"))
    }
}
