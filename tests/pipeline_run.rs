//! End-to-end runs of the compiled binary in sandboxed working directories.
//!
//! The full compile scenario needs `pdflatex` on PATH and is skipped when the
//! engine is absent, mirroring how external tools gate these tests.

use std::fs;
use std::process::Command;

fn pipetex() -> Command {
    Command::new(env!("CARGO_BIN_EXE_pipetex"))
}

#[test]
fn missing_source_fails_without_deploying() {
    let temp = tempfile::tempdir().expect("create temp dir");

    let status = pipetex()
        .arg("missing")
        .current_dir(temp.path())
        .status()
        .expect("run pipetex");

    assert!(!status.success());
    assert!(!temp.path().join("DEPLOY").exists());
    // The run aborted before creating a working copy.
    assert!(!temp.path().join("[piped]_missing.tex").exists());
}

#[test]
fn draft_document_compiles_and_deploys() {
    if which::which("pdflatex").is_err() {
        eprintln!("Skipping: pdflatex not installed");
        return;
    }

    let temp = tempfile::tempdir().expect("create temp dir");
    fs::write(
        temp.path().join("paper.tex"),
        "\\documentclass[a4paper, 12pt, draft]{article}\n\
         \\begin{document}\n\
         Hello.\n\
         \\end{document}\n",
    )
    .expect("write source document");

    let status = pipetex()
        .arg("paper")
        .arg("--verbose")
        .current_dir(temp.path())
        .status()
        .expect("run pipetex");

    assert!(status.success());

    let deploy = temp.path().join("DEPLOY");
    assert!(deploy.is_dir(), "deploy directory missing");
    let delivered: Vec<String> = fs::read_dir(&deploy)
        .expect("read deploy dir")
        .flatten()
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .collect();
    assert!(
        delivered.iter().any(|name| name.ends_with("_[piped]_paper.pdf")),
        "no deployed artifact in {delivered:?}"
    );

    // The user's source survives; the working copy does not.
    assert!(temp.path().join("paper.tex").is_file());
    assert!(!temp.path().join("[piped]_paper.tex").exists());
}
