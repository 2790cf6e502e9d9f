//! CLI argument parsing for the build pipeline.
//!
//! The CLI is intentionally thin: it selects the optional steps and the
//! verbosity for one run, then hands everything to the pipeline.

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "pipetex",
    version,
    about = "Drive a LaTeX document through compile, bibliography, and glossary passes",
    after_help = "Examples:\n  pipetex thesis\n  pipetex thesis --bib --gls\n  pipetex -q paper"
)]
pub struct Args {
    /// Name of the tex file to process, without extension
    pub filename: String,

    /// Generate the bibliography with biber
    #[arg(short = 'b', long = "bib")]
    pub bib: bool,

    /// Generate the glossary with makeglossaries
    #[arg(short = 'g', long = "gls")]
    pub gls: bool,

    /// Lower console output to warnings only
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,

    /// Pass external tool output through instead of silencing it
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Args {
    /// Subject name for the run. A trailing `.tex` is tolerated and
    /// stripped, so `pipetex thesis.tex` behaves like `pipetex thesis`.
    pub fn subject(&self) -> &str {
        self.filename
            .strip_suffix(".tex")
            .unwrap_or(&self.filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_strips_a_trailing_tex_extension() {
        let args = Args::parse_from(["pipetex", "thesis.tex"]);
        assert_eq!(args.subject(), "thesis");

        let args = Args::parse_from(["pipetex", "thesis"]);
        assert_eq!(args.subject(), "thesis");
    }

    #[test]
    fn optional_steps_default_to_off() {
        let args = Args::parse_from(["pipetex", "thesis"]);
        assert!(!args.bib);
        assert!(!args.gls);
        assert!(!args.quiet);
        assert!(!args.verbose);
    }

    #[test]
    fn short_flags_select_optional_steps() {
        let args = Args::parse_from(["pipetex", "thesis", "-b", "-g", "-q"]);
        assert!(args.bib);
        assert!(args.gls);
        assert!(args.quiet);
    }
}
