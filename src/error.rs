//! Ranked error value shared between the pipeline runner and its steps.
//!
//! Every step failure carries a [`Severity`] that tells the runner whether to
//! keep going, degrade the run, or abort. Ordering between errors is defined
//! over severity alone; messages and causes never affect comparisons.

use std::cmp::Ordering;
use std::error::Error as StdError;
use std::fmt;

/// How badly a step failure affects the rest of the run.
///
/// Discriminants match the numeric levels used in the log format; only their
/// relative order matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Cosmetic anomaly. The run continues and still counts as a success.
    Low = 10,
    /// A requested feature could not be completed. The run continues but the
    /// overall result is a failure; a degraded artifact may still exist.
    High = 20,
    /// A required precondition is missing. The run aborts immediately.
    Critical = 30,
}

impl Severity {
    /// Numeric level, used in the rendered error line.
    pub fn value(self) -> u8 {
        self as u8
    }
}

/// Error reported by a pipeline step.
///
/// Immutable once constructed. The optional cause keeps the underlying I/O or
/// tool error reachable through [`StdError::source`] without letting it leak
/// into the severity comparison.
#[derive(Debug)]
pub struct PipelineError {
    message: String,
    severity: Severity,
    cause: Option<Box<dyn StdError + Send + Sync>>,
}

impl PipelineError {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
            cause: None,
        }
    }

    pub fn with_cause(
        message: impl Into<String>,
        severity: Severity,
        cause: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            severity,
            cause: Some(Box::new(cause)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Pick which error a run keeps reporting after a new failure.
    ///
    /// Higher severity wins. On a tie the previously recorded error is kept,
    /// since the earliest failure is the likeliest root cause of anything
    /// that went wrong after it.
    pub fn merge(current: Option<Self>, new: Self) -> Self {
        match current {
            Some(current) if current >= new => current,
            _ => new,
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{cause} ({}) | {}", self.severity.value(), self.message),
            None => write!(
                f,
                "PipelineError ({}) | {}",
                self.severity.value(),
                self.message
            ),
        }
    }
}

impl StdError for PipelineError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn StdError + 'static))
    }
}

// Comparisons are severity-only: two errors of equal severity are equal no
// matter what their messages say.
impl PartialEq for PipelineError {
    fn eq(&self, other: &Self) -> bool {
        self.severity == other.severity
    }
}

impl Eq for PipelineError {}

impl PartialOrd for PipelineError {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PipelineError {
    fn cmp(&self, other: &Self) -> Ordering {
        self.severity.cmp(&other.severity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn severity_levels_are_ordered() {
        assert!(Severity::Low < Severity::High);
        assert!(Severity::High < Severity::Critical);
        assert_eq!(Severity::Low.value(), 10);
        assert_eq!(Severity::High.value(), 20);
        assert_eq!(Severity::Critical.value(), 30);
    }

    #[test]
    fn comparison_ignores_message() {
        let a = PipelineError::new("first", Severity::High);
        let b = PipelineError::new("completely different", Severity::High);
        assert_eq!(a, b);
        assert!(a <= b && a >= b);

        let low = PipelineError::new("low", Severity::Low);
        assert!(low < a);
    }

    #[test]
    fn merge_keeps_earlier_error_on_equal_severity() {
        let first = PipelineError::new("first", Severity::High);
        let second = PipelineError::new("second", Severity::High);
        let kept = PipelineError::merge(Some(first), second);
        assert_eq!(kept.message(), "first");
    }

    #[test]
    fn merge_prefers_higher_severity() {
        let low = PipelineError::new("low", Severity::Low);
        let high = PipelineError::new("high", Severity::High);
        let kept = PipelineError::merge(Some(low), high);
        assert_eq!(kept.message(), "high");

        let high = PipelineError::new("high", Severity::High);
        let low = PipelineError::new("low", Severity::Low);
        let kept = PipelineError::merge(Some(high), low);
        assert_eq!(kept.message(), "high");
    }

    #[test]
    fn merge_without_current_takes_new() {
        let err = PipelineError::new("only", Severity::Low);
        assert_eq!(PipelineError::merge(None, err).message(), "only");
    }

    #[test]
    fn display_shows_severity_value_and_message() {
        let err = PipelineError::new("boom", Severity::Critical);
        assert_eq!(err.to_string(), "PipelineError (30) | boom");
    }

    #[test]
    fn display_leads_with_cause_when_present() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "no such file");
        let err = PipelineError::with_cause("copy failed", Severity::Critical, io_err);
        assert_eq!(err.to_string(), "no such file (30) | copy failed");
        assert!(StdError::source(&err).is_some());
    }
}
