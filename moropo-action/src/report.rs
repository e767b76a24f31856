//! Outcome reporting
//!
//! The poller and the setup flow never exit the process themselves. They
//! hand failures to an [`OutcomeReporter`]; `main` turns the recorded state
//! into the process exit code.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use colored::*;

use crate::scheduler::PollOutcome;

/// Marks the host job as failed
pub trait OutcomeReporter: Send + Sync {
    /// Record a failure with a human-readable message
    fn mark_failed(&self, message: &str);
}

impl<T: OutcomeReporter + ?Sized> OutcomeReporter for Arc<T> {
    fn mark_failed(&self, message: &str) {
        (**self).mark_failed(message)
    }
}

/// Reporter for GitHub Actions
///
/// Emits an `::error::` workflow command so the message shows up as an
/// annotation, and remembers that the job failed.
#[derive(Debug, Default)]
pub struct ActionsReporter {
    failed: AtomicBool,
}

impl ActionsReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any failure has been reported
    pub fn has_failed(&self) -> bool {
        self.failed.load(Ordering::SeqCst)
    }
}

impl OutcomeReporter for ActionsReporter {
    fn mark_failed(&self, message: &str) {
        self.failed.store(true, Ordering::SeqCst);
        println!("{}", error_command(message));
    }
}

/// Format an `::error::` workflow command
fn error_command(message: &str) -> String {
    let escaped = message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A");
    format!("::error::{}", escaped)
}

/// Print the final polling outcome for humans reading the job log
pub fn print_outcome(outcome: &PollOutcome) {
    match outcome {
        PollOutcome::Passed => println!("{} {}", "✓".green(), "Test run passed".green().bold()),
        PollOutcome::Failed { .. } => println!("{} {}", "✗".red(), outcome.to_string().red()),
        PollOutcome::TimedOut { .. } | PollOutcome::Errored { .. } => {
            println!("{} {}", "⚠".yellow(), outcome.to_string().yellow())
        }
    }
}

/// Reporter that remembers every message, for tests
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingReporter {
    messages: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl RecordingReporter {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl OutcomeReporter for RecordingReporter {
    fn mark_failed(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_command_escapes_newlines() {
        assert_eq!(
            error_command("2 tests failed\nsee 100% of logs"),
            "::error::2 tests failed%0Asee 100%25 of logs"
        );
    }

    #[test]
    fn test_actions_reporter_records_failure() {
        let reporter = ActionsReporter::new();
        assert!(!reporter.has_failed());

        reporter.mark_failed("boom");
        assert!(reporter.has_failed());
    }

    #[test]
    fn test_shared_reporter_forwards() {
        let reporter = Arc::new(RecordingReporter::default());
        let shared: Arc<RecordingReporter> = Arc::clone(&reporter);

        shared.mark_failed("first");
        assert_eq!(reporter.messages(), vec!["first".to_string()]);
    }
}
