//! Poller state machine
//!
//! Pure transition logic for the status poller. The driver in
//! [`super::poller`] owns the timers; this module only decides what
//! happens after each attempt, which keeps the policy testable without a clock.

use std::fmt;
use std::time::Duration;

use moropo_client::ClientError;
use moropo_core::domain::test_run::RunStatus;

/// Outcome of a single status query
pub type PollAttempt = Result<RunStatus, ClientError>;

/// Polling policy
///
/// All values are chosen by the host; the remote service never changes them.
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    /// Delay between queries while the run is in progress
    pub interval: Duration,

    /// Factor applied to the delay after each consecutive transport error
    pub backoff_multiplier: f64,

    /// Number of consecutive transport errors that ends polling
    pub max_consecutive_errors: u32,

    /// Wall-clock bound on the whole polling session
    pub timeout: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            backoff_multiplier: 1.25,
            max_consecutive_errors: 3,
            timeout: Duration::from_secs(30 * 60),
        }
    }
}

/// Phase of the poller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Last query succeeded (or none was made yet); next query at base interval
    Waiting,
    /// Last query failed; next query after a backed-off delay
    Retrying,
    /// Absorbing: no further queries, outcome already decided
    Terminated,
}

/// Final result of a polling session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The run completed and passed
    Passed,
    /// The run completed but did not pass
    Failed { message: String },
    /// No terminal status was observed before the watchdog fired
    TimedOut { after: Duration },
    /// The status endpoint kept failing
    Errored { message: String },
}

impl PollOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Passed)
    }

    /// Message to surface to the host, `None` for a passing run
    pub fn failure_message(&self) -> Option<String> {
        match self {
            Self::Passed => None,
            Self::Failed { message } if message.is_empty() => Some("Test run failed".to_string()),
            Self::Failed { message } | Self::Errored { message } => Some(message.clone()),
            Self::TimedOut { .. } => Some(self.to_string()),
        }
    }
}

impl fmt::Display for PollOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => write!(f, "test run passed"),
            Self::Failed { message } => write!(f, "test run failed: {}", message),
            Self::TimedOut { after } => write!(
                f,
                "timed out after {}s waiting for the test run to complete",
                after.as_secs()
            ),
            Self::Errored { message } => write!(f, "status polling failed: {}", message),
        }
    }
}

/// What the driver should do next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Query again after the given delay
    Poll { after: Duration },
    /// Stop and report
    Terminate(PollOutcome),
}

/// Mutable state owned by a single poller
#[derive(Debug, Clone, PartialEq)]
pub struct PollerState {
    phase: Phase,
    consecutive_errors: u32,
    current_interval: Duration,
}

impl PollerState {
    pub fn new(policy: &PollPolicy) -> Self {
        Self {
            phase: Phase::Waiting,
            consecutive_errors: 0,
            current_interval: policy.interval,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn consecutive_errors(&self) -> u32 {
        self.consecutive_errors
    }

    pub fn is_terminated(&self) -> bool {
        self.phase == Phase::Terminated
    }

    /// Apply the result of one query
    ///
    /// Returns `None` once terminated: late results are discarded.
    pub fn apply(&mut self, attempt: PollAttempt, policy: &PollPolicy) -> Option<Step> {
        if self.is_terminated() {
            return None;
        }

        let step = match attempt {
            Err(error) => {
                self.consecutive_errors += 1;
                self.current_interval = backoff(self.current_interval, policy);

                if self.consecutive_errors < policy.max_consecutive_errors {
                    self.phase = Phase::Retrying;
                    Step::Poll {
                        after: self.current_interval,
                    }
                } else {
                    self.phase = Phase::Terminated;
                    Step::Terminate(PollOutcome::Errored {
                        message: error.to_string(),
                    })
                }
            }
            Ok(status) if !status.complete => {
                self.consecutive_errors = 0;
                self.current_interval = policy.interval;
                self.phase = Phase::Waiting;
                Step::Poll {
                    after: self.current_interval,
                }
            }
            Ok(status) => {
                self.phase = Phase::Terminated;
                if status.is_passed() {
                    Step::Terminate(PollOutcome::Passed)
                } else {
                    Step::Terminate(PollOutcome::Failed {
                        message: status.message,
                    })
                }
            }
        };

        Some(step)
    }

    /// Enter `Terminated` from outside the query path (watchdog)
    ///
    /// Returns `false` if the state was already terminated.
    pub fn terminate(&mut self) -> bool {
        if self.is_terminated() {
            return false;
        }
        self.phase = Phase::Terminated;
        true
    }
}

/// Next retry delay, capped at the session timeout
///
/// Any delay at or past the timeout is cut short by the watchdog anyway.
fn backoff(current: Duration, policy: &PollPolicy) -> Duration {
    Duration::try_from_secs_f64(current.as_secs_f64() * policy.backoff_multiplier)
        .unwrap_or(Duration::MAX)
        .min(policy.timeout)
}
