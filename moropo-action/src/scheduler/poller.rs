//! Test run status poller
//!
//! Drives [`PollerState`] with real timers. Queries are strictly sequential:
//! the next delay is only scheduled once the previous query's result has been
//! applied. A watchdog races the whole chain, including the in-flight query;
//! when it wins, the in-flight query is dropped and its result never observed.

use std::fmt;
use std::pin::Pin;
use std::time::Duration;

use moropo_client::MoropoClient;
use moropo_core::domain::test_run::RunId;
use tokio::time::{self, Sleep};
use tracing::{debug, info, warn};

use crate::report::OutcomeReporter;
use crate::scheduler::state::{PollOutcome, PollPolicy, PollerState, Step};
use crate::service::StatusSource;

/// Identifies the run to poll and where to poll it
#[derive(Clone)]
pub struct PollRequest {
    pub run_id: RunId,
    pub api_key: String,
    /// Base URL serving `testRuns/{id}`
    pub status_url: String,
}

impl PollRequest {
    /// Build a status-only client for this request
    pub fn client(&self) -> MoropoClient {
        MoropoClient::for_status(&self.status_url, &self.api_key)
    }
}

impl fmt::Debug for PollRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollRequest")
            .field("run_id", &self.run_id)
            .field("api_key", &"<redacted>")
            .field("status_url", &self.status_url)
            .finish()
    }
}

/// Polls a test run until it completes, fails, or runs out of time
pub struct StatusPoller<S, R> {
    request: PollRequest,
    policy: PollPolicy,
    source: S,
    reporter: R,
    state: PollerState,
    watchdog: Option<Pin<Box<Sleep>>>,
    outcome: Option<PollOutcome>,
}

impl<S, R> StatusPoller<S, R>
where
    S: StatusSource,
    R: OutcomeReporter,
{
    /// Creates a new poller; nothing is queried until [`Self::start_polling`]
    pub fn new(request: PollRequest, policy: PollPolicy, source: S, reporter: R) -> Self {
        let state = PollerState::new(&policy);
        Self {
            request,
            policy,
            source,
            reporter,
            state,
            watchdog: None,
            outcome: None,
        }
    }

    /// Poll until the run reaches a terminal state or the watchdog fires
    ///
    /// The first query is issued immediately. Failing outcomes are passed to
    /// the reporter exactly once; calling this again after termination returns
    /// the same outcome without querying or reporting.
    pub async fn start_polling(&mut self) -> PollOutcome {
        if let Some(outcome) = &self.outcome {
            return outcome.clone();
        }

        info!(
            "Polling test run {} every {:?} (timeout {:?})",
            self.request.run_id, self.policy.interval, self.policy.timeout
        );
        self.arm_watchdog();

        let mut delay = Duration::ZERO;
        loop {
            let attempt = {
                let source = &self.source;
                let run_id = self.request.run_id;
                let cycle = async move {
                    if !delay.is_zero() {
                        time::sleep(delay).await;
                    }
                    source.fetch_status(run_id).await
                };

                match self.watchdog.as_mut() {
                    Some(watchdog) => tokio::select! {
                        biased;
                        _ = watchdog.as_mut() => None,
                        attempt = cycle => Some(attempt),
                    },
                    None => Some(cycle.await),
                }
            };

            let Some(attempt) = attempt else {
                warn!(
                    "Test run {} did not complete within {:?}",
                    self.request.run_id, self.policy.timeout
                );
                self.state.terminate();
                return self.finish(PollOutcome::TimedOut {
                    after: self.policy.timeout,
                });
            };

            match &attempt {
                Ok(status) => info!("Polling result for test run status: {}", status.message),
                Err(e) => warn!("Failed to fetch test run status: {}", e),
            }

            match self.state.apply(attempt, &self.policy) {
                Some(Step::Poll { after }) => {
                    debug!(
                        "Next status query in {:?} ({:?}, {} consecutive error(s))",
                        after,
                        self.state.phase(),
                        self.state.consecutive_errors()
                    );
                    delay = after;
                }
                Some(Step::Terminate(outcome)) => return self.finish(outcome),
                None => {
                    return self.outcome.clone().unwrap_or(PollOutcome::Errored {
                        message: "poller terminated without an outcome".to_string(),
                    });
                }
            }
        }
    }

    /// Disarm the watchdog; safe to call any number of times
    pub fn teardown(&mut self) {
        if self.watchdog.take().is_some() {
            debug!("Watchdog for test run {} disarmed", self.request.run_id);
        }
    }

    fn arm_watchdog(&mut self) {
        self.watchdog = Some(Box::pin(time::sleep(self.policy.timeout)));
        info!("Timeout registered for {:?}", self.policy.timeout);
    }

    /// Record the outcome and report it
    fn finish(&mut self, outcome: PollOutcome) -> PollOutcome {
        self.teardown();

        info!(
            "Test run {} finished: {}",
            self.request.run_id,
            if outcome.is_success() { "pass" } else { "fail" }
        );
        if let Some(message) = outcome.failure_message() {
            self.reporter.mark_failed(&message);
        }

        self.outcome = Some(outcome.clone());
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::RecordingReporter;
    use crate::scheduler::state::Phase;
    use async_trait::async_trait;
    use moropo_client::ClientError;
    use moropo_core::domain::test_run::RunStatus;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    /// Serves scripted attempts, then "Running" forever
    struct ScriptedSource {
        script: Mutex<VecDeque<Result<RunStatus, ClientError>>>,
        calls: Mutex<Vec<Instant>>,
        latency: Duration,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<RunStatus, ClientError>>) -> Arc<Self> {
            Self::with_latency(script, Duration::ZERO)
        }

        fn with_latency(script: Vec<Result<RunStatus, ClientError>>, latency: Duration) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: Mutex::new(Vec::new()),
                latency,
            })
        }

        fn calls(&self) -> Vec<Instant> {
            self.calls.lock().unwrap().clone()
        }

        /// Delays between consecutive queries
        fn gaps(&self) -> Vec<Duration> {
            self.calls()
                .windows(2)
                .map(|pair| pair[1].duration_since(pair[0]))
                .collect()
        }
    }

    #[async_trait]
    impl StatusSource for ScriptedSource {
        async fn fetch_status(&self, _run_id: RunId) -> Result<RunStatus, ClientError> {
            self.calls.lock().unwrap().push(Instant::now());
            if !self.latency.is_zero() {
                time::sleep(self.latency).await;
            }
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(RunStatus::pending("Running")))
        }
    }

    fn request() -> PollRequest {
        PollRequest {
            run_id: RunId(42),
            api_key: "secret".to_string(),
            status_url: "https://app.moropo.com".to_string(),
        }
    }

    fn transport_error() -> Result<RunStatus, ClientError> {
        Err(ClientError::api_error(503, "unavailable"))
    }

    fn poller(
        source: &Arc<ScriptedSource>,
        reporter: &Arc<RecordingReporter>,
    ) -> StatusPoller<Arc<ScriptedSource>, Arc<RecordingReporter>> {
        StatusPoller::new(
            request(),
            PollPolicy::default(),
            Arc::clone(source),
            Arc::clone(reporter),
        )
    }

    fn assert_close(actual: Duration, expected: Duration) {
        let diff = actual.abs_diff(expected);
        assert!(
            diff <= Duration::from_millis(1),
            "expected {:?}, got {:?}",
            expected,
            actual
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_passing_run_reports_nothing() {
        let source = ScriptedSource::new(vec![
            Ok(RunStatus::pending("Queued")),
            Ok(RunStatus::pending("Running")),
            Ok(RunStatus::finished(true, "All tests passed")),
        ]);
        let reporter = Arc::new(RecordingReporter::default());
        let mut poller = poller(&source, &reporter);

        let outcome = poller.start_polling().await;

        assert_eq!(outcome, PollOutcome::Passed);
        assert!(reporter.messages().is_empty());
        assert_eq!(source.calls().len(), 3);
        for gap in source.gaps() {
            assert_close(gap, Duration::from_secs(30));
        }
        assert_eq!(poller.state.phase(), Phase::Terminated);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_run_reports_message_once() {
        let source = ScriptedSource::new(vec![Ok(RunStatus::finished(false, "X"))]);
        let reporter = Arc::new(RecordingReporter::default());
        let mut poller = poller(&source, &reporter);

        let outcome = poller.start_polling().await;

        assert_eq!(
            outcome,
            PollOutcome::Failed {
                message: "X".to_string()
            }
        );
        assert_eq!(reporter.messages(), vec!["X".to_string()]);

        // Terminated is absorbing: no new query, no second report
        let again = poller.start_polling().await;
        assert_eq!(again, outcome);
        assert_eq!(source.calls().len(), 1);
        assert_eq!(reporter.messages().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_then_success() {
        let source = ScriptedSource::new(vec![
            transport_error(),
            transport_error(),
            Ok(RunStatus::finished(true, "done")),
        ]);
        let reporter = Arc::new(RecordingReporter::default());
        let mut poller = poller(&source, &reporter);

        let outcome = poller.start_polling().await;

        assert_eq!(outcome, PollOutcome::Passed);
        assert!(reporter.messages().is_empty());

        let gaps = source.gaps();
        assert_eq!(gaps.len(), 2);
        assert_close(gaps[0], Duration::from_millis(37_500));
        assert_close(gaps[1], Duration::from_millis(46_875));
    }

    #[tokio::test(start_paused = true)]
    async fn test_runaway_backoff_ends_at_watchdog() {
        let source = ScriptedSource::new(vec![transport_error(), transport_error()]);
        let reporter = Arc::new(RecordingReporter::default());
        let mut poller = StatusPoller::new(
            request(),
            PollPolicy {
                backoff_multiplier: 1e30,
                timeout: Duration::from_secs(600),
                ..PollPolicy::default()
            },
            Arc::clone(&source),
            Arc::clone(&reporter),
        );

        let outcome = poller.start_polling().await;

        assert_eq!(
            outcome,
            PollOutcome::TimedOut {
                after: Duration::from_secs(600)
            }
        );
        assert_eq!(source.calls().len(), 1);
        assert_eq!(reporter.messages().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_resets_after_success() {
        let source = ScriptedSource::new(vec![
            transport_error(),
            Ok(RunStatus::pending("Running")),
            Ok(RunStatus::finished(true, "done")),
        ]);
        let reporter = Arc::new(RecordingReporter::default());
        let mut poller = poller(&source, &reporter);

        poller.start_polling().await;

        let gaps = source.gaps();
        assert_close(gaps[0], Duration::from_millis(37_500));
        assert_close(gaps[1], Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_ceiling_reports_hard_failure() {
        let source = ScriptedSource::new(vec![
            transport_error(),
            transport_error(),
            Err(ClientError::ParseError("bad body".to_string())),
            Ok(RunStatus::finished(true, "never seen")),
        ]);
        let reporter = Arc::new(RecordingReporter::default());
        let mut poller = poller(&source, &reporter);

        let outcome = poller.start_polling().await;

        assert_eq!(
            outcome,
            PollOutcome::Errored {
                message: "Failed to parse response: bad body".to_string()
            }
        );
        assert_eq!(reporter.messages().len(), 1);
        assert_eq!(source.calls().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watchdog_times_out_pending_run() {
        // Script is empty, so every query answers "Running"
        let source = ScriptedSource::new(Vec::new());
        let reporter = Arc::new(RecordingReporter::default());
        let mut poller = StatusPoller::new(
            request(),
            PollPolicy {
                timeout: Duration::from_secs(95),
                ..PollPolicy::default()
            },
            Arc::clone(&source),
            Arc::clone(&reporter),
        );

        let started = Instant::now();
        let outcome = poller.start_polling().await;

        assert_eq!(
            outcome,
            PollOutcome::TimedOut {
                after: Duration::from_secs(95)
            }
        );
        assert_close(started.elapsed(), Duration::from_secs(95));
        // Queries at 0s, 30s, 60s and 90s
        assert_eq!(source.calls().len(), 4);
        assert_eq!(reporter.messages().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watchdog_discards_in_flight_result() {
        // The only query takes longer than the whole budget
        let source = ScriptedSource::with_latency(
            vec![Ok(RunStatus::finished(true, "too late"))],
            Duration::from_secs(120),
        );
        let reporter = Arc::new(RecordingReporter::default());
        let mut poller = StatusPoller::new(
            request(),
            PollPolicy {
                timeout: Duration::from_secs(60),
                ..PollPolicy::default()
            },
            Arc::clone(&source),
            Arc::clone(&reporter),
        );

        let outcome = poller.start_polling().await;
        assert!(matches!(outcome, PollOutcome::TimedOut { .. }));

        // Let the abandoned query's deadline pass; nothing else may happen
        time::sleep(Duration::from_secs(300)).await;
        assert_eq!(source.calls().len(), 1);
        assert_eq!(reporter.messages().len(), 1);
        assert_eq!(poller.start_polling().await, outcome);
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_is_idempotent() {
        let source = ScriptedSource::new(vec![Ok(RunStatus::finished(true, "ok"))]);
        let reporter = Arc::new(RecordingReporter::default());
        let mut poller = poller(&source, &reporter);

        poller.start_polling().await;
        poller.teardown();
        poller.teardown();

        assert!(poller.watchdog.is_none());
        assert!(reporter.messages().is_empty());
    }

    #[test]
    fn test_request_client_targets_status_url() {
        let client = request().client();
        assert_eq!(client.app_url(), "https://app.moropo.com");
    }

    #[test]
    fn test_request_debug_redacts_api_key() {
        let rendered = format!("{:?}", request());
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
