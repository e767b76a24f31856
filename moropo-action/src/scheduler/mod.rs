//! Scheduler layer for the action
//!
//! This layer waits for a triggered test run to finish. It polls the
//! Moropo API for the run's status, backs off on transport errors, bounds
//! the total wait with a watchdog and reports the final outcome exactly once.

pub mod poller;
pub mod state;

pub use poller::{PollRequest, StatusPoller};
pub use state::{PollOutcome, PollPolicy};
