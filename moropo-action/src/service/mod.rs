//! Service layer
//!
//! Services contain the action's business logic: reading test run status
//! for the poller and running the setup flow that uploads a build, triggers
//! the test run and keeps the status comment current.
//!
//! The status source is trait-based so the poller can be tested without a
//! network.

mod setup;
mod status;

pub use setup::SetupService;
pub use status::StatusSource;
