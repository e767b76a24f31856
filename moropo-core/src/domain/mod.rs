//! Domain types
//!
//! Business entities the action reasons about, independent of how they
//! travel over the wire.

pub mod build;
pub mod test_run;
