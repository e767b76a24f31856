//! Data Transfer Objects for the Moropo API
//!
//! Wire shapes sent to and received from the Moropo API. Several endpoints
//! answer with an [`envelope::Envelope`] whose body is itself JSON encoded
//! as a string.

pub mod envelope;
pub mod test_run;
