//! Moropo Core
//!
//! Core types shared by the Moropo client and the GitHub action.
//!
//! This crate contains:
//! - Domain types: test runs, run status, build uploads
//! - DTOs: wire shapes exchanged with the Moropo API, including the
//!   envelope whose body is a JSON document encoded as a string

pub mod domain;
pub mod dto;
