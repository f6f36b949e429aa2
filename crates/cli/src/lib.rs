//! osf CLI library
//!
//! Exposes the command definitions so they can be exercised from tests.

pub mod commands;
pub mod exit_code;
pub mod output;
