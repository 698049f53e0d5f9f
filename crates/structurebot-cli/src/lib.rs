//! structurebot CLI library.
//!
//! Subcommand handlers, logging setup and output formatting for the
//! `structurebot` binary.

pub mod commands;
pub mod logging;
pub mod output;
