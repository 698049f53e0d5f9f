// Handlers for CLI subcommands; main.rs only parses and dispatches.

pub mod check;
pub mod lookup;
