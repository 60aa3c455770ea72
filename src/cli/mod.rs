// CLI module for m4a-info
//
// Argument parsing, command implementations and output formatting for the
// binary. The library itself does not depend on anything in here.

pub mod commands;
pub mod config;
pub mod output;

pub use config::{Commands, Config};
pub use output::OutputFormatter;
