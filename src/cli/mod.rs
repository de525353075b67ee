//! CLI layer for yion-kit.
//!
//! Provides the command-line interface using clap, with commands for
//! reading and writing documents and for checking translations.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::execute;
pub use output::OutputFormat;
pub use parser::{Cli, Commands};
