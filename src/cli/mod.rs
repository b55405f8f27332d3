//! Command-line interface for pipeline-init.
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`commands`] - Command implementations

pub mod args;
pub mod commands;

pub use args::{Cli, Commands, CompletionsArgs, ConfigArgs, ManualConfigArgs, OutputFormat};
pub use commands::{Command, CommandDispatcher, CommandResult};
