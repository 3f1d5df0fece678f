//! Command-line console for the Autoshorts generation API.
//!
//! Thin layer over `autoshorts-client`: argument parsing, progress output and
//! the subcommands that drive the auth gate and the generation controller.

pub mod cli;
pub mod commands;
pub mod render;

pub use cli::Cli;
pub use commands::run;
