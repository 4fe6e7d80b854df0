//! Command line interface
//!
//! - Argument parsing with clap
//! - Merging flags into file and environment configuration
//! - Dispatch to the serve, worker and migrate handlers

pub mod config_merger;
pub mod executor;
pub mod handlers;
pub mod parser;
pub mod validation;

pub use config_merger::ConfigurationMerger;
pub use executor::execute_command;
pub use parser::{Cli, Commands, Environment, LogLevel};

use crate::config::error::ConfigError;
use crate::config::settings::Settings;

/// Load configuration the way `cli` asks for it and apply its overrides
///
/// # Errors
/// Returns an error if loading, parsing or validation fails
pub fn load_settings(cli: &Cli) -> Result<Settings, ConfigError> {
    ConfigurationMerger::from_cli(cli)?.merge_cli_args(cli)
}
