//! Merges command line overrides into loaded configuration
//!
//! Precedence, lowest to highest: config files, `HIREFLOW_*` environment
//! variables, global flags, subcommand flags. Validation runs once, after
//! every override is applied.

use super::parser::{Cli, Commands};
use crate::config::ConfigLoader;
use crate::config::error::ConfigError;
use crate::config::settings::Settings;

pub struct ConfigurationMerger {
    base_config: Settings,
}

impl ConfigurationMerger {
    pub fn new(base_config: Settings) -> Self {
        Self { base_config }
    }

    /// Load the base configuration the way `cli` asks for it
    ///
    /// `--config` switches to single-file loading; `--env` picks the
    /// environment overlay. The result is not yet validated.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let mut loader = ConfigLoader::new()?;
        if let Some(path) = &cli.config {
            loader = loader.with_config_file(path);
        }
        if let Some(env) = cli.env {
            loader = loader.with_environment(env.into());
        }

        Ok(Self::new(loader.load_unvalidated()?))
    }

    /// Apply flag overrides and validate the result
    pub fn merge_cli_args(&self, cli: &Cli) -> Result<Settings, ConfigError> {
        let mut config = self.base_config.clone();

        if cli.verbose {
            config.logger.level = "debug".to_string();
        } else if cli.quiet {
            config.logger.level = "error".to_string();
        }

        if let Some(command) = &cli.command {
            apply_command_overrides(&mut config, command);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn config(&self) -> &Settings {
        &self.base_config
    }
}

fn apply_command_overrides(config: &mut Settings, command: &Commands) {
    match command {
        Commands::Serve {
            host,
            port,
            log_level,
            with_worker,
            in_memory,
            dry_run: _,
        } => {
            if let Some(host) = host {
                config.server.host = host.clone();
            }
            if let Some(port) = port {
                config.server.port = *port;
            }
            if let Some(level) = log_level {
                config.logger.level = level.as_str().to_string();
            }
            if *with_worker {
                config.worker.enabled = true;
            }
            if *in_memory {
                config.database.in_memory = true;
            }
        }
        // The worker subcommand is pointless with the worker switched off.
        Commands::Worker { .. } => config.worker.enabled = true,
        Commands::Close { .. } | Commands::Migrate { .. } => {}
    }
}
