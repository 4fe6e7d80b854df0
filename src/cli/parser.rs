//! Command line argument definitions
//!
//! Global flags pick the configuration source and verbosity; subcommands
//! select what the process runs.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use super::validation::{
    validate_config_file_path, validate_host_address, validate_port, validate_rollback_steps,
};

#[derive(Parser, Debug)]
#[command(name = "hireflow")]
#[command(about = "Job posting publisher, catalog and application intake")]
#[command(long_about = "
Hireflow publishes job postings on behalf of a Camunda process, lists them
in a public catalog, and accepts applications for open postings.

EXAMPLES:
    # Serve the catalog with the embedded task worker
    hireflow serve --with-worker

    # Serve on a custom host and port
    hireflow serve --host 0.0.0.0 --port 8080

    # Run only the task worker
    hireflow worker

    # Use a single configuration file
    hireflow --config /etc/hireflow/hireflow.toml serve

    # Try the catalog without PostgreSQL; data is lost on exit
    hireflow serve --in-memory --with-worker

    # Check configuration without starting anything
    hireflow serve --dry-run

    # Apply or preview database migrations
    hireflow migrate
    hireflow migrate --dry-run

    # Roll back the last migration
    hireflow migrate --rollback 1
")]
#[command(version = crate::clap_long_version())]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Load this file instead of the layered config directory
    #[arg(short, long, value_name = "FILE", value_parser = validate_config_file_path)]
    pub config: Option<PathBuf>,

    /// Environment used to pick `{environment}.toml`
    #[arg(short, long, value_enum)]
    pub env: Option<Environment>,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,

    /// Log errors only
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Serve the HTTP catalog and application intake
    Serve {
        #[arg(long, value_name = "ADDRESS", value_parser = validate_host_address)]
        host: Option<String>,

        #[arg(short, long, value_name = "PORT", value_parser = validate_port)]
        port: Option<u16>,

        #[arg(long, value_enum)]
        log_level: Option<LogLevel>,

        /// Validate configuration and exit
        #[arg(long)]
        dry_run: bool,

        /// Run the task worker inside the server process
        #[arg(long)]
        with_worker: bool,

        /// Keep postings and applications in memory instead of PostgreSQL
        #[arg(long)]
        in_memory: bool,
    },
    /// Run the task worker without the HTTP server
    Worker {
        /// Validate configuration and exit
        #[arg(long)]
        dry_run: bool,
    },
    /// Close a published posting so it stops accepting applications
    Close {
        #[arg(value_name = "JOB_ID")]
        job_id: String,
    },
    /// Apply, preview or roll back database migrations
    Migrate {
        #[arg(long, conflicts_with = "rollback")]
        dry_run: bool,

        #[arg(long, value_name = "STEPS", value_parser = validate_rollback_steps)]
        rollback: Option<u32>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    #[value(name = "development", alias = "dev")]
    Development,
    #[value(name = "test")]
    Test,
    #[value(name = "staging", alias = "stage")]
    Staging,
    #[value(name = "production", alias = "prod")]
    Production,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    #[value(alias = "warning")]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl From<Environment> for crate::config::Environment {
    fn from(env: Environment) -> Self {
        match env {
            Environment::Development => crate::config::Environment::Development,
            Environment::Test => crate::config::Environment::Test,
            Environment::Staging => crate::config::Environment::Staging,
            Environment::Production => crate::config::Environment::Production,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_version_flag() {
        let err = Cli::try_parse_from(["hireflow", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_default_behavior() {
        let cli = Cli::try_parse_from(["hireflow"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
        assert!(cli.config.is_none());
        assert!(cli.env.is_none());
    }

    #[test]
    fn test_serve_command() {
        let cli = Cli::try_parse_from([
            "hireflow",
            "serve",
            "--host",
            "0.0.0.0",
            "--port",
            "8080",
            "--with-worker",
        ])
        .unwrap();

        assert_eq!(
            cli.command,
            Some(Commands::Serve {
                host: Some("0.0.0.0".to_string()),
                port: Some(8080),
                log_level: None,
                dry_run: false,
                with_worker: true,
                in_memory: false,
            })
        );
    }

    #[test]
    fn test_worker_command() {
        let cli = Cli::try_parse_from(["hireflow", "--env", "prod", "worker", "--dry-run"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Worker { dry_run: true }));
        assert_eq!(cli.env, Some(Environment::Production));
    }

    #[test]
    fn test_close_requires_job_id() {
        let cli = Cli::try_parse_from(["hireflow", "close", "HR/2026/7"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Close {
                job_id: "HR/2026/7".to_string()
            })
        );
        assert!(Cli::try_parse_from(["hireflow", "close"]).is_err());
    }

    #[test]
    fn test_migrate_flags_conflict() {
        let err = Cli::try_parse_from(["hireflow", "migrate", "--dry-run", "--rollback", "2"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_invalid_port_rejected() {
        assert!(Cli::try_parse_from(["hireflow", "serve", "--port", "0"]).is_err());
    }

    #[test]
    fn test_conflicting_verbose_quiet() {
        let err = Cli::try_parse_from(["hireflow", "--verbose", "--quiet"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_log_level_alias() {
        let cli =
            Cli::try_parse_from(["hireflow", "serve", "--log-level", "warning"]).unwrap();
        match cli.command {
            Some(Commands::Serve { log_level, .. }) => {
                assert_eq!(log_level.map(LogLevel::as_str), Some("warn"))
            }
            other => panic!("Expected Serve command, got {other:?}"),
        }
    }
}
