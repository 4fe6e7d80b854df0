//! Serve command handler

use crate::config::settings::Settings;
use crate::error::AppResult;
use crate::server::Server;

pub struct ServeCommandHandler {
    config: Settings,
}

impl ServeCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Start the server, or with `dry_run` only report what would start
    pub async fn execute(self, dry_run: bool) -> AppResult<()> {
        self.config.validate()?;

        if dry_run {
            self.describe();
            return Ok(());
        }

        Server::new(self.config).run().await?;
        Ok(())
    }

    fn describe(&self) {
        println!("Configuration is valid");
        println!("Server would bind to: {}", self.config.server.address());
        if self.config.database.in_memory {
            println!("Postings and applications would be kept in memory");
        }
        if self.config.worker.enabled {
            println!(
                "Task worker would poll {} for {:?}",
                self.config.engine.base_url, self.config.worker.task_types
            );
        } else {
            println!("Task worker disabled");
        }
        println!("Dry run completed");
    }

    pub fn config(&self) -> &Settings {
        &self.config
    }
}
