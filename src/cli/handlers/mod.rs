//! Command handlers for CLI operations

pub mod close;
pub mod migrate;
pub mod serve;
pub mod worker;

pub use close::CloseCommandHandler;
pub use migrate::MigrateCommandHandler;
pub use serve::ServeCommandHandler;
pub use worker::WorkerCommandHandler;
