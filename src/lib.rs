// Library module for hashtally
// Re-exports modules for use in integration tests and the binary

pub mod cli;
pub mod inventory;
pub mod logging;
pub mod progress;
pub mod settings;
