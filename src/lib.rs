/// talon-search library
///
/// Indexes Talon voice command files and list files, then searches them.

pub mod config;
pub mod core;
pub mod db;
pub mod error;
pub mod logging;

// Re-exports for convenience
pub use config::Settings;
pub use db::Database;
pub use error::{Result, SearchError};
