/// Record store module for talon-search
///
/// Holds parsed commands and list items in memory, with an optional
/// JSON snapshot as the backing medium.

pub mod connection;
pub mod models;
pub mod queries;
pub mod store;

pub use connection::{Database, DatabaseStats};
pub use models::*;
pub use store::RecordStore;
