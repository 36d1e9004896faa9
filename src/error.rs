/// Error types for talon-search
///
/// Parsing and searching never fail. What can fail is talking to the
/// outside world: the snapshot file, the settings file, the user folder.

use thiserror::Error;

/// Main error type for talon-search operations
#[derive(Error, Debug)]
pub enum SearchError {
    /// I/O errors (file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backing medium for the record store could not be opened or read
    #[error("Record store unavailable at {path}: {reason}")]
    StoreInit { path: String, reason: String },

    /// Talon user folder missing or not detectable
    #[error("Talon user folder not found: {0}")]
    UserFolderNotFound(String),

    /// Folder to index holds no .talon files
    #[error("No .talon files found in {0}")]
    NoCommandFiles(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Search scope that is neither a known name nor a code 0-3
    #[error("Invalid search scope: {0}")]
    InvalidScope(String),

    /// Generic error with message
    #[error("{0}")]
    Generic(String),
}

/// Result type alias for talon-search operations
pub type Result<T> = std::result::Result<T, SearchError>;

/// Convert SearchError to a user-friendly error message
impl SearchError {
    pub fn user_message(&self) -> String {
        match self {
            SearchError::Io(e) => {
                format!("File system error. Check permissions. Details: {}", e)
            }
            SearchError::Serialization(e) => {
                format!("Data format error: {}", e)
            }
            SearchError::StoreInit { path, reason } => {
                format!(
                    "Could not open the command index at {}. Running in memory only. Details: {}",
                    path, reason
                )
            }
            SearchError::UserFolderNotFound(path) => {
                format!(
                    "No Talon user folder at '{}'. Set userFolderPath in the settings file or pass a path.",
                    path
                )
            }
            SearchError::NoCommandFiles(path) => {
                format!(
                    "No .talon files found in '{}'. The existing index was left as it is.",
                    path
                )
            }
            SearchError::Config(msg) => {
                format!("Configuration issue: {}", msg)
            }
            SearchError::InvalidScope(scope) => {
                format!(
                    "Unknown search scope '{}'. Use names, script, all or spoken (or 0-3).",
                    scope
                )
            }
            SearchError::Generic(msg) => msg.clone(),
        }
    }
}
