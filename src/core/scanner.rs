/// Talon user folder discovery
///
/// Finds the user folder and reads every .talon and .talon-list file below it.

use crate::core::importer::SourceFile;
use crate::error::{Result, SearchError};
use std::path::{Path, PathBuf};

const COMMAND_EXTENSION: &str = "talon";
const LIST_EXTENSION: &str = "talon-list";

/// Files found under a user folder
#[derive(Debug, Default)]
pub struct ScanReport {
    pub command_files: Vec<SourceFile>,
    pub list_files: Vec<SourceFile>,
    /// Entries that could not be read, with the reason
    pub skipped: Vec<(PathBuf, String)>,
}

/// Places Talon keeps its user folder, most likely first
pub fn candidate_user_folders() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    let home = dirs::home_dir();

    if cfg!(windows) {
        if let Some(appdata) = dirs::config_dir() {
            candidates.push(appdata.join("talon").join("user"));
        }
        if let Some(home) = &home {
            candidates.push(home.join("AppData").join("Roaming").join("talon").join("user"));
            candidates.push(home.join(".talon").join("user"));
        }
    } else if let Some(home) = &home {
        candidates.push(home.join(".talon").join("user"));
        candidates.push(home.join("talon").join("user"));
    }

    candidates
}

/// First candidate user folder that exists
pub fn detect_user_folder() -> Option<PathBuf> {
    let found = candidate_user_folders().into_iter().find(|p| p.is_dir());
    match &found {
        Some(path) => tracing::info!(path = %path.display(), "found Talon user folder"),
        None => tracing::debug!("no Talon user folder in standard locations"),
    }
    found
}

enum FileKind {
    Command,
    List,
}

fn classify(path: &Path) -> Option<FileKind> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(COMMAND_EXTENSION) => Some(FileKind::Command),
        Some(LIST_EXTENSION) => Some(FileKind::List),
        _ => None,
    }
}

/// Walk `root` and read every command and list file
///
/// # Returns
/// * `Ok(ScanReport)` - Files sorted by path, plus whatever had to be skipped
/// * `Err(SearchError::UserFolderNotFound)` - If `root` is not a directory
pub async fn scan<P: AsRef<Path>>(root: P) -> Result<ScanReport> {
    let root = root.as_ref();
    if !tokio::fs::metadata(root).await.map(|m| m.is_dir()).unwrap_or(false) {
        return Err(SearchError::UserFolderNotFound(root.display().to_string()));
    }

    let mut report = ScanReport::default();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "failed to scan directory");
                report.skipped.push((dir, e.to_string()));
                continue;
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(dir = %dir.display(), error = %e, "failed to read directory entry");
                    report.skipped.push((dir.clone(), e.to_string()));
                    break;
                }
            };

            let path = entry.path();
            let is_dir = match entry.file_type().await {
                Ok(file_type) => file_type.is_dir(),
                Err(e) => {
                    report.skipped.push((path, e.to_string()));
                    continue;
                }
            };
            if is_dir {
                pending.push(path);
                continue;
            }

            let Some(kind) = classify(&path) else {
                continue;
            };
            match tokio::fs::read_to_string(&path).await {
                Ok(content) => {
                    let file = SourceFile::new(path, content);
                    match kind {
                        FileKind::Command => report.command_files.push(file),
                        FileKind::List => report.list_files.push(file),
                    }
                }
                Err(e) => {
                    tracing::warn!(file = %path.display(), error = %e, "failed to read file");
                    report.skipped.push((path, e.to_string()));
                }
            }
        }
    }

    report.command_files.sort_by(|a, b| a.path.cmp(&b.path));
    report.list_files.sort_by(|a, b| a.path.cmp(&b.path));

    tracing::info!(
        root = %root.display(),
        command_files = report.command_files.len(),
        list_files = report.list_files.len(),
        skipped = report.skipped.len(),
        "scan complete"
    );
    Ok(report)
}
