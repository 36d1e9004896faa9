// Imports parsed files into the database
//
// One bad file never stops the rest of the batch. The whole parsed batch
// goes into the store in a single refresh/insert call.

use crate::core::command_parser::CommandParser;
use crate::core::list_parser::ListParser;
use crate::core::scanner::ScanReport;
use crate::db::{Database, ListItemInput};
use crate::error::{Result, SearchError};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Raw file handed over by whoever found it on disk
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub content: String,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    fn path_str(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

/// Replace what's in the store, or add to it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    Refresh,
    Append,
}

/// What an import did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportSummary {
    pub files_processed: usize,
    pub files_without_records: usize,
    pub records_imported: usize,
    pub total_in_store: usize,
}

pub struct Importer {
    db: Arc<Database>,
}

impl Importer {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Load everything a folder scan found, commands first
    ///
    /// A refresh of a folder without any .talon files is refused before the
    /// store is touched, so a wrong path can't wipe the index.
    pub fn import_scan(
        &self,
        root: &Path,
        report: &ScanReport,
        mode: ImportMode,
    ) -> Result<(ImportSummary, ImportSummary)> {
        if mode == ImportMode::Refresh && report.command_files.is_empty() {
            tracing::warn!(root = %root.display(), "no .talon files found, index left untouched");
            return Err(SearchError::NoCommandFiles(root.display().to_string()));
        }

        let commands = self.import_command_files(&report.command_files, mode);
        let lists = self.import_list_files(&report.list_files, mode);
        Ok((commands, lists))
    }

    /// Parse .talon files and load their commands
    pub fn import_command_files(&self, files: &[SourceFile], mode: ImportMode) -> ImportSummary {
        let mut summary = ImportSummary::default();
        let mut batch = Vec::new();

        for file in files {
            let commands = CommandParser::parse(&file.path_str(), &file.content);
            summary.files_processed += 1;
            if commands.is_empty() {
                // header-only files are normal (settings, tag activation)
                tracing::debug!(file = %file.path.display(), "no commands in file");
                summary.files_without_records += 1;
            }
            batch.extend(commands);
        }

        summary.records_imported = match mode {
            ImportMode::Refresh => self.db.refresh_commands_batch(batch),
            ImportMode::Append => self.db.insert_commands_batch(batch),
        };
        summary.total_in_store = self.db.command_count();

        tracing::info!(
            ?mode,
            files = summary.files_processed,
            imported = summary.records_imported,
            total = summary.total_in_store,
            "command import complete"
        );
        summary
    }

    /// Parse .talon-list files and load their items
    pub fn import_list_files(&self, files: &[SourceFile], mode: ImportMode) -> ImportSummary {
        let mut summary = ImportSummary::default();
        let mut batch = Vec::new();

        for file in files {
            let items = ListParser::parse_list_file(&file.path_str(), &file.content);
            summary.files_processed += 1;
            if items.is_empty() {
                tracing::debug!(file = %file.path.display(), "no list items in file");
                summary.files_without_records += 1;
            }
            batch.extend(items);
        }

        self.load_list_batch(batch, mode, summary)
    }

    /// Load a flat `listName,spokenForm,listValue` table
    pub fn import_list_table(&self, file: &SourceFile, mode: ImportMode) -> ImportSummary {
        let items = ListParser::parse_csv_content(&file.path_str(), &file.content);
        let summary = ImportSummary {
            files_processed: 1,
            files_without_records: usize::from(items.is_empty()),
            ..Default::default()
        };
        self.load_list_batch(items, mode, summary)
    }

    fn load_list_batch(
        &self,
        batch: Vec<ListItemInput>,
        mode: ImportMode,
        mut summary: ImportSummary,
    ) -> ImportSummary {
        summary.records_imported = match mode {
            ImportMode::Refresh => self.db.refresh_list_items_batch(batch),
            ImportMode::Append => self.db.insert_list_items_batch(batch),
        };
        summary.total_in_store = self.db.list_count();

        tracing::info!(
            ?mode,
            files = summary.files_processed,
            imported = summary.records_imported,
            total = summary.total_in_store,
            "list import complete"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scanner;
    use crate::core::searcher::{SearchOptions, SearchScope, Searcher};
    use crate::db::CommandInput;
    use tempfile::TempDir;

    fn talon_files() -> Vec<SourceFile> {
        vec![
            SourceFile::new(
                "/home/u/.talon/user/community/apps/chrome.talon",
                "app: chrome\n-\nopen: key(ctrl-o)\nclose tab: key(ctrl-w)",
            ),
            SourceFile::new(
                "/home/u/.talon/user/community/core/keys.talon",
                "-\ngame <user.arrow_key>:\n    key(arrow_key)",
            ),
            SourceFile::new("/home/u/.talon/user/community/settings.talon", "settings():\n    x = 1"),
        ]
    }

    #[test]
    fn test_import_commands_refresh() {
        let db = Arc::new(Database::in_memory());
        let importer = Importer::new(Arc::clone(&db));

        let summary = importer.import_command_files(&talon_files(), ImportMode::Refresh);
        assert_eq!(summary.files_processed, 3);
        assert_eq!(summary.files_without_records, 1);
        assert_eq!(summary.records_imported, 3);
        assert_eq!(summary.total_in_store, 3);

        // Refreshing again replaces instead of duplicating
        let summary = importer.import_command_files(&talon_files(), ImportMode::Refresh);
        assert_eq!(summary.total_in_store, 3);
    }

    #[test]
    fn test_import_commands_append() {
        let db = Arc::new(Database::in_memory());
        let importer = Importer::new(Arc::clone(&db));

        importer.import_command_files(&talon_files(), ImportMode::Append);
        let summary = importer.import_command_files(&talon_files(), ImportMode::Append);
        assert_eq!(summary.total_in_store, 6);
    }

    #[test]
    fn test_import_lists_then_search_through_placeholder() {
        let db = Arc::new(Database::in_memory());
        let importer = Importer::new(Arc::clone(&db));

        importer.import_command_files(&talon_files(), ImportMode::Refresh);
        let lists = vec![SourceFile::new(
            "/home/u/.talon/user/community/core/keys/arrow_key.talon-list",
            "left: Left\nright: Right\n",
        )];
        let summary = importer.import_list_files(&lists, ImportMode::Refresh);
        assert_eq!(summary.records_imported, 2);

        let searcher = Searcher::new(Arc::clone(&db));
        let results = searcher.search(&SearchOptions::new("left").with_scope(SearchScope::SpokenForms));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].command, "game <user.arrow_key>");
        assert_eq!(results[0].repository.as_deref(), Some("community"));
    }

    #[test]
    fn test_import_list_table() {
        let db = Arc::new(Database::in_memory());
        let importer = Importer::new(Arc::clone(&db));

        let table = SourceFile::new("/tmp/TalonLists.txt", "user.a,one,1\nuser.b,two,2\nbroken\n");
        let summary = importer.import_list_table(&table, ImportMode::Append);
        assert_eq!(summary.records_imported, 2);
        assert_eq!(db.get_list_names(), vec!["user.a", "user.b"]);

        let empty = SourceFile::new("/tmp/empty.txt", "# nothing\n");
        let summary = importer.import_list_table(&empty, ImportMode::Append);
        assert_eq!(summary.files_without_records, 1);
        assert_eq!(summary.total_in_store, 2);
    }

    #[tokio::test]
    async fn test_refresh_from_empty_folder_keeps_index() {
        let db = Arc::new(Database::in_memory());
        let importer = Importer::new(Arc::clone(&db));
        importer.import_command_files(&talon_files(), ImportMode::Refresh);
        importer.import_list_table(
            &SourceFile::new("/tmp/TalonLists.txt", "user.a,one,1"),
            ImportMode::Refresh,
        );

        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("notes.txt"), "nothing to see").unwrap();
        let report = scanner::scan(temp.path()).await.unwrap();

        match importer.import_scan(temp.path(), &report, ImportMode::Refresh) {
            Err(SearchError::NoCommandFiles(_)) => {}
            other => panic!("Expected NoCommandFiles, got {:?}", other.map(|(c, _)| c)),
        }
        assert_eq!(db.command_count(), 3);
        assert_eq!(db.list_count(), 1);

        // Appending nothing is harmless
        let (commands, _) = importer
            .import_scan(temp.path(), &report, ImportMode::Append)
            .unwrap();
        assert_eq!(commands.total_in_store, 3);
    }

    #[tokio::test]
    async fn test_import_scan_refresh() {
        let temp = TempDir::new().unwrap();
        let user = temp.path().join("user");
        std::fs::create_dir_all(user.join("community")).unwrap();
        std::fs::write(user.join("community").join("a.talon"), "-\nhello: x()").unwrap();
        std::fs::write(user.join("letters.talon-list"), "air: a").unwrap();

        let db = Arc::new(Database::in_memory());
        db.insert_command(CommandInput::new("stale", "", "/old.talon"));
        let importer = Importer::new(Arc::clone(&db));

        let report = scanner::scan(&user).await.unwrap();
        let (commands, lists) = importer.import_scan(&user, &report, ImportMode::Refresh).unwrap();
        assert_eq!(commands.total_in_store, 1);
        assert_eq!(lists.total_in_store, 1);
        assert_eq!(db.read().commands()[0].command, "hello");
    }
}
