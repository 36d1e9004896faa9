/// Data models for indexed records
///
/// Inputs come from the parsers (no id yet), records are what the store hands
/// back. Every field is clamped to its limit when a record is built, never
/// at query time.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Application scope used when a file declares none
pub const GLOBAL_APPLICATION: &str = "global";

/// Field length limits, in characters
pub mod limits {
    pub const COMMAND: usize = 200;
    pub const SCRIPT: usize = 2000;
    pub const APPLICATION: usize = 200;
    pub const TITLE: usize = 200;
    pub const MODE: usize = 300;
    pub const OPERATING_SYSTEM: usize = 100;
    pub const FILE_PATH: usize = 500;
    pub const REPOSITORY: usize = 200;
    pub const TAGS: usize = 500;
    pub const CODE_LANGUAGE: usize = 100;
    pub const LANGUAGE: usize = 100;
    pub const HOSTNAME: usize = 100;

    pub const LIST_NAME: usize = 100;
    pub const SPOKEN_FORM: usize = 100;
    pub const LIST_VALUE: usize = 700;
    pub const SOURCE_FILE: usize = 250;
}

const TRUNCATION_MARKER: &str = "...";

/// Cut a string down to `max` characters
pub fn truncate_chars(value: &str, max: usize) -> String {
    match value.char_indices().nth(max) {
        Some((byte_idx, _)) => value[..byte_idx].to_string(),
        None => value.to_string(),
    }
}

/// Cut a string down to `max` characters, ending it with "..." if anything was lost
pub fn truncate_with_marker(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }

    let keep = max.saturating_sub(TRUNCATION_MARKER.len());
    let mut out = truncate_chars(value, keep);
    out.push_str(TRUNCATION_MARKER);
    out
}

fn clamp_opt(value: Option<String>, max: usize) -> Option<String> {
    value.map(|v| truncate_chars(&v, max))
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

/// A command as produced by the parser, before the store assigns an id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandInput {
    pub command: String,
    pub script: String,
    pub application: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub applications: Vec<String>,
    pub title: Option<String>,
    pub mode: Option<String>,
    pub operating_system: Option<String>,
    pub tags: Option<String>,
    pub code_language: Option<String>,
    pub language: Option<String>,
    pub hostname: Option<String>,
    pub file_path: String,
    pub repository: Option<String>,
    pub created_at: Option<String>,
}

impl CommandInput {
    /// Minimal input: trigger, action and source file
    pub fn new(command: &str, script: &str, file_path: &str) -> Self {
        Self {
            command: command.to_string(),
            script: script.to_string(),
            file_path: file_path.to_string(),
            ..Default::default()
        }
    }
}

/// A stored voice command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandRecord {
    pub id: i64,
    pub command: String,
    pub script: String,
    pub application: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub applications: Vec<String>,
    pub title: Option<String>,
    pub mode: Option<String>,
    pub operating_system: Option<String>,
    pub tags: Option<String>,
    pub code_language: Option<String>,
    pub language: Option<String>,
    pub hostname: Option<String>,
    pub file_path: String,
    pub repository: Option<String>,
    pub created_at: String,
}

impl CommandRecord {
    /// Build a record from parser output
    ///
    /// An absent or blank application becomes the first of `applications`,
    /// or "global" when there are none; a missing timestamp becomes now.
    pub fn from_input(id: i64, input: CommandInput) -> Self {
        let application = input
            .application
            .filter(|app| !app.trim().is_empty())
            .or_else(|| {
                input
                    .applications
                    .iter()
                    .find(|app| !app.trim().is_empty())
                    .cloned()
            })
            .unwrap_or_else(|| GLOBAL_APPLICATION.to_string());

        Self {
            id,
            command: truncate_chars(&input.command, limits::COMMAND),
            script: truncate_chars(&input.script, limits::SCRIPT),
            application: truncate_chars(&application, limits::APPLICATION),
            applications: input
                .applications
                .iter()
                .map(|app| truncate_chars(app, limits::APPLICATION))
                .collect(),
            title: clamp_opt(input.title, limits::TITLE),
            mode: clamp_opt(input.mode, limits::MODE),
            operating_system: clamp_opt(input.operating_system, limits::OPERATING_SYSTEM),
            tags: clamp_opt(input.tags, limits::TAGS),
            code_language: clamp_opt(input.code_language, limits::CODE_LANGUAGE),
            language: clamp_opt(input.language, limits::LANGUAGE),
            hostname: clamp_opt(input.hostname, limits::HOSTNAME),
            file_path: truncate_chars(&input.file_path, limits::FILE_PATH),
            repository: clamp_opt(input.repository, limits::REPOSITORY),
            created_at: input.created_at.unwrap_or_else(now_rfc3339),
        }
    }

    /// Spoken part of the trigger: everything before the first `<`, `{` or `(`
    pub fn spoken_name(&self) -> &str {
        let end = self
            .command
            .find(['<', '{', '('])
            .unwrap_or(self.command.len());
        self.command[..end].trim()
    }

    /// Individual tags from the comma-separated tag string
    pub fn tag_list(&self) -> Vec<&str> {
        self.tags
            .as_deref()
            .map(|tags| {
                tags.split(',')
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every application scope this record belongs to
    pub fn all_applications(&self) -> Vec<&str> {
        if self.applications.is_empty() {
            vec![self.application.as_str()]
        } else {
            self.applications.iter().map(String::as_str).collect()
        }
    }
}

/// A list entry as produced by the list parser
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItemInput {
    pub list_name: String,
    pub spoken_form: String,
    pub list_value: String,
    pub source_file: Option<String>,
    pub created_at: Option<String>,
    pub imported_at: Option<String>,
}

impl ListItemInput {
    pub fn new(list_name: &str, spoken_form: &str, list_value: &str) -> Self {
        Self {
            list_name: list_name.to_string(),
            spoken_form: spoken_form.to_string(),
            list_value: list_value.to_string(),
            ..Default::default()
        }
    }

    pub fn with_source(mut self, source_file: &str) -> Self {
        self.source_file = Some(source_file.to_string());
        self
    }
}

/// A stored list entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItem {
    pub id: i64,
    pub list_name: String,
    pub spoken_form: String,
    pub list_value: String,
    pub source_file: Option<String>,
    pub created_at: String,
    pub imported_at: String,
}

impl ListItem {
    pub fn from_input(id: i64, input: ListItemInput) -> Self {
        let now = now_rfc3339();
        Self {
            id,
            list_name: truncate_with_marker(&input.list_name, limits::LIST_NAME),
            spoken_form: truncate_with_marker(&input.spoken_form, limits::SPOKEN_FORM),
            list_value: truncate_with_marker(&input.list_value, limits::LIST_VALUE),
            source_file: input
                .source_file
                .map(|path| truncate_with_marker(&path, limits::SOURCE_FILE)),
            created_at: input.created_at.unwrap_or_else(|| now.clone()),
            imported_at: input.imported_at.unwrap_or(now),
        }
    }
}
