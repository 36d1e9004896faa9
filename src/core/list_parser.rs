// Turns .talon-list files (and the flat list table) into list item inputs
//
// The list name comes from where the file lives, not from what's in it.

use crate::db::models::{limits, truncate_with_marker, ListItemInput};

const LIST_EXTENSION: &str = ".talon-list";
const LIST_PREFIX: &str = "user.";

pub struct ListParser;

impl ListParser {
    /// Parse a .talon-list file
    ///
    /// Each `spoken form: value` line becomes one item. Blank lines, `#` and
    /// `//` comments, lines without a colon and lines with an empty side are
    /// skipped.
    pub fn parse_list_file(file_path: &str, content: &str) -> Vec<ListItemInput> {
        let list_name = truncate_with_marker(&list_name_from_path(file_path), limits::LIST_NAME);

        let items: Vec<ListItemInput> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with("//"))
            .filter_map(|line| line.split_once(':'))
            .filter_map(|(spoken, value)| build_item(&list_name, spoken, value, file_path))
            .collect();

        tracing::debug!(file = file_path, list = %list_name, items = items.len(), "parsed list file");
        items
    }

    /// Parse the flat `listName,spokenForm,listValue` table format
    ///
    /// Double quotes group a field so commas inside them don't split it.
    /// Lines with fewer than three fields are skipped.
    pub fn parse_csv_content(file_path: &str, content: &str) -> Vec<ListItemInput> {
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| {
                let fields = split_csv_line(line);
                if fields.len() < 3 {
                    return None;
                }
                let list_name = truncate_with_marker(fields[0].trim(), limits::LIST_NAME);
                build_item(&list_name, &fields[1], &fields[2], file_path)
            })
            .collect()
    }
}

fn build_item(list_name: &str, spoken: &str, value: &str, file_path: &str) -> Option<ListItemInput> {
    let spoken = spoken.trim();
    let value = value.trim();
    if list_name.is_empty() || spoken.is_empty() || value.is_empty() {
        return None;
    }

    Some(ListItemInput {
        list_name: list_name.to_string(),
        spoken_form: truncate_with_marker(spoken, limits::SPOKEN_FORM),
        list_value: truncate_with_marker(value, limits::LIST_VALUE),
        source_file: Some(truncate_with_marker(file_path, limits::SOURCE_FILE)),
        ..Default::default()
    })
}

/// List name for a file: its path below `user/`, extension dropped,
/// with a `user.` prefix if it doesn't have one
///
/// `.../user/emoji.talon-list` gives `user.emoji`,
/// `.../user/apps/browser.talon-list` gives `user.apps/browser`.
pub fn list_name_from_path(file_path: &str) -> String {
    let segments: Vec<&str> = file_path
        .split(['/', '\\'])
        .filter(|segment| !segment.is_empty())
        .collect();

    let relative = match segments.iter().position(|segment| *segment == "user") {
        Some(idx) if idx + 1 < segments.len() => segments[idx + 1..].join("/"),
        _ => segments.last().map(|s| s.to_string()).unwrap_or_default(),
    };

    let name = relative.strip_suffix(LIST_EXTENSION).unwrap_or(&relative);
    if name.starts_with(LIST_PREFIX) {
        name.to_string()
    } else {
        format!("{}{}", LIST_PREFIX, name)
    }
}

// Split on commas outside double quotes. A quote after a backslash is kept
// as a literal character.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut prev: Option<char> = None;

    for ch in line.chars() {
        match ch {
            '"' if prev != Some('\\') => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
        prev = Some(ch);
    }
    fields.push(current);
    fields
}
