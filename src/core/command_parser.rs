// Turns a .talon file into command inputs
//
// Header lines come before a line that is just "-", commands come after.
// Anything we don't recognise gets skipped, never reported as an error.

use crate::db::models::{limits, truncate_chars, CommandInput, GLOBAL_APPLICATION};

const HEADER_DELIMITER: &str = "-";

// Header values we copy straight into a field. Last one wins.
#[derive(Debug, Default)]
struct Header {
    applications: Vec<String>,
    mode: Option<String>,
    operating_system: Option<String>,
    tags: Option<String>,
    title: Option<String>,
    code_language: Option<String>,
    language: Option<String>,
    hostname: Option<String>,
}

impl Header {
    fn apply(&mut self, line: &str) {
        if let Some(app) = parse_application(line) {
            if !self.applications.contains(&app) {
                self.applications.push(app);
            }
            return;
        }

        let (slot, value) = if let Some(v) = line.strip_prefix("mode:") {
            (&mut self.mode, v)
        } else if let Some(v) = line.strip_prefix("os:") {
            (&mut self.operating_system, v)
        } else if let Some(v) = line.strip_prefix("tag:") {
            (&mut self.tags, v)
        } else if let Some(v) = line.strip_prefix("title:") {
            (&mut self.title, v)
        } else if let Some(v) = line.strip_prefix("code.language:") {
            (&mut self.code_language, v)
        } else if let Some(v) = line.strip_prefix("language:") {
            (&mut self.language, v)
        } else if let Some(v) = line.strip_prefix("hostname:") {
            (&mut self.hostname, v)
        } else {
            return;
        };

        let value = value.trim();
        *slot = (!value.is_empty()).then(|| value.to_string());
    }
}

// A command we've started but not finished reading
struct Pending {
    command: String,
    script: Vec<String>,
}

pub struct CommandParser;

impl CommandParser {
    /// Parse one .talon file into command inputs
    ///
    /// # Arguments
    /// * `file_path` - Absolute path of the file, used for `filePath` and `repository`
    /// * `content` - Raw file text
    ///
    /// # Returns
    /// * Zero or more commands. A file with no "-" line yields none.
    pub fn parse(file_path: &str, content: &str) -> Vec<CommandInput> {
        let repository = extract_repository(file_path);
        let mut header = Header::default();
        let mut in_header = true;
        let mut pending: Option<Pending> = None;
        let mut finished: Vec<Pending> = Vec::new();

        for line in content.lines() {
            let trimmed = line.trim();

            if in_header {
                if trimmed == HEADER_DELIMITER {
                    in_header = false;
                } else {
                    header.apply(trimmed);
                }
                continue;
            }

            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let indented = line.starts_with(' ') || line.starts_with('\t');
            if !indented {
                if let Some((name, rest)) = trimmed.split_once(':') {
                    finished.extend(pending.take());
                    let rest = rest.trim();
                    pending = Some(Pending {
                        command: name.trim().to_string(),
                        script: if rest.is_empty() {
                            Vec::new()
                        } else {
                            vec![rest.to_string()]
                        },
                    });
                }
            } else if let Some(current) = pending.as_mut() {
                current.script.push(trimmed.to_string());
            }
        }
        finished.extend(pending);

        tracing::debug!(
            file = file_path,
            applications = ?header.applications,
            commands = finished.len(),
            "parsed command file"
        );

        finished
            .into_iter()
            .filter(|p| !p.command.is_empty())
            .map(|p| build_input(p, &header, file_path, repository.as_deref()))
            .collect()
    }
}

fn build_input(
    pending: Pending,
    header: &Header,
    file_path: &str,
    repository: Option<&str>,
) -> CommandInput {
    let applications: Vec<String> = header
        .applications
        .iter()
        .map(|app| truncate_chars(app, limits::APPLICATION))
        .collect();
    let clamp = |value: &Option<String>, max: usize| value.as_deref().map(|v| truncate_chars(v, max));

    CommandInput {
        command: truncate_chars(&pending.command, limits::COMMAND),
        script: truncate_chars(&pending.script.join("\n"), limits::SCRIPT),
        application: Some(
            applications
                .first()
                .cloned()
                .unwrap_or_else(|| GLOBAL_APPLICATION.to_string()),
        ),
        applications,
        title: clamp(&header.title, limits::TITLE),
        mode: clamp(&header.mode, limits::MODE),
        operating_system: clamp(&header.operating_system, limits::OPERATING_SYSTEM),
        tags: clamp(&header.tags, limits::TAGS),
        code_language: clamp(&header.code_language, limits::CODE_LANGUAGE),
        language: clamp(&header.language, limits::LANGUAGE),
        hostname: clamp(&header.hostname, limits::HOSTNAME),
        file_path: truncate_chars(file_path, limits::FILE_PATH),
        repository: repository.map(|r| truncate_chars(r, limits::REPOSITORY)),
        created_at: None,
    }
}

/// Application named by an `app:`, `app.name:` or `app.exe:` header line
///
/// PowerShell and terminal variants collapse to one name each.
pub fn parse_application(line: &str) -> Option<String> {
    let value = if let Some(v) = line.strip_prefix("app.name:") {
        v.trim().to_string()
    } else if let Some(v) = line.strip_prefix("app.exe:") {
        strip_exe(v.trim()).to_string()
    } else if let Some(v) = line.strip_prefix("app:") {
        v.trim().to_string()
    } else {
        return None;
    };

    if value.is_empty() {
        return None;
    }

    let lower = value.to_lowercase();
    if lower.contains("powershell") {
        Some("powershell".to_string())
    } else if lower.contains("terminal") {
        Some("windows_terminal".to_string())
    } else {
        Some(value)
    }
}

fn strip_exe(value: &str) -> &str {
    let cut = value.len().saturating_sub(".exe".len());
    match value.get(cut..) {
        Some(ext) if ext.eq_ignore_ascii_case(".exe") => &value[..cut],
        _ => value,
    }
}

/// Folder right below the `user` directory, e.g. "community"
///
/// Only counts if it is a directory, i.e. something follows it in the path.
pub fn extract_repository(file_path: &str) -> Option<String> {
    let normalized = file_path.replace('\\', "/");
    let segments: Vec<&str> = normalized.split('/').collect();
    let user_idx = segments
        .iter()
        .position(|segment| segment.eq_ignore_ascii_case("user"))?;

    let repo_idx = user_idx + 1;
    if repo_idx + 1 >= segments.len() || segments[repo_idx].is_empty() {
        return None;
    }
    Some(segments[repo_idx].to_string())
}
