/// Command searcher
///
/// Filters the record store by exact/substring criteria, then by a search
/// term in one of four scopes. Results keep store order and are cut at
/// `max_results`. No fuzzy matching, no re-ranking.

use crate::db::models::{CommandRecord, ListItem, GLOBAL_APPLICATION};
use crate::db::{Database, RecordStore};
use crate::error::SearchError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

/// Default cap on returned records
pub const DEFAULT_MAX_RESULTS: usize = 500;

/// Which fields the search term is matched against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum SearchScope {
    /// Spoken part of the trigger, before any `<`, `{` or `(`
    CommandNamesOnly,
    /// Script body only
    ScriptOnly,
    /// Trigger, script, application, title, tags and list placeholders
    #[default]
    All,
    /// Spoken part of the trigger, plus list placeholders
    SpokenForms,
}

impl SearchScope {
    pub fn code(self) -> u8 {
        match self {
            SearchScope::CommandNamesOnly => 0,
            SearchScope::ScriptOnly => 1,
            SearchScope::All => 2,
            SearchScope::SpokenForms => 3,
        }
    }
}

impl TryFrom<u8> for SearchScope {
    type Error = SearchError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(SearchScope::CommandNamesOnly),
            1 => Ok(SearchScope::ScriptOnly),
            2 => Ok(SearchScope::All),
            3 => Ok(SearchScope::SpokenForms),
            other => Err(SearchError::InvalidScope(other.to_string())),
        }
    }
}

impl From<SearchScope> for u8 {
    fn from(scope: SearchScope) -> u8 {
        scope.code()
    }
}

impl FromStr for SearchScope {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(code) = s.parse::<u8>() {
            return SearchScope::try_from(code);
        }
        match s.to_lowercase().as_str() {
            "names" | "commands" | "command_names" => Ok(SearchScope::CommandNamesOnly),
            "script" | "scripts" => Ok(SearchScope::ScriptOnly),
            "all" => Ok(SearchScope::All),
            "spoken" | "spoken_forms" => Ok(SearchScope::SpokenForms),
            _ => Err(SearchError::InvalidScope(s.to_string())),
        }
    }
}

impl fmt::Display for SearchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SearchScope::CommandNamesOnly => "names",
            SearchScope::ScriptOnly => "script",
            SearchScope::All => "all",
            SearchScope::SpokenForms => "spoken",
        };
        write!(f, "{}", s)
    }
}

/// Everything a command search can be narrowed by
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchOptions {
    pub search_term: String,
    pub scope: SearchScope,
    pub application: Option<String>,
    pub mode: Option<String>,
    pub repository: Option<String>,
    pub tag: Option<String>,
    pub operating_system: Option<String>,
    pub title: Option<String>,
    pub code_language: Option<String>,
    pub max_results: usize,
    pub preferred_applications: Vec<String>,
    pub excluded_operating_systems: Vec<String>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            scope: SearchScope::default(),
            application: None,
            mode: None,
            repository: None,
            tag: None,
            operating_system: None,
            title: None,
            code_language: None,
            max_results: DEFAULT_MAX_RESULTS,
            preferred_applications: Vec::new(),
            excluded_operating_systems: Vec::new(),
        }
    }
}

impl SearchOptions {
    pub fn new(term: &str) -> Self {
        Self {
            search_term: term.to_string(),
            ..Default::default()
        }
    }

    pub fn with_scope(mut self, scope: SearchScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }
}

// Treat "" the same as not set
fn filter_value(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn lowered_set(values: &[String]) -> HashSet<String> {
    values.iter().map(|v| v.to_lowercase()).collect()
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[{<]([^}>]+)[}>]").expect("placeholder pattern is valid"))
}

/// Names referenced by `<name>` / `{name}` placeholders in a trigger
pub fn placeholders(command: &str) -> Vec<&str> {
    placeholder_regex()
        .captures_iter(command)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect()
}

/// Matches a search term against the lists a command's placeholders refer to
///
/// Built once per query: it indexes list items by name so each command only
/// costs a few hash lookups.
pub struct PlaceholderResolver<'a> {
    known_lists: Vec<&'a str>,
    items_by_list: HashMap<&'a str, Vec<&'a ListItem>>,
    term: String,
    words: Vec<String>,
}

impl<'a> PlaceholderResolver<'a> {
    /// `term` is expected trimmed and lower-cased
    pub fn new(items: &'a [ListItem], term: &str) -> Self {
        let mut known_lists = Vec::new();
        let mut items_by_list: HashMap<&str, Vec<&ListItem>> = HashMap::new();
        for item in items {
            let entry = items_by_list.entry(item.list_name.as_str()).or_default();
            if entry.is_empty() {
                known_lists.push(item.list_name.as_str());
            }
            entry.push(item);
        }

        Self {
            known_lists,
            items_by_list,
            term: term.to_string(),
            words: term.split_whitespace().map(str::to_string).collect(),
        }
    }

    /// Stored list a placeholder name refers to
    ///
    /// Exact name first; otherwise the first list whose last path/dot
    /// segment equals the placeholder's last dot segment, so
    /// `user.arrow_key` finds `user.community/core/keys/arrow_key`.
    pub fn resolve(&self, raw_name: &str) -> Option<&'a str> {
        if let Some((name, _)) = self.items_by_list.get_key_value(raw_name) {
            return Some(*name);
        }

        let base = raw_name.rsplit('.').next().filter(|b| !b.is_empty())?;
        self.known_lists.iter().copied().find(|name| {
            let last = name.rsplit('/').next().unwrap_or(name);
            last.rsplit('.').next() == Some(base)
        })
    }

    /// True if any placeholder in `command` resolves to a list with an item
    /// matching the term
    pub fn matches(&self, command: &str) -> bool {
        if self.words.is_empty() {
            return false;
        }

        placeholders(command)
            .into_iter()
            .filter_map(|raw| self.resolve(raw))
            .any(|list| self.list_matches(list))
    }

    fn list_matches(&self, list: &str) -> bool {
        let Some(items) = self.items_by_list.get(list) else {
            return false;
        };

        items.iter().any(|item| {
            let spoken = item.spoken_form.to_lowercase();
            let value = item.list_value.to_lowercase();
            let multi_word_hit = spoken.contains(' ') && self.term == spoken;
            multi_word_hit
                || self.words.iter().any(|word| {
                    spoken == *word || spoken.contains(word.as_str()) || value.contains(word.as_str())
                })
        })
    }
}

fn passes_filters(
    cmd: &CommandRecord,
    options: &SearchOptions,
    preferred: &HashSet<String>,
    excluded_os: &HashSet<String>,
) -> bool {
    let application = filter_value(&options.application);
    let operating_system = filter_value(&options.operating_system);

    if let Some(app) = application {
        if cmd.application != app {
            return false;
        }
    }
    if let Some(mode) = filter_value(&options.mode) {
        if !cmd.mode.as_deref().is_some_and(|m| m.contains(mode)) {
            return false;
        }
    }
    if let Some(repo) = filter_value(&options.repository) {
        if cmd.repository.as_deref() != Some(repo) {
            return false;
        }
    }
    if let Some(tag) = filter_value(&options.tag) {
        if !cmd.tag_list().contains(&tag) {
            return false;
        }
    }
    if let Some(os) = operating_system {
        if cmd.operating_system.as_deref() != Some(os) {
            return false;
        }
    }
    if let Some(title) = filter_value(&options.title) {
        if cmd.title.as_deref() != Some(title) {
            return false;
        }
    }
    if let Some(lang) = filter_value(&options.code_language) {
        if cmd.code_language.as_deref() != Some(lang) {
            return false;
        }
    }

    if application.is_none() && !preferred.is_empty() {
        let app = cmd.application.to_lowercase();
        if app != GLOBAL_APPLICATION && !preferred.contains(&app) {
            return false;
        }
    }
    if operating_system.is_none() && !excluded_os.is_empty() {
        if let Some(os) = &cmd.operating_system {
            if excluded_os.contains(&os.to_lowercase()) {
                return false;
            }
        }
    }

    true
}

fn matches_term(
    cmd: &CommandRecord,
    scope: SearchScope,
    term: &str,
    resolver: &PlaceholderResolver<'_>,
) -> bool {
    let contains = |field: &str| field.to_lowercase().contains(term);
    let opt_contains = |field: &Option<String>| field.as_deref().is_some_and(|f| contains(f));

    match scope {
        SearchScope::CommandNamesOnly => contains(cmd.spoken_name()),
        SearchScope::ScriptOnly => contains(&cmd.script),
        SearchScope::SpokenForms => contains(cmd.spoken_name()) || resolver.matches(&cmd.command),
        SearchScope::All => {
            contains(&cmd.command)
                || contains(&cmd.script)
                || contains(&cmd.application)
                || opt_contains(&cmd.title)
                || opt_contains(&cmd.tags)
                || resolver.matches(&cmd.command)
        }
    }
}

/// Run a command search over one store snapshot
pub fn search_commands(store: &RecordStore, options: &SearchOptions) -> Vec<CommandRecord> {
    let preferred = lowered_set(&options.preferred_applications);
    let excluded_os = lowered_set(&options.excluded_operating_systems);
    let term = options.search_term.trim().to_lowercase();
    let resolver = PlaceholderResolver::new(store.list_items(), &term);

    let results: Vec<CommandRecord> = store
        .commands()
        .iter()
        .filter(|cmd| passes_filters(cmd, options, &preferred, &excluded_os))
        .filter(|cmd| term.is_empty() || matches_term(cmd, options.scope, &term, &resolver))
        .take(options.max_results)
        .cloned()
        .collect();

    tracing::debug!(
        scope = %options.scope,
        term = %term,
        results = results.len(),
        "command search"
    );
    results
}

/// Search list items by name, spoken form, value or source file
pub fn search_list_items(store: &RecordStore, term: &str, max_results: usize) -> Vec<ListItem> {
    let term = term.trim().to_lowercase();
    let contains = |field: &str| field.to_lowercase().contains(&term);

    store
        .list_items()
        .iter()
        .filter(|item| {
            term.is_empty()
                || contains(&item.list_name)
                || contains(&item.spoken_form)
                || contains(&item.list_value)
                || item.source_file.as_deref().is_some_and(|f| contains(f))
        })
        .take(max_results)
        .cloned()
        .collect()
}

/// Handles searching against a shared database
pub struct Searcher {
    db: Arc<Database>,
}

impl Searcher {
    /// Create a new searcher instance
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Search commands
    ///
    /// # Arguments
    /// * `options` - Term, scope, filters and result cap
    ///
    /// # Returns
    /// * Matching commands in store order, at most `options.max_results`
    pub fn search(&self, options: &SearchOptions) -> Vec<CommandRecord> {
        search_commands(&self.db.read(), options)
    }

    /// Search list items
    pub fn search_lists(&self, term: &str, max_results: usize) -> Vec<ListItem> {
        search_list_items(&self.db.read(), term, max_results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{CommandInput, ListItemInput};

    fn command(cmd: &str, script: &str) -> CommandInput {
        CommandInput::new(cmd, script, "/home/u/.talon/user/community/a.talon")
    }

    fn store_with(commands: Vec<CommandInput>, lists: Vec<ListItemInput>) -> RecordStore {
        let mut store = RecordStore::new();
        store.insert_commands_batch(commands);
        store.insert_list_items_batch(lists);
        store
    }

    fn found(store: &RecordStore, options: SearchOptions) -> Vec<String> {
        search_commands(store, &options)
            .into_iter()
            .map(|c| c.command)
            .collect()
    }

    #[test]
    fn test_scope_semantics() {
        let store = store_with(vec![command("snap left", "action()")], vec![]);

        let names = SearchOptions::new("snap").with_scope(SearchScope::CommandNamesOnly);
        assert_eq!(found(&store, names).len(), 1);

        let script = SearchOptions::new("snap").with_scope(SearchScope::ScriptOnly);
        assert!(found(&store, script).is_empty());

        let script = SearchOptions::new("action").with_scope(SearchScope::ScriptOnly);
        assert_eq!(found(&store, script).len(), 1);
    }

    #[test]
    fn test_command_names_ignore_placeholder_text() {
        let store = store_with(vec![command("insert <user.text>", "insert(text)")], vec![]);

        let options = SearchOptions::new("text").with_scope(SearchScope::CommandNamesOnly);
        assert!(found(&store, options).is_empty());

        let options = SearchOptions::new("INSERT").with_scope(SearchScope::CommandNamesOnly);
        assert_eq!(found(&store, options).len(), 1);
    }

    #[test]
    fn test_placeholder_resolution_through_nested_list() {
        let store = store_with(
            vec![command("game <user.arrow_key>", "key(arrow_key)"), command("other", "x()")],
            vec![ListItemInput::new("user.community/core/keys/arrow_key", "left", "Left")],
        );

        for scope in [SearchScope::All, SearchScope::SpokenForms] {
            let results = found(&store, SearchOptions::new("left").with_scope(scope));
            assert_eq!(results, vec!["game <user.arrow_key>"], "scope {}", scope);
        }

        let names = SearchOptions::new("left").with_scope(SearchScope::CommandNamesOnly);
        assert!(found(&store, names).is_empty());
    }

    #[test]
    fn test_placeholder_exact_list_name_and_braces() {
        let store = store_with(
            vec![command("emoji {user.emoji}", "insert(emoji)")],
            vec![
                ListItemInput::new("user.emoji", "angry", "😠"),
                ListItemInput::new("user.other", "happy", "😀"),
            ],
        );

        assert_eq!(found(&store, SearchOptions::new("angry")).len(), 1);
        assert!(found(&store, SearchOptions::new("happy")).is_empty());
        // Value side matches too
        assert_eq!(found(&store, SearchOptions::new("😠")).len(), 1);
    }

    #[test]
    fn test_placeholder_multi_word_term() {
        let store = store_with(
            vec![command("insert <user.emoji>", "insert(emoji)")],
            vec![ListItemInput::new("user.emoji", "happy", "😀")],
        );

        let options = SearchOptions::new("insert happy").with_scope(SearchScope::SpokenForms);
        assert_eq!(found(&store, options).len(), 1);
    }

    #[test]
    fn test_unresolved_placeholder_does_not_match() {
        let store = store_with(vec![command("go <user.missing>", "x()")], vec![
            ListItemInput::new("user.emoji", "left", "L"),
        ]);
        let options = SearchOptions::new("left").with_scope(SearchScope::SpokenForms);
        assert!(found(&store, options).is_empty());
    }

    #[test]
    fn test_resolver_prefers_exact_then_first_base_match() {
        let items = vec![
            ListItem::from_input(1, ListItemInput::new("user.a/arrow_key", "up", "Up")),
            ListItem::from_input(2, ListItemInput::new("user.b/arrow_key", "down", "Down")),
            ListItem::from_input(3, ListItemInput::new("user.arrow_key", "left", "Left")),
        ];
        let resolver = PlaceholderResolver::new(&items, "x");

        assert_eq!(resolver.resolve("user.arrow_key"), Some("user.arrow_key"));
        assert_eq!(resolver.resolve("self.arrow_key"), Some("user.a/arrow_key"));
        assert_eq!(resolver.resolve("user.nothing"), None);
        assert_eq!(resolver.resolve("user."), None);
    }

    #[test]
    fn test_placeholders_extraction() {
        assert_eq!(
            placeholders("move <user.arrow_key> {user.number} (up | down)"),
            vec!["user.arrow_key", "user.number"]
        );
        assert!(placeholders("plain words").is_empty());
    }

    #[test]
    fn test_all_scope_fields() {
        let mut with_title = command("alpha", "one()");
        with_title.title = Some("Gmail".to_string());
        let mut with_tags = command("beta", "two()");
        with_tags.tags = Some("user.browser".to_string());
        let mut with_app = command("gamma", "three()");
        with_app.application = Some("Chrome".to_string());
        let store = store_with(vec![with_title, with_tags, with_app], vec![]);

        assert_eq!(found(&store, SearchOptions::new("gmail")), vec!["alpha"]);
        assert_eq!(found(&store, SearchOptions::new("BROWSER")), vec!["beta"]);
        assert_eq!(found(&store, SearchOptions::new("chrome")), vec!["gamma"]);
        assert_eq!(found(&store, SearchOptions::new("three")), vec!["gamma"]);
    }

    #[test]
    fn test_hard_filters() {
        let mut a = command("a", "");
        a.application = Some("chrome".to_string());
        a.mode = Some("command, dictation".to_string());
        a.tags = Some("user.tabs, user.browser".to_string());
        a.operating_system = Some("windows".to_string());
        a.title = Some("Inbox".to_string());
        a.code_language = Some("python".to_string());
        let mut b = command("b", "");
        b.repository = Some("knausj".to_string());
        let store = store_with(vec![a, b], vec![]);

        fn opts(f: impl FnOnce(&mut SearchOptions)) -> SearchOptions {
            let mut o = SearchOptions::default();
            f(&mut o);
            o
        }

        assert_eq!(found(&store, opts(|o| o.application = Some("chrome".into()))), vec!["a"]);
        assert!(found(&store, opts(|o| o.application = Some("Chrome".into()))).is_empty());
        assert_eq!(found(&store, opts(|o| o.mode = Some("dictation".into()))), vec!["a"]);
        assert_eq!(found(&store, opts(|o| o.tag = Some("user.browser".into()))), vec!["a"]);
        assert!(found(&store, opts(|o| o.tag = Some("user.brow".into()))).is_empty());
        assert_eq!(found(&store, opts(|o| o.operating_system = Some("windows".into()))), vec!["a"]);
        assert_eq!(found(&store, opts(|o| o.title = Some("Inbox".into()))), vec!["a"]);
        assert_eq!(found(&store, opts(|o| o.code_language = Some("python".into()))), vec!["a"]);
        assert_eq!(found(&store, opts(|o| o.repository = Some("knausj".into()))), vec!["b"]);
        assert_eq!(found(&store, opts(|o| o.application = Some(String::new()))).len(), 2);
    }

    #[test]
    fn test_preferred_applications() {
        let mut chrome = command("chrome thing", "");
        chrome.application = Some("Chrome".to_string());
        let mut code = command("code thing", "");
        code.application = Some("vscode".to_string());
        let global = command("global thing", "");
        let store = store_with(vec![chrome, code, global], vec![]);

        let mut options = SearchOptions::default();
        options.preferred_applications = vec!["CHROME".to_string()];
        assert_eq!(found(&store, options.clone()), vec!["chrome thing", "global thing"]);

        // An explicit application filter overrides the preference
        options.application = Some("vscode".to_string());
        assert_eq!(found(&store, options), vec!["code thing"]);
    }

    #[test]
    fn test_excluded_operating_systems() {
        let mut mac = command("mac thing", "");
        mac.operating_system = Some("Mac".to_string());
        let mut win = command("win thing", "");
        win.operating_system = Some("windows".to_string());
        let any = command("any thing", "");
        let store = store_with(vec![mac, win, any], vec![]);

        let mut options = SearchOptions::default();
        options.excluded_operating_systems = vec!["mac".to_string()];
        assert_eq!(found(&store, options.clone()), vec!["win thing", "any thing"]);

        options.operating_system = Some("Mac".to_string());
        assert_eq!(found(&store, options), vec!["mac thing"]);
    }

    #[test]
    fn test_max_results_truncation() {
        let inputs = (0..600).map(|i| command(&format!("cmd {}", i), "")).collect();
        let store = store_with(inputs, vec![]);

        let results = search_commands(&store, &SearchOptions::new("cmd"));
        assert_eq!(results.len(), DEFAULT_MAX_RESULTS);
        let ids: Vec<i64> = results.iter().map(|c| c.id).collect();
        assert_eq!(ids, (1..=500).collect::<Vec<i64>>());

        let results = search_commands(&store, &SearchOptions::new("cmd").with_max_results(3));
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn test_empty_term_returns_everything() {
        let inputs = (0..10).map(|i| command(&format!("cmd {}", i), "")).collect();
        let store = store_with(inputs, vec![]);

        assert_eq!(search_commands(&store, &SearchOptions::new("")).len(), 10);
        assert_eq!(search_commands(&store, &SearchOptions::new("   ")).len(), 10);
    }

    #[test]
    fn test_search_list_items() {
        let mut store = RecordStore::new();
        store.insert_list_items_batch(vec![
            ListItemInput::new("user.emoji", "angry", "😠").with_source("/u/user/emoji.talon-list"),
            ListItemInput::new("user.arrow_key", "left", "Left"),
            ListItemInput::new("user.arrow_key", "right", "Right"),
        ]);

        assert_eq!(search_list_items(&store, "EMOJI", 500).len(), 1);
        assert_eq!(search_list_items(&store, "arrow", 500).len(), 2);
        assert_eq!(search_list_items(&store, "right", 500).len(), 1);
        assert_eq!(search_list_items(&store, "", 500).len(), 3);
        assert_eq!(search_list_items(&store, "", 2).len(), 2);
        assert_eq!(search_list_items(&store, "talon-list", 500).len(), 1);
    }

    #[test]
    fn test_scope_parsing() {
        assert_eq!("0".parse::<SearchScope>().unwrap(), SearchScope::CommandNamesOnly);
        assert_eq!("script".parse::<SearchScope>().unwrap(), SearchScope::ScriptOnly);
        assert_eq!("ALL".parse::<SearchScope>().unwrap(), SearchScope::All);
        assert_eq!("3".parse::<SearchScope>().unwrap(), SearchScope::SpokenForms);
        assert!("7".parse::<SearchScope>().is_err());
        assert!("everything".parse::<SearchScope>().is_err());
        assert_eq!(SearchScope::default(), SearchScope::All);
    }

    #[test]
    fn test_options_deserialize_from_host_message() {
        let options: SearchOptions = serde_json::from_str(
            r#"{"searchTerm":"left","scope":0,"preferredApplications":["chrome"]}"#,
        )
        .unwrap();
        assert_eq!(options.scope, SearchScope::CommandNamesOnly);
        assert_eq!(options.max_results, DEFAULT_MAX_RESULTS);
        assert_eq!(options.preferred_applications, vec!["chrome"]);

        let bad = serde_json::from_str::<SearchOptions>(r#"{"scope":9}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_searcher_uses_shared_database() {
        let db = Arc::new(Database::in_memory());
        db.insert_command(command("snap left", "action()"));
        let searcher = Searcher::new(Arc::clone(&db));

        assert_eq!(searcher.search(&SearchOptions::new("snap")).len(), 1);
        assert!(searcher.search_lists("anything", 10).is_empty());
    }
}
