/// Filter facets and the repository histogram
///
/// Facets are what a UI offers in its filter dropdowns: distinct, non-empty
/// values, de-duplicated and sorted ignoring case.

use crate::db::models::CommandRecord;
use crate::db::{Database, RecordStore};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

/// Label for commands whose file isn't below a repository folder
pub const NO_REPOSITORY: &str = "No Repository";

/// Distinct values for each filterable field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterValues {
    pub applications: Vec<String>,
    pub modes: Vec<String>,
    pub repositories: Vec<String>,
    pub operating_systems: Vec<String>,
    pub titles: Vec<String>,
    pub tags: Vec<String>,
    pub code_languages: Vec<String>,
}

// First spelling of each value wins; order is case-insensitive ascending.
fn distinct_sorted<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out: Vec<String> = values
        .into_iter()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .filter(|v| seen.insert(v.to_lowercase()))
        .map(str::to_string)
        .collect();
    out.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)));
    out
}

fn field<'a>(
    commands: &'a [CommandRecord],
    get: impl Fn(&'a CommandRecord) -> Option<&'a str>,
) -> Vec<String> {
    distinct_sorted(commands.iter().filter_map(get))
}

/// Build every facet from one store snapshot
pub fn filter_values(store: &RecordStore) -> FilterValues {
    let commands = store.commands();

    FilterValues {
        applications: distinct_sorted(commands.iter().flat_map(CommandRecord::all_applications)),
        modes: field(commands, |c| c.mode.as_deref()),
        repositories: field(commands, |c| c.repository.as_deref()),
        operating_systems: field(commands, |c| c.operating_system.as_deref()),
        titles: field(commands, |c| c.title.as_deref()),
        tags: distinct_sorted(commands.iter().flat_map(CommandRecord::tag_list)),
        code_languages: field(commands, |c| c.code_language.as_deref()),
    }
}

/// Command count per repository, exactly as spelled
pub fn repository_breakdown(store: &RecordStore) -> BTreeMap<String, usize> {
    let mut breakdown = BTreeMap::new();
    for cmd in store.commands() {
        let repo = cmd
            .repository
            .as_deref()
            .filter(|r| !r.is_empty())
            .unwrap_or(NO_REPOSITORY);
        *breakdown.entry(repo.to_string()).or_insert(0) += 1;
    }
    breakdown
}

/// Facet queries against a shared database
pub struct FacetBuilder {
    db: Arc<Database>,
}

impl FacetBuilder {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn filter_values(&self) -> FilterValues {
        filter_values(&self.db.read())
    }

    pub fn repository_breakdown(&self) -> BTreeMap<String, usize> {
        repository_breakdown(&self.db.read())
    }

    pub fn list_names(&self) -> Vec<String> {
        self.db.get_list_names()
    }
}
