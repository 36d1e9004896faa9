/// In-memory record store
///
/// Owns both collections and their id counters. Records only come in through
/// insert/refresh and only go away through refresh/clear.

use crate::db::models::{CommandInput, CommandRecord, ListItem, ListItemInput};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

const FIRST_ID: i64 = 1;

fn first_id() -> i64 {
    FIRST_ID
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordStore {
    #[serde(default)]
    commands: Vec<CommandRecord>,
    #[serde(default)]
    lists: Vec<ListItem>,
    #[serde(default = "first_id")]
    next_id: i64,
    #[serde(default = "first_id")]
    next_list_id: i64,
}

impl Default for RecordStore {
    fn default() -> Self {
        Self {
            commands: Vec::new(),
            lists: Vec::new(),
            next_id: FIRST_ID,
            next_list_id: FIRST_ID,
        }
    }
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one command, returning its id
    pub fn insert_command(&mut self, input: CommandInput) -> i64 {
        let record = CommandRecord::from_input(self.next_id, input);
        self.next_id += 1;
        let id = record.id;
        self.commands.push(record);
        id
    }

    /// Append a batch of commands. Records are built before anything is
    /// appended, so the collection only ever sees the whole batch.
    pub fn insert_commands_batch(&mut self, inputs: Vec<CommandInput>) -> usize {
        let start = self.next_id;
        let batch: Vec<CommandRecord> = inputs
            .into_iter()
            .enumerate()
            .map(|(offset, input)| CommandRecord::from_input(start + offset as i64, input))
            .collect();

        let count = batch.len();
        self.next_id = start + count as i64;
        self.commands.extend(batch);
        count
    }

    /// Drop every command and reload from `inputs`, ids starting again at 1
    pub fn refresh_commands_batch(&mut self, inputs: Vec<CommandInput>) -> usize {
        let previous = self.commands.len();
        self.clear_all_commands();
        let count = self.insert_commands_batch(inputs);
        tracing::info!(previous, imported = count, "refreshed commands");
        count
    }

    pub fn insert_list_item(&mut self, input: ListItemInput) -> i64 {
        let item = ListItem::from_input(self.next_list_id, input);
        self.next_list_id += 1;
        let id = item.id;
        self.lists.push(item);
        id
    }

    pub fn insert_list_items_batch(&mut self, inputs: Vec<ListItemInput>) -> usize {
        let start = self.next_list_id;
        let batch: Vec<ListItem> = inputs
            .into_iter()
            .enumerate()
            .map(|(offset, input)| ListItem::from_input(start + offset as i64, input))
            .collect();

        let count = batch.len();
        self.next_list_id = start + count as i64;
        self.lists.extend(batch);
        count
    }

    pub fn refresh_list_items_batch(&mut self, inputs: Vec<ListItemInput>) -> usize {
        let previous = self.lists.len();
        self.clear_all_lists();
        let count = self.insert_list_items_batch(inputs);
        tracing::info!(previous, imported = count, "refreshed list items");
        count
    }

    pub fn clear_all_commands(&mut self) {
        self.commands.clear();
        self.next_id = FIRST_ID;
    }

    pub fn clear_all_lists(&mut self) {
        self.lists.clear();
        self.next_list_id = FIRST_ID;
    }

    pub fn clear_all_data(&mut self) {
        self.clear_all_commands();
        self.clear_all_lists();
    }

    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    pub fn list_count(&self) -> usize {
        self.lists.len()
    }

    /// All commands in insertion order
    pub fn commands(&self) -> &[CommandRecord] {
        &self.commands
    }

    /// All list items in insertion order
    pub fn list_items(&self) -> &[ListItem] {
        &self.lists
    }

    /// Distinct list names, sorted
    pub fn list_names(&self) -> Vec<String> {
        self.lists
            .iter()
            .map(|item| item.list_name.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Items of one list, in store order
    pub fn list_items_by_name(&self, list_name: &str) -> Vec<ListItem> {
        self.lists
            .iter()
            .filter(|item| item.list_name == list_name)
            .cloned()
            .collect()
    }
}
