/// Store operations exposed on the database handle
///
/// Mutations go through `Database::mutate` so they hold the write lock and
/// persist the snapshot; reads share the read lock.

use crate::db::models::*;
use crate::db::Database;

impl Database {
    /// Insert a single command
    ///
    /// # Returns
    /// * The id assigned to the new record
    pub fn insert_command(&self, input: CommandInput) -> i64 {
        self.mutate(|store| store.insert_command(input))
    }

    /// Append a batch of commands, all or nothing
    ///
    /// # Returns
    /// * Number of records appended
    pub fn insert_commands_batch(&self, inputs: Vec<CommandInput>) -> usize {
        self.mutate(|store| store.insert_commands_batch(inputs))
    }

    /// Replace every command with `inputs`, ids restarting at 1
    pub fn refresh_commands_batch(&self, inputs: Vec<CommandInput>) -> usize {
        self.mutate(|store| store.refresh_commands_batch(inputs))
    }

    pub fn insert_list_item(&self, input: ListItemInput) -> i64 {
        self.mutate(|store| store.insert_list_item(input))
    }

    pub fn insert_list_items_batch(&self, inputs: Vec<ListItemInput>) -> usize {
        self.mutate(|store| store.insert_list_items_batch(inputs))
    }

    pub fn refresh_list_items_batch(&self, inputs: Vec<ListItemInput>) -> usize {
        self.mutate(|store| store.refresh_list_items_batch(inputs))
    }

    pub fn clear_all_commands(&self) {
        self.mutate(|store| {
            tracing::info!(count = store.command_count(), "clearing commands");
            store.clear_all_commands()
        })
    }

    pub fn clear_all_lists(&self) {
        self.mutate(|store| {
            tracing::info!(count = store.list_count(), "clearing list items");
            store.clear_all_lists()
        })
    }

    pub fn clear_all_data(&self) {
        self.mutate(|store| {
            tracing::info!(
                commands = store.command_count(),
                list_items = store.list_count(),
                "clearing all data"
            );
            store.clear_all_data()
        })
    }

    pub fn command_count(&self) -> usize {
        self.read().command_count()
    }

    pub fn list_count(&self) -> usize {
        self.read().list_count()
    }

    /// Distinct list names, sorted
    pub fn get_list_names(&self) -> Vec<String> {
        self.read().list_names()
    }

    /// All items of the list with exactly this name
    pub fn get_list_items_by_name(&self, list_name: &str) -> Vec<ListItem> {
        self.read().list_items_by_name(list_name)
    }
}
