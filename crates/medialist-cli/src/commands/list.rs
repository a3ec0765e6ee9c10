//! List command handlers

use anyhow::{Context, Result};

use medialist_core::{ListRecord, Store};

use crate::output::Output;

/// Create a new list
pub fn create(store: &Store, id: i64, name: String, owner: String, output: &Output) -> Result<()> {
    let list = ListRecord::new(id, name, owner);
    store
        .create_list(&list)
        .with_context(|| format!("Failed to create list {}", id))?;

    if output.is_quiet() {
        println!("{}", id);
    } else {
        output.success(&format!(
            "Created list {} ({}) for {}",
            list.id, list.name, list.owner
        ));
    }
    Ok(())
}

/// Show a list with its members
pub fn show(store: &Store, id: i64, output: &Output) -> Result<()> {
    let contents = store.list_contents(id)?;
    output.print_list_contents(&contents);
    Ok(())
}

/// Show all lists of a user
pub fn owned_by(store: &Store, owner: &str, output: &Output) -> Result<()> {
    let lists = store.lists_owned_by(owner)?;
    output.print_lists(&lists);
    Ok(())
}

/// Delete a list and its memberships
pub fn delete(store: &Store, id: i64, output: &Output) -> Result<()> {
    store
        .delete_list(id)
        .with_context(|| format!("Failed to delete list {}", id))?;
    output.success(&format!("Deleted list {}", id));
    Ok(())
}

/// Remove every member from a list
pub fn clear(store: &Store, id: i64, output: &Output) -> Result<()> {
    // Clearing an unknown list would otherwise succeed silently
    store.get_list(id)?;
    store
        .clear_list(id)
        .with_context(|| format!("Failed to clear list {}", id))?;
    output.success(&format!("Cleared list {}", id));
    Ok(())
}
