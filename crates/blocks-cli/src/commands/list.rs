//! List and search commands

use blocks_core::InserterEntry;
use colored::Colorize;

use super::Library;
use crate::error::Result;

/// Run the list command
pub fn run_list(library: &Library, json: bool) -> Result<()> {
    let entries = library.registry.search("");
    if json {
        let rows: Vec<_> = entries
            .iter()
            .map(|e| serde_json::json!({ "id": e.target_id.to_string(), "label": e.label }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No shared blocks in {}", "library".cyan());
        return Ok(());
    }
    println!("{}", "Shared Blocks".bold());
    println!();
    print_entries(&entries);
    Ok(())
}

/// Run the search command
pub fn run_search(library: &Library, query: &str) -> Result<()> {
    let entries = library.registry.search(query);
    if entries.is_empty() {
        println!("No shared blocks match '{}'", query);
        return Ok(());
    }
    print_entries(&entries);
    Ok(())
}

fn print_entries(entries: &[InserterEntry]) {
    for entry in entries {
        println!("  {:<8} {}", entry.target_id.to_string().green(), entry.label);
    }
}
