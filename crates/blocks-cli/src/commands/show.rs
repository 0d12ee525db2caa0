//! Show command

use colored::Colorize;

use super::Library;
use crate::error::Result;

/// Run the show command
pub fn run_show(library: &Library, id: &str, json: bool) -> Result<()> {
    let block = library.block(id)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&block)?);
        return Ok(());
    }

    println!("{} {}", library.label(&block).bold(), format!("({})", block.id).dimmed());
    println!();
    for node in &block.content {
        println!("  {} {}", node.kind.cyan(), node.plain_text());
    }
    Ok(())
}
