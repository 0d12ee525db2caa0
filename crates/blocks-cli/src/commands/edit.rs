//! Create and rename commands

use blocks_core::EditSurface;
use blocks_tree::ContentNode;
use colored::Colorize;

use super::Library;
use crate::error::Result;

/// Run the create command
pub async fn run_create(library: &Library, text: &str, title: Option<&str>) -> Result<()> {
    let id = library
        .registry
        .create_from_content(vec![ContentNode::paragraph(text)]);
    let outcome = library.registry.save(&id, title).await?;
    let block = library.registry.get(&outcome.id)?;

    println!(
        "{} Created shared block {} ({})",
        "OK".green().bold(),
        library.label(&block).cyan(),
        outcome.id
    );
    Ok(())
}

/// Run the rename command
pub async fn run_rename(library: &Library, id: &str, title: &str) -> Result<()> {
    let block = library.block(id)?;
    let surface = EditSurface::new(library.registry.clone());

    surface.begin_edit(&block.id)?;
    surface.set_title(title)?;
    println!(
        "{} Renaming {} to {}",
        "=>".blue().bold(),
        library.label(&block).yellow(),
        title.cyan()
    );
    surface.save().await?;

    println!("{} Renamed shared block {}", "OK".green().bold(), block.id);
    Ok(())
}
