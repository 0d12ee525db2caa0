//! Delete command

use blocks_core::deletion::delete_shared_block;
use colored::Colorize;

use super::Library;
use crate::error::{CliError, Result};

/// Run the delete command
///
/// Deletion is library-wide, so it requires `--yes`.
pub async fn run_delete(library: &Library, id: &str, yes: bool) -> Result<()> {
    let block = library.block(id)?;
    let pending = library.registry.request_delete(&block.id)?;

    if !yes {
        println!(
            "{} Deleting {} removes it for every document that uses it.",
            "=>".blue().bold(),
            library.label(&block).yellow()
        );
        return Err(CliError::user("Refusing to delete without --yes"));
    }

    let report = delete_shared_block(&library.registry, pending.confirm(), &mut []).await?;
    println!(
        "{} Deleted shared block {} ({})",
        "OK".green().bold(),
        library.label(&report.entity).cyan(),
        report.entity.id
    );
    Ok(())
}
