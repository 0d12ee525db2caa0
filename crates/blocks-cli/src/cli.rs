//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Shared blocks - inspect and manage a library of reusable content
#[derive(Parser, Debug)]
#[command(name = "blocks")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Library file to operate on
    #[arg(long, global = true, env = "BLOCKS_LIBRARY", default_value = "library.json")]
    pub library: PathBuf,

    /// Configuration file (TOML); defaults apply when absent
    #[arg(long, global = true, env = "BLOCKS_CONFIG")]
    pub config: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// List shared blocks, most recently modified first
    List {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Search shared blocks by label (case-insensitive)
    Search {
        /// Text to look for in block labels
        query: String,
    },

    /// Show one shared block
    Show {
        /// Block id
        id: String,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Create a shared block holding one paragraph
    Create {
        /// Paragraph text
        text: String,

        /// Block title
        #[arg(short, long)]
        title: Option<String>,
    },

    /// Change a shared block's title
    Rename {
        /// Block id
        id: String,

        /// New title
        title: String,
    },

    /// Delete a shared block from the library
    ///
    /// Documents referencing the block will show it as unavailable.
    Delete {
        /// Block id
        id: String,

        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}
