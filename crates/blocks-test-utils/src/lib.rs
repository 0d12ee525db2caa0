//! Shared test utilities for the shared blocks workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`content`]: document and content builders
//! - [`library`]: [`TestLibrary`](library::TestLibrary), a temporary on-disk library
//! - [`memory`]: [`MemoryPersistence`](memory::MemoryPersistence), an
//!   in-memory persistence service with scheduled failures and a save gate

pub mod content;
pub mod library;
pub mod memory;

pub use memory::MemoryPersistence;
