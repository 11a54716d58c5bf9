//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Shared utilities (open_db) plus init, status, serve
//! - `process` - Statement processing command
//! - `categorize` - One-off categorization command
//! - `rules` - Rule management commands (list, add, delete, test)
//! - `entities` - Entity management commands

pub mod categorize;
pub mod core;
pub mod entities;
pub mod process;
pub mod rules;

// Re-export command functions for main.rs
pub use categorize::*;
pub use core::*;
pub use entities::*;
pub use process::*;
pub use rules::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        format!("{}...", &s[..max.saturating_sub(3)])
    }
}
