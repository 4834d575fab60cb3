//! CLI command handlers.

pub mod auth;
pub mod config;
pub mod follows;
pub mod posts;
pub mod tui;
