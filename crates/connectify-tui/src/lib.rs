//! Full-screen terminal client for Connectify.

pub mod common;
pub mod effects;
pub mod events;
pub mod features;
pub mod render;
pub mod runtime;
pub mod state;
pub mod terminal;
pub mod update;

use std::io::{IsTerminal, stderr};

use anyhow::Result;
use connectify_core::Services;
pub use runtime::TuiRuntime;

/// Runs the interactive client until the user quits.
///
/// # Errors
/// Returns an error if stderr is not a terminal or the terminal fails.
#[allow(clippy::unused_async)]
pub async fn run_tui(services: Services) -> Result<()> {
    if !stderr().is_terminal() {
        anyhow::bail!(
            "The interactive client requires a terminal.\n\
             Use `connectify posts list` for non-interactive access."
        );
    }

    let mut runtime = TuiRuntime::new(services)?;
    runtime.run()
}
