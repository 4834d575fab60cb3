//! Interactive client launcher.

use anyhow::Result;
use connectify_core::Services;

#[cfg(feature = "tui")]
pub async fn run(services: Services) -> Result<()> {
    use anyhow::Context;

    connectify_tui::run_tui(services)
        .await
        .context("interactive client failed")
}

#[cfg(not(feature = "tui"))]
#[allow(clippy::unused_async)]
pub async fn run(_services: Services) -> Result<()> {
    anyhow::bail!("TUI support is disabled in this build (feature \"tui\").")
}
