//! PikPak command-line uploader entry point.

mod app;
mod config;

use std::path::Path;

use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: pikpak-cli <path> [parent_id]";

fn main() -> anyhow::Result<()> {
    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        anyhow::bail!(USAGE);
    };
    let parent_id = args.next();

    let config_path = config::config_path()?;
    let mut config = config::Config::load(&config_path)?;
    tracing::info!(path = %config_path.display(), "configuration loaded");

    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(app::run(&mut config, Path::new(&path), parent_id.as_deref()));

    // Keep the freshest captcha token for the next run.
    config.save(&config_path)?;

    let file_id = result?;
    println!("{file_id}");
    Ok(())
}
