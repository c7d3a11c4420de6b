use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// File-backed tracing, enabled by setting TECHDESK_LOG to a path.
/// The alternate screen owns the terminal, so nothing is ever logged
/// to stdout or stderr.
pub fn init() -> Result<()> {
    let Ok(path) = std::env::var("TECHDESK_LOG") else {
        return Ok(());
    };

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("techdesk=debug")),
        )
        .with_writer(file)
        .with_ansi(false)
        .init();

    Ok(())
}
