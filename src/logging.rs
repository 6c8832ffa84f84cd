use std::path::Path;
use std::time::SystemTime;

use anyhow::{Context, Result};
use log::LevelFilter;

/// Route `log` output to `path`. The terminal belongs to the TUI, so nothing
/// is echoed to stdout or stderr.
pub fn init(path: &Path, level: LevelFilter) -> Result<()> {
    let file = fern::log_file(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                humantime::format_rfc3339_seconds(SystemTime::now()),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        // terminal crates are noisy at debug level
        .level_for("crossterm", LevelFilter::Warn)
        .level_for("ratatui", LevelFilter::Warn)
        .chain(file)
        .apply()
        .context("logger already initialized")?;

    Ok(())
}
