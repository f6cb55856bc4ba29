//! polyslot - terminal front-end for the slot synth
//!
//! Run with: cargo run
//! Logs go to `polyslot.log` in the temp directory; set `POLYSLOT_LOG`
//! (e.g. `debug`) to change the level.

mod app;
mod ui;

use std::{fs::File, sync::Mutex};

use color_eyre::eyre::WrapErr;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let log_path = std::env::temp_dir().join("polyslot.log");
    let log_file = File::create(&log_path)
        .wrap_err_with(|| format!("failed to create log file {}", log_path.display()))?;
    let level = std::env::var("POLYSLOT_LOG")
        .ok()
        .and_then(|value| value.parse::<tracing::Level>().ok())
        .unwrap_or(tracing::Level::INFO);

    // The terminal belongs to the TUI, so logs go to a file
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .with_max_level(level)
        .init();

    app::run()
}
