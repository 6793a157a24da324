//! Logging bootstrap: a `CombinedLogger` fanning out to a timestamped file
//! (debug level) and the terminal (info level and above, colorized).

use std::fs::File;
use std::time::{SystemTime, UNIX_EPOCH};

use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, TermLogger, TerminalMode,
    WriteLogger,
};

/// Initialize the global logger. Safe to call once at the top of `main`.
/// Falls back to a terminal-only logger if the `logs/` directory can't be
/// created (e.g. read-only filesystem), rather than aborting the run over a
/// cosmetic concern.
pub fn init() {
    let config = ConfigBuilder::new()
        .set_location_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Off)
        .set_thread_level(LevelFilter::Off)
        .build();

    let term = TermLogger::new(
        LevelFilter::Info,
        config.clone(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    );

    match std::fs::create_dir_all("logs").and_then(|_| {
        let time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time moves forward")
            .as_secs();
        File::create(format!("logs/{time}.log"))
    }) {
        Ok(file) => {
            let file_logger = WriteLogger::new(LevelFilter::Debug, config, file);
            CombinedLogger::init(vec![term, file_logger]).expect("initialize logger");
        }
        Err(err) => {
            CombinedLogger::init(vec![term]).expect("initialize logger");
            log::warn!("could not open log file, logging to terminal only: {err}");
        }
    }
}
