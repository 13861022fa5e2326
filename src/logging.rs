// src/logging.rs
// =============================================================================
// Logger setup.
//
// RUST_LOG is read first; an explicit --log-level wins over it. Without
// either, `info` is used. Logs go to stderr, so --json output on stdout
// stays clean.
// =============================================================================

use env_logger::{Builder, Env};
use log::{LevelFilter, SetLoggerError};
use std::io::Write;

pub fn init_logger(level: Option<LevelFilter>) -> Result<(), SetLoggerError> {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));

    if let Some(level) = level {
        builder.filter_level(level);
    }

    // Parser and driver internals are noise at info level
    builder.filter_module("html5ever", LevelFilter::Error);
    builder.filter_module("selectors", LevelFilter::Warn);
    builder.filter_module("reqwest", LevelFilter::Info);
    builder.filter_module("hyper", LevelFilter::Info);
    builder.filter_module("chromiumoxide", LevelFilter::Warn);

    builder.format(|buf, record| {
        let emoji = match record.level() {
            log::Level::Error => "❌",
            log::Level::Warn => "⚠️",
            log::Level::Info => "✔️",
            log::Level::Debug => "🔍",
            log::Level::Trace => "🔬",
        };
        writeln!(
            buf,
            "{} {} [{}] {}",
            chrono::Local::now().format("%H:%M:%S"),
            emoji,
            record.level(),
            record.args()
        )
    });

    // try_init: tests may initialise more than once
    builder.try_init()
}
