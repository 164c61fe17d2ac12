//! `log` backend for the browser console.
//!
//! Records go to the `console` method matching their level, so the browser's
//! own level filter in devtools keeps working.

use log::{Level, LevelFilter, Log, Metadata, ParseLevelError, Record};
use wasm_bindgen::JsValue;
use web_sys::console;

struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let message = JsValue::from_str(&format_record(record));
        match record.level() {
            Level::Error => console::error_1(&message),
            Level::Warn => console::warn_1(&message),
            Level::Info => console::info_1(&message),
            Level::Debug => console::debug_1(&message),
            Level::Trace => console::log_1(&message),
        }
    }

    fn flush(&self) {}
}

/// Install the console logger. Later calls only adjust the level.
pub fn install(level: LevelFilter) {
    // set_logger fails if a logger is already installed (module re-init)
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level);
}

pub fn parse_level(level: &str) -> Result<LevelFilter, ParseLevelError> {
    level.trim().parse()
}

fn format_record(record: &Record) -> String {
    format!("[{}] {}", record.target(), record.args())
}
