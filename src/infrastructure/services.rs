use crate::domain::logging::{LogEntry, LogLevel, Logger, TimeProvider, get_time_provider};
use std::sync::{Arc, Mutex, PoisonError};
use wasm_bindgen::JsValue;

/// Browser console sink. Entries below `min_level` are dropped.
pub struct ConsoleLogger {
    min_level: LogLevel,
}

impl ConsoleLogger {
    pub fn new(min_level: LogLevel) -> Self {
        Self { min_level }
    }

    pub fn new_production() -> Self {
        Self::new(LogLevel::Info)
    }

    pub fn new_development() -> Self {
        Self::new(LogLevel::Debug)
    }
}

impl Logger for ConsoleLogger {
    fn log(&self, entry: LogEntry) {
        if entry.level < self.min_level {
            return;
        }
        let line = JsValue::from(entry.format_line(get_time_provider()));
        match entry.level {
            LogLevel::Trace | LogLevel::Debug => web_sys::console::debug_1(&line),
            LogLevel::Info => web_sys::console::info_1(&line),
            LogLevel::Warn => web_sys::console::warn_1(&line),
            LogLevel::Error => web_sys::console::error_1(&line),
        }
    }
}

/// Wall clock backed by `js_sys::Date`, formatted `HH:MM:SS.mmm`.
#[derive(Default)]
pub struct BrowserTimeProvider;

impl BrowserTimeProvider {
    pub fn new() -> Self {
        Self
    }
}

impl TimeProvider for BrowserTimeProvider {
    fn current_timestamp(&self) -> u64 {
        js_sys::Date::now() as u64
    }

    fn format_timestamp(&self, timestamp: u64) -> String {
        let date = js_sys::Date::new(&(timestamp as f64).into());
        format!(
            "{:02}:{:02}:{:02}.{:03}",
            date.get_hours(),
            date.get_minutes(),
            date.get_seconds(),
            date.get_milliseconds()
        )
    }
}

/// Keeps entries in memory; clones share the same buffer. Used by headless
/// hosts and tests to inspect what the engine reported.
#[derive(Clone, Default)]
pub struct MemoryLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn lines(&self) -> Vec<String> {
        let clock = get_time_provider();
        self.entries().iter().map(|entry| entry.format_line(clock)).collect()
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl Logger for MemoryLogger {
    fn log(&self, entry: LogEntry) {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).push(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::logging::LogComponent;

    #[test]
    fn memory_logger_clones_share_a_buffer() {
        let logger = MemoryLogger::new();
        let handle = logger.clone();
        logger.warn(LogComponent::Infrastructure("Test"), "first");
        logger.log_with_metadata(LogLevel::Error, LogComponent::Domain("Test"), "second", "k=v");
        let entries = handle.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].metadata.as_deref(), Some("k=v"));
        assert!(handle.lines()[0].ends_with("INF:Test | first"));
        handle.clear();
        assert!(logger.entries().is_empty());
    }
}
