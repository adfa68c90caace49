//! # Logging
//!
//! Navigators never log through a global. Each one is handed an
//! `Rc<dyn Logger>` when it is built and defaults to [`NoopLogger`].
//!
//! Hosts that already run a `log` backend (the binary installs `simplelog`)
//! pass [`LogCrateLogger`], which forwards every record to the `log` facade
//! with the navigator's tag as target.

use std::rc::Rc;

use log::Level;

/// Injected logging capability.
pub trait Logger {
    fn log(&self, level: Level, tag: &str, message: &str);

    fn trace(&self, tag: &str, message: &str) {
        self.log(Level::Trace, tag, message);
    }

    fn debug(&self, tag: &str, message: &str) {
        self.log(Level::Debug, tag, message);
    }

    fn info(&self, tag: &str, message: &str) {
        self.log(Level::Info, tag, message);
    }

    fn warn(&self, tag: &str, message: &str) {
        self.log(Level::Warn, tag, message);
    }

    fn error(&self, tag: &str, message: &str) {
        self.log(Level::Error, tag, message);
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn log(&self, _level: Level, _tag: &str, _message: &str) {}
}

/// Forwards to the `log` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogCrateLogger;

impl Logger for LogCrateLogger {
    fn log(&self, level: Level, tag: &str, message: &str) {
        log::log!(target: tag, level, "{message}");
    }
}

/// The logger navigators use when none is supplied.
pub fn noop() -> Rc<dyn Logger> {
    Rc::new(NoopLogger)
}
