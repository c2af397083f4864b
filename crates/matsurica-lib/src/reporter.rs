//! A custom reporter that conversion steps use to surface diagnostics.

use std::fmt;

use parking_lot::Mutex;

#[macro_export]
macro_rules! report_info {
    ($reporter:expr, $($arg:tt)*) => {
        $crate::reporter::Reporter::info($reporter, &format_args!($($arg)*));
    }
}

#[macro_export]
macro_rules! report_warn {
    ($reporter:expr, $($arg:tt)*) => {
        $crate::reporter::Reporter::warn($reporter, &format_args!($($arg)*));
    }
}

#[macro_export]
macro_rules! report_error {
    ($reporter:expr, $($arg:tt)*) => {
        $crate::reporter::Reporter::error($reporter, &format_args!($($arg)*));
    }
}

/// The level being reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

pub trait Reporter {
    /// Perform info logging.
    fn info(&self, value: &dyn fmt::Display);

    /// Perform warning logging.
    fn warn(&self, value: &dyn fmt::Display);

    /// Perform error logging.
    fn error(&self, value: &dyn fmt::Display);
}

impl<T> Reporter for &T
where
    T: ?Sized + Reporter,
{
    #[inline]
    fn info(&self, value: &dyn fmt::Display) {
        (*self).info(value);
    }

    #[inline]
    fn warn(&self, value: &dyn fmt::Display) {
        (*self).warn(value);
    }

    #[inline]
    fn error(&self, value: &dyn fmt::Display) {
        (*self).error(value);
    }
}

pub struct TracingReporter;

impl Reporter for TracingReporter {
    #[inline]
    fn info(&self, value: &dyn fmt::Display) {
        tracing::event!(tracing::Level::INFO, "{}", value);
    }

    #[inline]
    fn warn(&self, value: &dyn fmt::Display) {
        tracing::event!(tracing::Level::WARN, "{}", value);
    }

    #[inline]
    fn error(&self, value: &dyn fmt::Display) {
        tracing::event!(tracing::Level::ERROR, "{}", value);
    }
}

/// A reported message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub level: Level,
    pub text: String,
}

/// Reporter which keeps every message in memory.
#[derive(Default)]
pub struct CollectReporter {
    messages: Mutex<Vec<Message>>,
}

impl CollectReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take all messages collected so far.
    pub fn take(&self) -> Vec<Message> {
        std::mem::take(&mut *self.messages.lock())
    }

    /// Count messages of the given level.
    pub fn count(&self, level: Level) -> usize {
        self.messages
            .lock()
            .iter()
            .filter(|m| m.level == level)
            .count()
    }

    fn push(&self, level: Level, value: &dyn fmt::Display) {
        let message = Message {
            level,
            text: value.to_string(),
        };

        self.messages.lock().push(message);
    }
}

impl Reporter for CollectReporter {
    fn info(&self, value: &dyn fmt::Display) {
        self.push(Level::Info, value);
    }

    fn warn(&self, value: &dyn fmt::Display) {
        self.push(Level::Warn, value);
    }

    fn error(&self, value: &dyn fmt::Display) {
        self.push(Level::Error, value);
    }
}
