// Licensed under the Apache-2.0 license

//! Crate-wide logging plumbing.
//!
//! Drivers take a `Logger` type parameter that defaults to [`NoOpLogger`], so
//! production builds that do not wire up a sink pay nothing for the calls.

use core::cell::RefCell;
use core::fmt;
use embedded_io::Write as _;

/// Severity attached to a log record.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }
}

/// Sink for driver diagnostics.
///
/// Methods take `&self` because drivers are shared with interrupt handlers
/// and never hold a mutable borrow of themselves.
pub trait Logger {
    fn log(&self, level: Level, args: fmt::Arguments<'_>);

    fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Debug, args);
    }

    fn warn(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Warn, args);
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct NoOpLogger;

impl Logger for NoOpLogger {
    fn log(&self, _level: Level, _args: fmt::Arguments<'_>) {}
}

impl<L: Logger + ?Sized> Logger for &L {
    fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        (**self).log(level, args);
    }
}

/// Writes one `LEVEL message\r\n` line per record to an `embedded_io` sink,
/// typically a UART.
///
/// Records below `min_level` are dropped. Write errors are swallowed; a
/// broken log channel must not disturb the bus.
pub struct WriteLogger<W: embedded_io::Write> {
    sink: RefCell<W>,
    min_level: Level,
}

impl<W: embedded_io::Write> WriteLogger<W> {
    pub fn new(sink: W, min_level: Level) -> Self {
        Self {
            sink: RefCell::new(sink),
            min_level,
        }
    }

    pub fn into_inner(self) -> W {
        self.sink.into_inner()
    }
}

impl<W: embedded_io::Write> Logger for WriteLogger<W> {
    fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        if level < self.min_level {
            return;
        }
        // Re-entry from an interrupt while a line is being written drops the record.
        let Ok(mut sink) = self.sink.try_borrow_mut() else {
            return;
        };
        let _ = write!(sink, "{} {}\r\n", level.as_str(), args);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct VecSink(Vec<u8>);

    impl embedded_io::ErrorType for VecSink {
        type Error = core::convert::Infallible;
    }

    impl embedded_io::Write for VecSink {
        fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
            self.0.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    #[test]
    fn test_write_logger_formats_lines() {
        let logger = WriteLogger::new(VecSink(Vec::new()), Level::Debug);
        logger.debug(format_args!("divisor 0x{:02X}", 0x77));
        logger.warn(format_args!("bus collision"));

        let out = String::from_utf8(logger.into_inner().0).unwrap();
        assert_eq!(out, "DEBUG divisor 0x77\r\nWARN bus collision\r\n");
    }

    #[test]
    fn test_write_logger_filters_below_min_level() {
        let logger = WriteLogger::new(VecSink(Vec::new()), Level::Warn);
        logger.debug(format_args!("dropped"));
        logger.log(Level::Error, format_args!("kept"));

        let out = String::from_utf8(logger.into_inner().0).unwrap();
        assert_eq!(out, "ERROR kept\r\n");
    }

    #[test]
    fn test_noop_logger_accepts_everything() {
        let logger = NoOpLogger;
        logger.warn(format_args!("ignored {}", 1));
        (&logger).debug(format_args!("ignored"));
    }
}
