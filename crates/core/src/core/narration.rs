//! Trial narration sinks.
//!
//! The environment describes every step in one human-readable line. Where the
//! line goes is the caller's business: nowhere ([`Silent`]), into memory
//! ([`Recorder`]), into `tracing` ([`TracingNarrator`]) or into any writer
//! ([`WriterNarrator`]). A sink can never fail a trial.

#[cfg(not(feature = "std"))]
use alloc::{borrow::ToOwned, boxed::Box, string::String, vec::Vec};

/// Single-operation logging capability.
pub trait Narrator {
    fn log(&mut self, message: &str);
}

/// The absent logger.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl Narrator for Silent {
    #[inline]
    fn log(&mut self, _message: &str) {}
}

/// Keeps every line in memory.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    pub lines: Vec<String>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

impl Narrator for Recorder {
    fn log(&mut self, message: &str) {
        self.lines.push(message.to_owned());
    }
}

impl<T: Narrator + ?Sized> Narrator for &mut T {
    fn log(&mut self, message: &str) {
        (**self).log(message)
    }
}

impl<T: Narrator + ?Sized> Narrator for Box<T> {
    fn log(&mut self, message: &str) {
        (**self).log(message)
    }
}

/// Forwards lines to `tracing` at INFO under the `reversal::env` target.
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNarrator;

#[cfg(feature = "std")]
impl Narrator for TracingNarrator {
    fn log(&mut self, message: &str) {
        tracing::info!(target: "reversal::env", "Hampton2006: {}", message);
    }
}

/// Writes one line per message. Write errors are counted, never returned.
#[cfg(feature = "std")]
#[derive(Debug)]
pub struct WriterNarrator<W> {
    inner: W,
    failures: u64,
}

#[cfg(feature = "std")]
impl<W: std::io::Write> WriterNarrator<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, failures: 0 }
    }

    /// Number of lines that could not be written.
    pub fn failures(&self) -> u64 {
        self.failures
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

#[cfg(feature = "std")]
impl<W: std::io::Write> Narrator for WriterNarrator<W> {
    fn log(&mut self, message: &str) {
        if writeln!(self.inner, "{}", message).is_err() {
            self.failures = self.failures.saturating_add(1);
        }
    }
}
