//! Console logging for the wasm controller.
//!
//! # Design
//! - Each formatted event is buffered and forwarded to the matching `console` method on drop.
//! - No timestamps; the browser console already records them.

use std::io;

use anyhow::{Result, anyhow};
use gloo::console;
use tracing::{Level, Metadata};
use tracing_subscriber::fmt::MakeWriter;

use crate::core::config::LogLevel;

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct ConsoleMakeWriter;

pub(crate) struct ConsoleWriter {
    level: Level,
    buffer: Vec<u8>,
}

impl ConsoleWriter {
    const fn new(level: Level) -> Self {
        Self {
            level,
            buffer: Vec::new(),
        }
    }
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        let text = String::from_utf8_lossy(&self.buffer);
        let line = text.trim_end();
        if line.is_empty() {
            return;
        }
        match self.level {
            Level::ERROR => console::error!(line),
            Level::WARN => console::warn!(line),
            Level::INFO => console::info!(line),
            _ => console::debug!(line),
        }
    }
}

impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleWriter::new(Level::INFO)
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        ConsoleWriter::new(*meta.level())
    }
}

/// Install the global subscriber.
///
/// # Errors
///
/// Returns an error if a subscriber was already installed.
pub(crate) fn init_logging(level: LogLevel) -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(ConsoleMakeWriter)
        .without_time()
        .with_max_level(level.as_tracing())
        .try_init()
        .map_err(|err| anyhow!("failed to install console subscriber: {err}"))
}
