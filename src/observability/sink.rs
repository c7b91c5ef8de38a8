//! Shared output sink.
//!
//! Every clone of a logger writes through the same sink. Entries are written
//! whole (the formatter renders a full line before asking for a writer), so
//! the mutex only serializes complete lines.

use std::fmt;
use std::io::{self, LineWriter, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing_subscriber::fmt::MakeWriter;

use crate::config::Environment;

type BoxedWrite = Box<dyn Write + Send>;

/// Standard stream a logger writes to when no writer is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

impl Stream {
    /// `test` output goes to stdout, everything else to stderr.
    pub fn for_env(env: &Environment) -> Self {
        match env {
            Environment::Test => Stream::Stdout,
            Environment::Local | Environment::Production(_) => Stream::Stderr,
        }
    }
}

/// A cloneable, thread-safe byte sink with an explicit flush.
#[derive(Clone)]
pub struct LogSink {
    inner: Arc<Mutex<BoxedWrite>>,
}

impl LogSink {
    /// Wrap an arbitrary writer.
    pub fn new<W>(writer: W) -> Self
    where
        W: Write + Send + 'static,
    {
        Self {
            inner: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    /// Line-buffered standard output.
    pub fn stdout() -> Self {
        Self::new(LineWriter::new(io::stdout()))
    }

    /// Line-buffered standard error.
    pub fn stderr() -> Self {
        Self::new(LineWriter::new(io::stderr()))
    }

    /// Line-buffered handle on `stream`.
    pub fn for_stream(stream: Stream) -> Self {
        match stream {
            Stream::Stdout => Self::stdout(),
            Stream::Stderr => Self::stderr(),
        }
    }

    /// Flush anything still buffered.
    pub fn flush(&self) -> io::Result<()> {
        self.lock().flush()
    }

    fn lock(&self) -> MutexGuard<'_, BoxedWrite> {
        // A panic while holding the lock leaves at worst a torn line.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogSink").finish_non_exhaustive()
    }
}

/// Writer handed out per entry; holds the sink lock while writing.
pub struct SinkWriter<'a> {
    guard: MutexGuard<'a, BoxedWrite>,
}

impl Write for SinkWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.guard.write(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.guard.write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.guard.flush()
    }
}

impl<'a> MakeWriter<'a> for LogSink {
    type Writer = SinkWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        SinkWriter { guard: self.lock() }
    }
}
