//! Line-oriented destinations for reconstructed traces.

use crate::util::indent;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Receives the formatted trace, one line at a time.
///
/// A sink is owned by the tracer for its whole lifetime and closed exactly
/// once, on every exit path.
pub trait Sink: Send + 'static {
    /// Append one line (without trailing newline).
    fn log(&mut self, line: &str) -> io::Result<()>;

    /// Record a fault that aborted reconstruction.
    fn record_fault(&mut self, message: &str) -> io::Result<()> {
        self.log(&format!("FAULT {message}"))
    }

    /// Flush and release the destination.
    fn close(&mut self) -> io::Result<()>;
}

/// Buffered sink over any writer.
pub struct WriterSink<W: Write> {
    writer: BufWriter<W>,
}

/// Sink writing to a file.
pub type FileSink = WriterSink<File>;

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
        }
    }
}

impl FileSink {
    /// Create (or truncate) the file at `path`.
    pub fn create(path: &Path) -> io::Result<Self> {
        Ok(Self::new(File::create(path)?))
    }
}

impl<W: Write + Send + 'static> Sink for WriterSink<W> {
    fn log(&mut self, line: &str) -> io::Result<()> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")
    }

    fn close(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// In-memory sink. Clones share the same buffer, so a caller can keep one
/// handle and read the trace after the tracer is done with the other.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the lines written so far.
    pub fn lines(&self) -> Vec<String> {
        self.buffer().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn buffer(&self) -> MutexGuard<'_, Vec<String>> {
        self.lines.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Sink for MemorySink {
    fn log(&mut self, line: &str) -> io::Result<()> {
        self.buffer().push(line.to_string());
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Scoped ownership of the tracer's sink: indents lines by depth, counts
/// them, and closes the sink once, at the latest on drop.
pub(crate) struct ScopedSink {
    sink: Box<dyn Sink>,
    lines: usize,
    closed: bool,
}

impl ScopedSink {
    pub(crate) fn new(sink: Box<dyn Sink>) -> Self {
        Self {
            sink,
            lines: 0,
            closed: false,
        }
    }

    /// Write `text` at the indentation of `depth`.
    pub(crate) fn emit(&mut self, depth: usize, text: &str) -> io::Result<()> {
        self.sink.log(&format!("{}{text}", indent(depth)))?;
        self.lines += 1;
        Ok(())
    }

    pub(crate) fn record_fault(&mut self, message: &str) -> io::Result<()> {
        self.sink.record_fault(message)?;
        self.lines += 1;
        Ok(())
    }

    pub(crate) fn lines_written(&self) -> usize {
        self.lines
    }

    pub(crate) fn close(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.sink.close()
    }
}

impl Drop for ScopedSink {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
