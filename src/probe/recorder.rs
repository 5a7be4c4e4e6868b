use crate::error::ProbeError;
use crate::event::Event;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Records probe events as NDJSON, one event per line.
pub struct EventRecorder<W: Write = File> {
    writer: BufWriter<W>,
    count: usize,
}

impl EventRecorder<File> {
    /// Create a recorder writing to the given file path.
    pub fn create(path: &Path) -> Result<Self, ProbeError> {
        Ok(Self::new(File::create(path)?))
    }
}

impl<W: Write> EventRecorder<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
            count: 0,
        }
    }

    pub fn record(&mut self, event: &Event) -> Result<(), ProbeError> {
        serde_json::to_writer(&mut self.writer, event)?;
        self.writer.write_all(b"\n")?;
        self.count += 1;
        Ok(())
    }

    /// Flush buffered output and return the number of events recorded.
    pub fn finish(mut self) -> Result<usize, ProbeError> {
        self.writer.flush()?;
        Ok(self.count)
    }

    pub fn count(&self) -> usize {
        self.count
    }
}
