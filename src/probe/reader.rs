use crate::error::ProbeError;
use crate::event::Event;
use crate::tracer::Tracer;
use std::io::BufRead;
use tracing::{debug, warn};

/// Decode one NDJSON line. `line` is 1-based and only used for errors.
pub fn parse_event_line(text: &str, line: usize) -> Result<Event, ProbeError> {
    serde_json::from_str(text).map_err(|e| ProbeError::InvalidEvent {
        line,
        reason: e.to_string(),
    })
}

/// Stream NDJSON probe output into a tracer, in file order.
///
/// Blank lines are skipped. Stops early, without error, if the tracer stops
/// consuming. Returns the number of events delivered.
pub fn feed_ndjson<R: BufRead>(reader: R, tracer: &Tracer) -> Result<usize, ProbeError> {
    let mut delivered = 0;

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let event = parse_event_line(line, i + 1)?;
        if !tracer.consume(event) {
            warn!(line = i + 1, delivered, "Tracer stopped before end of probe output");
            return Ok(delivered);
        }
        delivered += 1;
    }

    debug!(delivered, "Probe output delivered");
    Ok(delivered)
}
