//! The driver loop: runs the top handler's step until the stack empties,
//! the stream is cancelled, or a fault aborts reconstruction.
//!
//! Faults (consistency faults, sink errors, panics inside a step) are written
//! to the sink and end the run; everything logged before the fault is kept.
//! The sink is closed on every exit path.

use crate::config::TracerConfig;
use crate::error::TraceError;
use crate::handler::{self, Handler, HandlerStack, StepContext};
use crate::sink::{ScopedSink, Sink};
use crate::stream::EventStream;
use crate::util::panic_message;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error, info, warn};

/// How a tracer run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TraceOutcome {
    /// The entry frame returned and the handler stack emptied.
    Completed,

    /// The tracee ended with an empty backlog, or the tracer was interrupted.
    Cancelled,

    /// Reconstruction was aborted by a fault.
    Faulted {
        /// Human-readable reason for the fault.
        reason: String,
    },
}

/// Summary of a finished tracer run.
#[derive(Debug, Clone)]
#[must_use = "the report says whether the trace is complete"]
pub struct TraceReport {
    pub outcome: TraceOutcome,

    /// Events taken off the channel (lookahead restores are not recounted).
    pub events_consumed: usize,

    /// Lines written to the sink, including any fault record.
    pub lines_written: usize,

    /// Deepest frame depth reached.
    pub max_depth: usize,
}

impl TraceReport {
    pub fn is_faulted(&self) -> bool {
        matches!(self.outcome, TraceOutcome::Faulted { .. })
    }
}

/// Consumer side of a tracer: owns the stream, the handler stack and the sink.
pub struct Driver {
    stream: EventStream,
    sink: ScopedSink,
    stack: HandlerStack,
    config: TracerConfig,
    max_depth: usize,
}

impl Driver {
    pub fn new(stream: EventStream, sink: impl Sink, config: TracerConfig) -> Self {
        Self {
            stream,
            sink: ScopedSink::new(Box::new(sink)),
            stack: HandlerStack::new(),
            config,
            max_depth: 0,
        }
    }

    /// Drive reconstruction to the end and close the sink.
    pub fn run(mut self) -> TraceReport {
        debug!("Tracer driver started");

        let outcome = loop {
            if self.stack.is_empty() {
                break TraceOutcome::Completed;
            }

            let step = panic::catch_unwind(AssertUnwindSafe(|| self.step_once()));
            match step {
                Ok(Ok(())) => {}
                Ok(Err(err)) if err.is_cancellation() => {
                    debug!(nesting = self.stack.nesting(), "Tracer cancelled");
                    break TraceOutcome::Cancelled;
                }
                Ok(Err(err)) => break self.abort(err),
                Err(payload) => break self.abort(TraceError::Panicked(panic_message(&*payload))),
            }
        };

        if let Err(err) = self.sink.close() {
            warn!(error = %err, "Failed to close trace sink");
        }

        let report = TraceReport {
            outcome,
            events_consumed: self.stream.received(),
            lines_written: self.sink.lines_written(),
            max_depth: self.max_depth,
        };
        info!(
            outcome = ?report.outcome,
            events = report.events_consumed,
            lines = report.lines_written,
            "Tracer finished"
        );
        report
    }

    fn step_once(&mut self) -> Result<(), TraceError> {
        let mut ctx = StepContext {
            stream: &mut self.stream,
            sink: &mut self.sink,
            config: &self.config,
        };
        handler::step(&mut self.stack, &mut ctx)?;

        if let Some(Handler::Frame(frame)) = self.stack.top() {
            self.max_depth = self.max_depth.max(frame.depth());
        }
        Ok(())
    }

    fn abort(&mut self, err: TraceError) -> TraceOutcome {
        error!(error = %err, "Trace reconstruction aborted");
        let reason = err.to_string();
        if let Err(sink_err) = self.sink.record_fault(&reason) {
            warn!(error = %sink_err, "Failed to record fault to sink");
        }
        self.stack.clear();
        TraceOutcome::Faulted { reason }
    }
}
