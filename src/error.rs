//! Typed errors for tracetree.
//!
//! Mirrors the tracer's failure taxonomy: protocol misuse of the pushback
//! slot, consistency faults in the reconstruction, lifecycle misuse of the
//! tracer handle, and clean cancellation of the event stream.

use thiserror::Error;

/// Top-level error type for tracetree operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Error raised while reconstructing a trace.
    #[error("Trace error: {0}")]
    Trace(#[from] TraceError),

    /// Misuse of the tracer lifecycle.
    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Builder(#[from] BuilderError),

    /// Error reading or writing probe output.
    #[cfg(feature = "ndjson")]
    #[error("Probe error: {0}")]
    Probe(#[from] ProbeError),
}

/// Error raised by a single reconstruction step.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TraceError {
    /// The producer ended with an empty backlog, or the consumer was interrupted.
    ///
    /// This is a clean end-of-stream, not a failure.
    #[error("Event stream cancelled")]
    Cancelled,

    /// Misuse of the one-slot pushback buffer.
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The event stream no longer agrees with the reconstructed call stack.
    #[error("Consistency fault: {0}")]
    Consistency(#[from] ConsistencyFault),

    /// Writing to the sink failed.
    #[error("Sink error: {0}")]
    Sink(#[from] std::io::Error),

    /// A handler step panicked.
    #[error("Step panicked: {0}")]
    Panicked(String),
}

impl TraceError {
    /// Whether this error is a clean end-of-stream rather than a fault.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, TraceError::Cancelled)
    }
}

/// Misuse of the event stream's pushback slot.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// `restore` was called while another event was still pending.
    #[error("Cannot restore {restored}: pushback slot already holds {pending}")]
    PushbackOccupied { pending: String, restored: String },
}

/// Reconstruction lost synchronization with the true call stack.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConsistencyFault {
    /// An invoke-completion arrived without a pending invoke.
    #[error("Unexpected invoke completion ({kind}) at iid {iid}, mid {mid} with no pending invoke")]
    StrayCompletion { kind: String, iid: i32, mid: i32 },

    /// A delegated-constructor unwind popped every frame without finding the `new` site.
    #[error("Constructor unwind exhausted the handler stack")]
    UnwindExhausted,

    /// A delegated-constructor unwind stopped at a frame that is not invoking a constructor.
    #[error("Constructor unwind stopped at {frame}, whose pending invoke {target} is not a constructor")]
    UnwindNonConstructor { frame: String, target: String },
}

/// Misuse of the tracer lifecycle.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LifecycleError {
    /// `start` was called twice.
    #[error("Tracer already started")]
    AlreadyStarted,

    /// `join` was called before `start`.
    #[error("Tracer was never started")]
    NotStarted,

    /// The consumer thread could not be spawned.
    #[error("Failed to spawn tracer thread '{name}': {reason}")]
    Spawn { name: String, reason: String },

    /// The consumer thread panicked outside of a handler step.
    #[error("Tracer thread panicked: {0}")]
    ConsumerPanicked(String),
}

/// Error building a configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BuilderError {
    /// A builder field was set to an unusable value.
    #[error("{builder}: invalid value for '{field}': {reason}")]
    InvalidField {
        builder: &'static str,
        field: &'static str,
        reason: String,
    },
}

/// Error reading or writing NDJSON probe output.
#[cfg(feature = "ndjson")]
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProbeError {
    /// A line did not decode as an event.
    #[error("Invalid event on line {line}: {reason}")]
    InvalidEvent { line: usize, reason: String },

    /// IO error while reading or writing probe output.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An event failed to serialize.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using tracetree's Error.
pub type TraceResult<T> = std::result::Result<T, Error>;
