//! tracetree: call-tree reconstruction from a flat stream of execution events.
//!
//! An instrumentation probe running inside the observed program emits one
//! [`Event`] per executed instruction or call boundary: frame entry and exit,
//! invoke and invoke completion, branch outcome, heap access. A [`Tracer`]
//! consumes that stream on its own thread and writes a properly nested,
//! depth-indented trace to a [`Sink`]:
//!
//! ```text
//! BEGIN app/Main#main([Ljava/lang/String;)V
//! BRANCH(-3,12)
//! CALL(5,14)
//!   BEGIN app/Main#foo()V
//!   HEAPLOAD(9,20,17,count)
//!   RET
//! RET
//! ```
//!
//! Reconstruction is a forward-only state machine over a stack of handlers
//! (see [`handler`]) with at most one event of lookahead. It decides for
//! every frame entry whether it steps into a recorded invoke, is incidental
//! machinery to skip, and unwinds the chain of frames left behind when an
//! exception escapes a delegated constructor call.
//!
//! # Quick Start
//!
//! ```
//! use tracetree::*;
//!
//! let sink = MemorySink::new();
//! let tracer = Tracer::new(TraceeHandle::finished(), sink.clone());
//!
//! tracer.consume(Event::FrameEnter {
//!     iid: 0,
//!     mid: 0,
//!     method: MethodRef::new("app/Main", "main", "([Ljava/lang/String;)V"),
//! });
//! tracer.consume(Event::Branch { iid: 3, mid: 12 });
//! tracer.consume(Event::DidNotBranch);
//! tracer.consume(Event::FrameExit { iid: 4, mid: 13, exit: ExitKind::VoidReturn });
//!
//! let report = tracer.run()?;
//! assert_eq!(report.outcome, TraceOutcome::Completed);
//! assert_eq!(
//!     sink.lines(),
//!     vec!["BEGIN app/Main#main([Ljava/lang/String;)V", "BRANCH(-3,12)", "RET"]
//! );
//! # Ok::<(), tracetree::Error>(())
//! ```

mod builder;
pub mod config;
pub mod driver;
pub mod error;
pub mod event;
pub mod handler;
#[cfg(feature = "ndjson")]
pub mod probe;
pub mod sink;
pub mod stream;
pub mod tracer;
mod util;

// Re-export core types for convenience
pub use config::{TracerConfig, TracerConfigBuilder, MAIN_ENTRYPOINT, RUN_ENTRYPOINT};
pub use driver::{Driver, TraceOutcome, TraceReport};
pub use error::{
    BuilderError, ConsistencyFault, Error, LifecycleError, ProtocolError, TraceError, TraceResult,
};
#[cfg(feature = "ndjson")]
pub use error::ProbeError;
pub use event::{CompletionKind, Event, ExitKind, MethodRef};
#[cfg(feature = "ndjson")]
pub use probe::{feed_ndjson, EventRecorder};
pub use sink::{FileSink, MemorySink, Sink, WriterSink};
pub use stream::{EventReceiver, EventSender, EventStream};
pub use tracer::{spawn, spawn_with_config, Liveness, TraceeGuard, TraceeHandle, Tracer};
