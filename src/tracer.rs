//! Tracer lifecycle: one tracer per observed thread.
//!
//! The probe side calls [`Tracer::consume`] for every event of the observed
//! thread; the consumer side runs a [`Driver`] on its own thread, started with
//! [`Tracer::start`] and observed with [`Tracer::join`].
//!
//! # Example
//!
//! ```
//! use tracetree::{Event, MemorySink, MethodRef, ExitKind, TraceOutcome, Tracer, TraceeHandle};
//!
//! let sink = MemorySink::new();
//! let (tracee, guard) = TraceeHandle::new();
//! let mut tracer = Tracer::new(tracee, sink.clone());
//! tracer.start()?;
//!
//! tracer.consume(Event::FrameEnter {
//!     iid: 0,
//!     mid: 0,
//!     method: MethodRef::new("app/Worker", "run", "()V"),
//! });
//! tracer.consume(Event::FrameExit { iid: 1, mid: 4, exit: ExitKind::VoidReturn });
//! guard.finish();
//!
//! let report = tracer.join()?;
//! assert_eq!(report.outcome, TraceOutcome::Completed);
//! assert_eq!(sink.lines(), vec!["BEGIN app/Worker#run()V", "RET"]);
//! # Ok::<(), tracetree::Error>(())
//! ```

use crate::config::TracerConfig;
use crate::driver::{Driver, TraceReport};
use crate::error::LifecycleError;
use crate::event::Event;
use crate::sink::Sink;
use crate::stream::{self, EventSender, EventStream};
use crate::util::panic_message;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, info};

/// Whether the observed thread is still running.
pub trait Liveness: Send + 'static {
    fn is_alive(&self) -> bool;
}

impl<T: Send + 'static> Liveness for JoinHandle<T> {
    fn is_alive(&self) -> bool {
        !self.is_finished()
    }
}

/// Shared liveness flag for an observed thread.
#[derive(Debug, Clone)]
pub struct TraceeHandle {
    alive: Arc<AtomicBool>,
}

impl TraceeHandle {
    /// A live tracee, plus the guard that marks it finished when dropped.
    pub fn new() -> (Self, TraceeGuard) {
        let alive = Arc::new(AtomicBool::new(true));
        (
            Self {
                alive: Arc::clone(&alive),
            },
            TraceeGuard { alive },
        )
    }

    /// A tracee that has already ended: the tracer drains what is queued and stops.
    pub fn finished() -> Self {
        Self {
            alive: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl Liveness for TraceeHandle {
    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }
}

/// Held by the observed thread; marks the tracee finished on drop.
#[derive(Debug)]
pub struct TraceeGuard {
    alive: Arc<AtomicBool>,
}

impl TraceeGuard {
    /// Mark the tracee finished now.
    pub fn finish(self) {}
}

impl Drop for TraceeGuard {
    fn drop(&mut self) {
        self.alive.store(false, Ordering::SeqCst);
    }
}

/// Reconstructs the call tree of one observed thread.
pub struct Tracer {
    tx: EventSender,
    driver: Option<Driver>,
    thread: Option<JoinHandle<TraceReport>>,
    thread_name: String,
}

impl Tracer {
    /// Create a tracer with the default configuration.
    pub fn new(tracee: impl Liveness, sink: impl Sink) -> Self {
        Self::with_config(tracee, sink, TracerConfig::default())
    }

    pub fn with_config(tracee: impl Liveness, sink: impl Sink, config: TracerConfig) -> Self {
        let (tx, rx) = stream::channel(config.channel_capacity);
        let thread_name = config.thread_name.clone();
        let events = EventStream::new(rx, tracee, config.poll_timeout);
        Self {
            tx,
            driver: Some(Driver::new(events, sink, config)),
            thread: None,
            thread_name,
        }
    }

    /// Spawn the consumer thread.
    pub fn start(&mut self) -> Result<(), LifecycleError> {
        let driver = self.driver.take().ok_or(LifecycleError::AlreadyStarted)?;
        let handle = std::thread::Builder::new()
            .name(self.thread_name.clone())
            .spawn(move || driver.run())
            .map_err(|e| LifecycleError::Spawn {
                name: self.thread_name.clone(),
                reason: e.to_string(),
            })?;
        info!(thread = %self.thread_name, "Tracer started");
        self.thread = Some(handle);
        Ok(())
    }

    /// Send an event to the tracer (producer side).
    ///
    /// Blocks while a bounded channel is full. Returns `false` if the
    /// consumer has already stopped.
    pub fn consume(&self, event: Event) -> bool {
        self.tx.put(event)
    }

    /// Another producer handle onto this tracer's channel.
    pub fn sender(&self) -> EventSender {
        self.tx.clone()
    }

    /// Ask the consumer to stop at its next poll boundary.
    pub fn interrupt(&self) {
        debug!(thread = %self.thread_name, "Tracer interrupt requested");
        self.tx.interrupt();
    }

    pub fn is_started(&self) -> bool {
        self.driver.is_none()
    }

    /// Wait for the consumer thread to finish and return its report.
    ///
    /// This handle's sender is dropped first, so once the backlog is drained
    /// the consumer stops even if other producers still hold a sender.
    pub fn join(self) -> Result<TraceReport, LifecycleError> {
        let Tracer { tx, thread, .. } = self;
        let handle = thread.ok_or(LifecycleError::NotStarted)?;
        drop(tx);
        handle
            .join()
            .map_err(|payload| LifecycleError::ConsumerPanicked(panic_message(&*payload)))
    }

    /// Run the consumer on the calling thread instead of spawning one.
    pub fn run(self) -> Result<TraceReport, LifecycleError> {
        let Tracer { tx, driver, .. } = self;
        let driver = driver.ok_or(LifecycleError::AlreadyStarted)?;
        drop(tx);
        Ok(driver.run())
    }
}

/// Create and start a tracer for the calling thread.
///
/// The returned guard must stay alive for as long as the calling thread is
/// producing events; dropping it tells the tracer the thread has ended.
pub fn spawn(sink: impl Sink) -> Result<(Tracer, TraceeGuard), LifecycleError> {
    spawn_with_config(sink, TracerConfig::default())
}

pub fn spawn_with_config(
    sink: impl Sink,
    config: TracerConfig,
) -> Result<(Tracer, TraceeGuard), LifecycleError> {
    let (tracee, guard) = TraceeHandle::new();
    let mut tracer = Tracer::with_config(tracee, sink, config);
    tracer.start()?;
    Ok((tracer, guard))
}
