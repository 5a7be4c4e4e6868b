//! Event channel between the probe and the tracer, and the consumer-side
//! stream with one event of pushback.

use crate::error::{ProtocolError, TraceError};
use crate::event::Event;
use crate::tracer::Liveness;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Create an ordered event channel. `None` capacity means unbounded.
pub fn channel(capacity: Option<usize>) -> (EventSender, EventReceiver) {
    let (tx, rx) = match capacity {
        Some(cap) => crossbeam_channel::bounded(cap),
        None => crossbeam_channel::unbounded(),
    };
    let interrupted = Arc::new(AtomicBool::new(false));
    (
        EventSender {
            tx,
            interrupted: Arc::clone(&interrupted),
        },
        EventReceiver { rx, interrupted },
    )
}

/// Producer half of the event channel.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: Sender<Event>,
    interrupted: Arc<AtomicBool>,
}

impl EventSender {
    /// Enqueue an event, blocking while a bounded channel is full.
    ///
    /// Returns `false` if the consumer is gone; the stream is then marked
    /// interrupted so a consumer that is still winding down stops cleanly.
    pub fn put(&self, event: Event) -> bool {
        match self.tx.send(event) {
            Ok(()) => true,
            Err(err) => {
                warn!(event = %err.0, "Tracer is no longer consuming events");
                self.interrupt();
                false
            }
        }
    }

    /// Ask the consumer to stop at its next poll boundary.
    pub fn interrupt(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }
}

/// Consumer half of the event channel.
#[derive(Debug)]
pub struct EventReceiver {
    rx: Receiver<Event>,
    interrupted: Arc<AtomicBool>,
}

impl EventReceiver {
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Number of events waiting in the channel.
    pub fn backlog(&self) -> usize {
        self.rx.len()
    }
}

/// Forward-only event stream with a one-slot pushback buffer.
///
/// `next` waits on the channel in bounded slices of `poll_timeout`. Between
/// slices it keeps waiting only while the channel still holds a backlog or
/// the tracee is alive; once the tracee has ended and the backlog is drained
/// it yields [`TraceError::Cancelled`].
pub struct EventStream {
    rx: EventReceiver,
    pushback: Option<Event>,
    tracee: Box<dyn Liveness>,
    poll_timeout: Duration,
    received: usize,
}

impl EventStream {
    pub fn new(rx: EventReceiver, tracee: impl Liveness, poll_timeout: Duration) -> Self {
        Self {
            rx,
            pushback: None,
            tracee: Box::new(tracee),
            poll_timeout,
            received: 0,
        }
    }

    /// Next yet-unprocessed event, in FIFO order.
    pub fn next(&mut self) -> Result<Event, TraceError> {
        if let Some(event) = self.pushback.take() {
            return Ok(event);
        }

        loop {
            if self.rx.interrupted.load(Ordering::SeqCst) {
                debug!(backlog = self.rx.backlog(), "Event stream interrupted");
                return Err(TraceError::Cancelled);
            }
            // Liveness first: anything put before the tracee ended is then
            // already visible to the emptiness check.
            let alive = self.tracee.is_alive();
            if !alive && self.rx.is_empty() {
                debug!(received = self.received, "Tracee ended with empty backlog");
                return Err(TraceError::Cancelled);
            }

            match self.rx.rx.recv_timeout(self.poll_timeout) {
                Ok(event) => {
                    self.received += 1;
                    return Ok(event);
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    debug!(received = self.received, "All producers dropped");
                    return Err(TraceError::Cancelled);
                }
            }
        }
    }

    /// Return an event to the front of the stream (used by lookahead).
    ///
    /// Only one event can be pending; a second restore before the next
    /// `next` is a [`ProtocolError`].
    pub fn restore(&mut self, event: Event) -> Result<(), ProtocolError> {
        if let Some(pending) = &self.pushback {
            return Err(ProtocolError::PushbackOccupied {
                pending: pending.to_string(),
                restored: event.to_string(),
            });
        }
        self.pushback = Some(event);
        Ok(())
    }

    /// Whether an event is waiting in the pushback slot.
    pub fn has_pending(&self) -> bool {
        self.pushback.is_some()
    }

    /// Number of events taken off the channel so far.
    pub fn received(&self) -> usize {
        self.received
    }
}
