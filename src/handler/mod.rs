//! Handler states driving call-tree reconstruction.
//!
//! The tracer keeps a LIFO [`HandlerStack`] of [`Handler`]s. Each driver
//! iteration runs one step of the handler on top; a step consumes exactly one
//! event (plus, for branches, one event of lookahead that is either the
//! `DidNotBranch` marker or restored to the stream) and reports what should
//! happen to the stack as a [`Transition`].
//!
//! - [`Handler::Base`] waits for the first top-level frame and decides whether
//!   it is a trace entry point.
//! - [`Handler::Frame`] reconstructs one live call (see [`Frame`]).
//! - [`Handler::Skip`] silently absorbs a subtree that was not stepped into.

mod base;
mod frame;
mod skip;
mod stack;

pub use frame::Frame;
pub use stack::HandlerStack;

use crate::config::TracerConfig;
use crate::error::{ConsistencyFault, TraceError};
use crate::event::Event;
use crate::sink::ScopedSink;
use crate::stream::EventStream;
use tracing::debug;

/// One nesting level of reconstruction.
#[derive(Debug)]
pub enum Handler {
    /// Initial state, below every frame.
    Base,
    /// A live call being reconstructed.
    Frame(Frame),
    /// A subtree being ignored.
    Skip,
}

impl Handler {
    pub fn as_frame(&self) -> Option<&Frame> {
        match self {
            Handler::Frame(frame) => Some(frame),
            _ => None,
        }
    }
}

/// What a step asks the driver to do with the handler stack.
#[derive(Debug)]
pub(crate) enum Transition {
    /// Keep the current handler on top.
    Stay,
    /// Push a nested handler.
    Push(Handler),
    /// The current handler is complete.
    Pop,
    /// Swap the current handler for another at the same position.
    Replace(Handler),
    /// A constructor delegation failed with `trigger`: pop the current frame
    /// and every frame still mid-delegation beneath it, then hand `trigger`
    /// back to the frame that invoked the outermost constructor.
    Unwind { trigger: Event },
}

/// Everything a step may touch besides its own handler.
pub(crate) struct StepContext<'a> {
    pub stream: &'a mut EventStream,
    pub sink: &'a mut ScopedSink,
    pub config: &'a TracerConfig,
}

/// Run one step of the handler on top of `stack`.
pub(crate) fn step(stack: &mut HandlerStack, ctx: &mut StepContext<'_>) -> Result<(), TraceError> {
    let transition = match stack.top_mut() {
        Some(Handler::Base) => base::step(ctx)?,
        Some(Handler::Frame(frame)) => frame.step(ctx)?,
        Some(Handler::Skip) => skip::step(ctx)?,
        None => return Ok(()),
    };
    apply(stack, transition, ctx)
}

fn apply(
    stack: &mut HandlerStack,
    transition: Transition,
    ctx: &mut StepContext<'_>,
) -> Result<(), TraceError> {
    match transition {
        Transition::Stay => {}
        Transition::Push(handler) => stack.push(handler),
        Transition::Pop => {
            stack.pop();
        }
        Transition::Replace(handler) => {
            stack.pop();
            stack.push(handler);
        }
        Transition::Unwind { trigger } => unwind_delegation(stack, trigger, ctx)?,
    }
    Ok(())
}

/// The failing frame has already logged its own `RET`.
fn unwind_delegation(
    stack: &mut HandlerStack,
    trigger: Event,
    ctx: &mut StepContext<'_>,
) -> Result<(), TraceError> {
    stack.pop();

    loop {
        let Some(frame) = stack.top().and_then(Handler::as_frame) else {
            return Err(ConsistencyFault::UnwindExhausted.into());
        };

        if frame.invoking_super_or_this() {
            ctx.sink.emit(frame.depth(), "RET")?;
            stack.pop();
            continue;
        }

        if !frame.pending_constructor() {
            return Err(ConsistencyFault::UnwindNonConstructor {
                frame: frame.method().qualified(),
                target: frame.invoke_target().unwrap_or("<none>").to_string(),
            }
            .into());
        }

        debug!(
            frame = %frame.method(),
            depth = frame.depth(),
            "Constructor unwind reached allocation site"
        );
        ctx.stream.restore(trigger)?;
        return Ok(());
    }
}
