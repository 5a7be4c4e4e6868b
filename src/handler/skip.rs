use super::{Handler, StepContext, Transition};
use crate::error::TraceError;
use crate::event::Event;

/// Discard everything up to the matching exit, nesting on each frame entry.
pub(super) fn step(ctx: &mut StepContext<'_>) -> Result<Transition, TraceError> {
    let event = ctx.stream.next()?;
    Ok(match event {
        Event::FrameEnter { .. } => Transition::Push(Handler::Skip),
        e if e.is_return_or_throw() => Transition::Pop,
        _ => Transition::Stay,
    })
}
