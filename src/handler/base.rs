use super::{Frame, Handler, StepContext, Transition};
use crate::error::TraceError;
use crate::event::Event;
use tracing::{debug, info, warn};

/// Wait for a top-level frame. Entry points start the trace at depth 0;
/// anything else (startup, class loading) is skipped wholesale.
pub(super) fn step(ctx: &mut StepContext<'_>) -> Result<Transition, TraceError> {
    match ctx.stream.next()? {
        Event::FrameEnter { method, .. } if ctx.config.is_entrypoint(&method.name_desc()) => {
            info!(entrypoint = %method, "Trace entry point reached");
            let frame = Frame::enter(method, 0, ctx.sink)?;
            Ok(Transition::Replace(Handler::Frame(frame)))
        }
        Event::FrameEnter { method, .. } => {
            debug!(method = %method, "Skipping top-level call");
            Ok(Transition::Push(Handler::Skip))
        }
        event => {
            warn!(event = %event, "Unexpected top-level event outside any frame");
            Ok(Transition::Stay)
        }
    }
}
