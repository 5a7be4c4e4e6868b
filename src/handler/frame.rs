use super::{Handler, StepContext, Transition};
use crate::error::{ConsistencyFault, TraceError};
use crate::event::{CompletionKind, Event, MethodRef};
use crate::sink::ScopedSink;
use std::io;
use tracing::warn;

/// The call a frame is about to make, recorded between `Invoke` and either
/// the callee's `FrameEnter` or the `InvokeCompleted` that steps over it.
#[derive(Debug, Clone)]
struct PendingInvoke {
    name_desc: String,
    constructor: bool,
}

impl PendingInvoke {
    fn from_event(event: &Event) -> Option<Self> {
        match event {
            Event::Invoke {
                target,
                constructor,
                ..
            } => Some(Self {
                name_desc: target.name_desc(),
                constructor: *constructor,
            }),
            _ => None,
        }
    }
}

/// One live call being reconstructed.
#[derive(Debug)]
pub struct Frame {
    depth: usize,
    method: MethodRef,
    invoke_target: Option<PendingInvoke>,
    invoking_super_or_this: bool,
    last_iid: i32,
    last_mid: i32,
}

impl Frame {
    /// Open a frame and log its `BEGIN` line.
    pub(crate) fn enter(method: MethodRef, depth: usize, sink: &mut ScopedSink) -> io::Result<Self> {
        sink.emit(depth, &format!("BEGIN {}", method.qualified()))?;
        Ok(Self {
            depth,
            method,
            invoke_target: None,
            invoking_super_or_this: false,
            last_iid: 0,
            last_mid: 0,
        })
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn method(&self) -> &MethodRef {
        &self.method
    }

    /// Name+descriptor of the pending invoke, if any.
    pub fn invoke_target(&self) -> Option<&str> {
        self.invoke_target.as_ref().map(|t| t.name_desc.as_str())
    }

    /// Whether the pending invoke is a constructor call.
    pub fn pending_constructor(&self) -> bool {
        self.invoke_target.as_ref().is_some_and(|t| t.constructor)
    }

    /// Whether this frame is inside a `super(...)`/`this(...)` delegation.
    pub fn invoking_super_or_this(&self) -> bool {
        self.invoking_super_or_this
    }

    /// `(iid, mid)` of the last non-frame-entry event seen by this frame.
    pub fn last_position(&self) -> (i32, i32) {
        (self.last_iid, self.last_mid)
    }

    pub(crate) fn step(&mut self, ctx: &mut StepContext<'_>) -> Result<Transition, TraceError> {
        let event = ctx.stream.next()?;

        if let Event::FrameEnter { method, .. } = event {
            let steps_into = self
                .invoke_target
                .as_ref()
                .is_some_and(|t| t.name_desc == method.name_desc());
            if !steps_into {
                // Class initialization or other machinery we never invoked.
                return Ok(Transition::Push(Handler::Skip));
            }
            ctx.sink.emit(
                self.depth,
                &format!("CALL({},{})", self.last_iid, self.last_mid),
            )?;
            let callee = Frame::enter(method, self.depth + 1, ctx.sink)?;
            return Ok(Transition::Push(Handler::Frame(callee)));
        }

        if let Event::InvokeCompleted {
            iid,
            mid,
            completion,
        } = &event
        {
            if self.invoke_target.is_none() {
                return Err(ConsistencyFault::StrayCompletion {
                    kind: completion.to_string(),
                    iid: *iid,
                    mid: *mid,
                }
                .into());
            }
        }

        if event.is_marker() {
            if matches!(event, Event::CallingSuperOrThis) {
                self.invoking_super_or_this = true;
            }
            // A fall-through marker not consumed by a branch lookahead is dropped.
            return Ok(Transition::Stay);
        }

        if event.is_invoke() {
            self.invoke_target = PendingInvoke::from_event(&event);
        } else if let Some(pending) = self.invoke_target.take() {
            // Not stepped into, so this should be the call coming back.
            let delegation_failed = if !event.is_invoke_completion() {
                warn!(
                    frame = %self.method,
                    target = %pending.name_desc,
                    event = %event,
                    "Pending invoke stepped over without a completion"
                );
                false
            } else if self.invoking_super_or_this {
                self.invoking_super_or_this = false;
                matches!(
                    event,
                    Event::InvokeCompleted {
                        completion: CompletionKind::Exception,
                        ..
                    }
                )
            } else {
                false
            };
            if delegation_failed {
                // Construction never finished: this frame is gone too.
                ctx.sink.emit(self.depth, "RET")?;
                return Ok(Transition::Unwind { trigger: event });
            }
        }

        if event.is_branch() {
            self.log_branch(&event, ctx)?;
        }

        if let Event::HeapAccess {
            iid,
            mid,
            object_id,
            field,
        } = &event
        {
            // Zero means the access faulted before the receiver resolved.
            if *object_id != 0 {
                ctx.sink.emit(
                    self.depth,
                    &format!("HEAPLOAD({iid},{mid},{object_id},{field})"),
                )?;
            }
        }

        let transition = if event.is_return_or_throw() {
            ctx.sink.emit(self.depth, "RET")?;
            Transition::Pop
        } else {
            Transition::Stay
        };

        if let Some((iid, mid)) = event.position() {
            self.last_iid = iid;
            self.last_mid = mid;
        }

        Ok(transition)
    }

    /// Log a branch, consuming the `DidNotBranch` marker when the branch fell
    /// through. Ids are widened so negating any `i32` iid is exact.
    fn log_branch(&self, branch: &Event, ctx: &mut StepContext<'_>) -> Result<(), TraceError> {
        let Some((iid, mid)) = branch.position() else {
            return Ok(());
        };
        let lookahead = ctx.stream.next()?;
        let branch_id = if matches!(lookahead, Event::DidNotBranch) {
            -i64::from(iid)
        } else {
            ctx.stream.restore(lookahead)?;
            i64::from(iid)
        };
        ctx.sink
            .emit(self.depth, &format!("BRANCH({branch_id},{mid})"))?;
        Ok(())
    }
}
