//! Event vocabulary produced by the instrumentation probe.
//!
//! One [`Event`] is emitted per executed instruction or call boundary of the
//! observed thread, in true execution order. Every event except the pure
//! markers carries an instruction id (`iid`) and a line/method id (`mid`).
//!
//! Classification (is-invoke, is-branch, is-return) is a pure function of the
//! event tag; see [`Event::is_invoke`] and friends.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name prefix the JVM uses for instance constructors.
pub const CONSTRUCTOR_NAME: &str = "<init>";

/// A method reference: declaring owner, simple name and type descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodRef {
    /// Qualified name of the declaring type (e.g. `java/lang/Thread`).
    pub owner: String,

    /// Simple method name (e.g. `run`, `<init>`).
    pub name: String,

    /// Type descriptor (e.g. `()V`).
    pub desc: String,
}

impl MethodRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>, desc: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            desc: desc.into(),
        }
    }

    /// `name` + `desc`, the key used to match a frame entry against a pending invoke.
    pub fn name_desc(&self) -> String {
        format!("{}{}", self.name, self.desc)
    }

    /// `owner#name desc`, as printed on `BEGIN` lines.
    pub fn qualified(&self) -> String {
        format!("{}#{}{}", self.owner, self.name, self.desc)
    }

    /// Whether this reference names an instance constructor.
    pub fn is_constructor(&self) -> bool {
        self.name == CONSTRUCTOR_NAME
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified())
    }
}

/// How a frame was left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitKind {
    /// Returned a value.
    ValueReturn,
    /// Returned without a value.
    VoidReturn,
    /// An exception escaped the method.
    UncaughtThrow,
}

/// How a stepped-over call came back to its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionKind {
    Normal,
    Exception,
}

impl fmt::Display for CompletionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionKind::Normal => f.write_str("normal"),
            CompletionKind::Exception => f.write_str("exception"),
        }
    }
}

/// One atomic observation of execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    /// A new frame was pushed on the observed thread.
    FrameEnter { iid: i32, mid: i32, method: MethodRef },

    /// The current frame was left.
    FrameExit { iid: i32, mid: i32, exit: ExitKind },

    /// A call instruction is about to execute.
    ///
    /// `constructor` is set by the probe when the target is an instance
    /// constructor, so the tracer never has to guess from the name.
    Invoke {
        iid: i32,
        mid: i32,
        target: MethodRef,
        #[serde(default)]
        constructor: bool,
    },

    /// A call returned to its caller without the tracer having stepped into it.
    InvokeCompleted {
        iid: i32,
        mid: i32,
        completion: CompletionKind,
    },

    /// A conditional branch instruction (`iid` is the branch id, `mid` the line).
    Branch { iid: i32, mid: i32 },

    /// Marker: the preceding conditional branch fell through.
    DidNotBranch,

    /// Marker: the pending invoke is a `super(...)`/`this(...)` constructor delegation.
    CallingSuperOrThis,

    /// A field read from the heap. `object_id` is zero when the access faulted
    /// before the receiver was resolved.
    HeapAccess {
        iid: i32,
        mid: i32,
        object_id: i32,
        field: String,
    },

    /// Any other executed instruction.
    Instruction { iid: i32, mid: i32 },
}

impl Event {
    /// Builds an `Invoke`, deriving the constructor flag from the target.
    pub fn invoke(iid: i32, mid: i32, target: MethodRef) -> Self {
        let constructor = target.is_constructor();
        Event::Invoke {
            iid,
            mid,
            target,
            constructor,
        }
    }

    /// Instruction id and line/method id, or `None` for the pure markers.
    pub fn position(&self) -> Option<(i32, i32)> {
        match self {
            Event::FrameEnter { iid, mid, .. }
            | Event::FrameExit { iid, mid, .. }
            | Event::Invoke { iid, mid, .. }
            | Event::InvokeCompleted { iid, mid, .. }
            | Event::Branch { iid, mid }
            | Event::HeapAccess { iid, mid, .. }
            | Event::Instruction { iid, mid } => Some((*iid, *mid)),
            Event::DidNotBranch | Event::CallingSuperOrThis => None,
        }
    }

    pub fn is_frame_enter(&self) -> bool {
        matches!(self, Event::FrameEnter { .. })
    }

    pub fn is_invoke(&self) -> bool {
        matches!(self, Event::Invoke { .. })
    }

    pub fn is_invoke_completion(&self) -> bool {
        matches!(self, Event::InvokeCompleted { .. })
    }

    pub fn is_branch(&self) -> bool {
        matches!(self, Event::Branch { .. })
    }

    /// Method return or uncaught throw: the current frame is complete.
    pub fn is_return_or_throw(&self) -> bool {
        matches!(self, Event::FrameExit { .. })
    }

    pub fn is_marker(&self) -> bool {
        matches!(self, Event::DidNotBranch | Event::CallingSuperOrThis)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::FrameEnter { iid, mid, method } => {
                write!(f, "FRAME_ENTER({iid},{mid}) {method}")
            }
            Event::FrameExit { iid, mid, exit } => write!(f, "FRAME_EXIT({iid},{mid}) {exit:?}"),
            Event::Invoke { iid, mid, target, .. } => write!(f, "INVOKE({iid},{mid}) {target}"),
            Event::InvokeCompleted {
                iid,
                mid,
                completion,
            } => write!(f, "INVOKE_COMPLETED({iid},{mid}) {completion}"),
            Event::Branch { iid, mid } => write!(f, "BRANCH({iid},{mid})"),
            Event::DidNotBranch => f.write_str("DID_NOT_BRANCH"),
            Event::CallingSuperOrThis => f.write_str("CALLING_SUPER_OR_THIS"),
            Event::HeapAccess {
                iid,
                mid,
                object_id,
                field,
            } => write!(f, "HEAP_ACCESS({iid},{mid},{object_id},{field})"),
            Event::Instruction { iid, mid } => write!(f, "INSTRUCTION({iid},{mid})"),
        }
    }
}
