//! NDJSON wire format for probe output.
//!
//! A probe that cannot call [`Tracer::consume`](crate::Tracer::consume)
//! in-process can persist its events with [`EventRecorder`], one JSON object
//! per line, and a tracer can later be fed from that file with
//! [`feed_ndjson`]:
//!
//! ```json
//! {"kind":"frame_enter","iid":0,"mid":0,"method":{"owner":"app/Main","name":"main","desc":"([Ljava/lang/String;)V"}}
//! {"kind":"branch","iid":7,"mid":12}
//! {"kind":"did_not_branch"}
//! ```

pub mod reader;
pub mod recorder;

pub use reader::{feed_ndjson, parse_event_line};
pub use recorder::EventRecorder;
