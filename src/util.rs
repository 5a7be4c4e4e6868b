//! Internal utility functions.

use std::any::Any;

/// Two spaces per nesting level.
pub fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}

/// Render a caught panic payload as text.
///
/// Panics raised with `panic!("literal")` carry a `&str`, formatted ones a
/// `String`; anything else is reported opaquely.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
