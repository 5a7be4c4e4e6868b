use super::Handler;

/// LIFO stack of handlers, with [`Handler::Base`] at the bottom until the
/// entry frame replaces it.
#[derive(Debug)]
pub struct HandlerStack {
    handlers: Vec<Handler>,
}

impl Default for HandlerStack {
    fn default() -> Self {
        Self::new()
    }
}

impl HandlerStack {
    /// A stack holding only the base handler.
    pub fn new() -> Self {
        Self {
            handlers: vec![Handler::Base],
        }
    }

    pub fn push(&mut self, handler: Handler) {
        self.handlers.push(handler);
    }

    pub fn pop(&mut self) -> Option<Handler> {
        self.handlers.pop()
    }

    pub fn top(&self) -> Option<&Handler> {
        self.handlers.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut Handler> {
        self.handlers.last_mut()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Drop every handler, forcing the driver loop to end.
    pub fn clear(&mut self) {
        self.handlers.clear();
    }

    /// Number of frame and skip levels currently open.
    pub fn nesting(&self) -> usize {
        self.handlers
            .iter()
            .filter(|h| !matches!(h, Handler::Base))
            .count()
    }
}
