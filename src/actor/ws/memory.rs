//! In-memory client transport for tests.

use std::cell::RefCell;
use std::rc::Rc;

use super::registry::{ClientTransport, TransportError};

/// Records every frame; clones share the recording.
#[derive(Clone, Default)]
pub(super) struct MemoryTransport {
    pub(super) sent: Rc<RefCell<Vec<String>>>,
    pub(super) closed: Rc<RefCell<bool>>,
    pub(super) broken: bool,
}

impl MemoryTransport {
    pub(super) fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }

    pub(super) fn frames(&self) -> Vec<String> {
        self.sent.borrow().clone()
    }
}

impl ClientTransport for MemoryTransport {
    fn send_text(&mut self, text: &str) -> Result<(), TransportError> {
        if self.broken || *self.closed.borrow() {
            return Err(TransportError::Closed);
        }
        self.sent.borrow_mut().push(text.to_string());
        Ok(())
    }

    fn close(&mut self) {
        *self.closed.borrow_mut() = true;
    }
}
