//! Inbound event routing.
//!
//! Every execution context reports back over one shared channel, so each
//! inbound message is matched to its player by session id. The router is
//! the single listener on that channel.
//!
//! # Lifecycle
//!
//! - One router per UI thread, created on first use by [`MessageRouter::global`]
//!   and never torn down. Tearing it down would silently cut every mounted
//!   player off from its events.
//! - Players register on mount and unregister on drop. Both are idempotent.
//! - The registry holds weak references only; a player that is gone is
//!   treated like a foreign session.
//!
//! Messages that fail to decode and messages for unknown sessions are
//! dropped without a trace. Both are routine on a shared channel.

use crate::messages::InboundMessage;
use crate::session::SessionId;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

/// Receiver of one session's events.
pub trait SessionHandler {
    fn session_id(&self) -> &SessionId;
    fn handle(&self, message: InboundMessage);
}

thread_local! {
    static ROUTER: Rc<MessageRouter> = Rc::new(MessageRouter::new());
}

#[derive(Default)]
pub struct MessageRouter {
    sessions: RefCell<HashMap<SessionId, Weak<dyn SessionHandler>>>,
}

impl MessageRouter {
    /// A standalone router. Most callers want [`MessageRouter::global`].
    pub fn new() -> Self {
        Self::default()
    }

    /// This thread's router, installed on first call.
    pub fn global() -> Rc<MessageRouter> {
        ROUTER.with(Rc::clone)
    }

    pub fn register(&self, handler: Weak<dyn SessionHandler>) {
        let Some(live) = handler.upgrade() else {
            return;
        };
        let id = live.session_id().clone();
        self.sessions.borrow_mut().insert(id, handler);
    }

    pub fn unregister(&self, id: &SessionId) {
        self.sessions.borrow_mut().remove(id);
    }

    pub fn is_registered(&self, id: &SessionId) -> bool {
        self.sessions.borrow().contains_key(id)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.borrow().len()
    }

    /// Entry point for serialized messages from sandboxed frames.
    pub fn deliver_raw(&self, text: &str) {
        if let Ok(message) = InboundMessage::decode(text) {
            self.deliver(message);
        }
    }

    /// Entry point for already-structured messages from shared environments.
    pub fn deliver(&self, message: InboundMessage) {
        // Release the registry before calling out; handlers may mount or
        // unmount players.
        let handler = self
            .sessions
            .borrow()
            .get(message.session_id())
            .and_then(Weak::upgrade);

        if let Some(handler) = handler {
            handler.handle(message);
        }
    }
}
