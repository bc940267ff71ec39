//! Ops exposed to the execution context and the extension bundling them.

use crate::messages::{ConsoleCommand, InboundMessage};
use crate::session::SessionId;
use deno_core::{op2, OpState};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

/// Where an execution context posts its events, and under which session.
#[derive(Debug, Clone)]
pub struct FrameOutbox {
    pub session_id: SessionId,
    pub sender: UnboundedSender<String>,
}

impl FrameOutbox {
    pub fn new(session_id: SessionId, sender: UnboundedSender<String>) -> Self {
        Self { session_id, sender }
    }

    /// Encode and post one event. A player that went away is not an error.
    pub fn post(&self, message: &InboundMessage) {
        match message.encode() {
            Ok(text) => {
                if self.sender.send(text).is_err() {
                    debug!(session = %self.session_id, "player closed, event dropped");
                }
            }
            Err(e) => warn!(session = %self.session_id, error = %e, "failed to encode event"),
        }
    }

    pub fn ready(&self) {
        self.post(&InboundMessage::Ready {
            id: self.session_id.clone(),
        });
    }

    pub fn error(&self, payload: impl Into<String>) {
        self.post(&InboundMessage::Error {
            id: self.session_id.clone(),
            payload: payload.into(),
        });
    }

    pub fn console(&self, payload: ConsoleCommand) {
        self.post(&InboundMessage::Console {
            id: self.session_id.clone(),
            payload,
        });
    }
}

/// A console call from the shim: `payload` is an extended JSON console command.
#[op2(fast)]
pub fn op_player_console(state: &mut OpState, #[string] payload: &str) {
    let Some(outbox) = state.try_borrow::<FrameOutbox>() else {
        return;
    };
    match ConsoleCommand::decode(payload) {
        Ok(command) => outbox.console(command),
        Err(e) => warn!(session = %outbox.session_id, error = %e, "dropping malformed console call"),
    }
}

deno_core::extension!(
    playground_runtime,
    ops = [op_player_console],
    esm_entry_point = "ext:playground_runtime/bootstrap.js",
    esm = ["ext:playground_runtime/bootstrap.js" = "src/bootstrap.js"],
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extended_json::Value;

    #[test]
    fn test_outbox_wraps_events_in_session() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let outbox = FrameOutbox::new(SessionId::from("42"), tx);

        outbox.ready();
        outbox.error("boom");
        outbox.console(ConsoleCommand::log(vec![Value::Undefined]));

        let events: Vec<InboundMessage> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|text| InboundMessage::decode(&text).unwrap())
            .collect();
        assert_eq!(
            events,
            vec![
                InboundMessage::Ready { id: "42".into() },
                InboundMessage::Error { id: "42".into(), payload: "boom".into() },
                InboundMessage::Console {
                    id: "42".into(),
                    payload: ConsoleCommand::log(vec![Value::Undefined]),
                },
            ]
        );
    }

    #[test]
    fn test_closed_player_is_ignored() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        drop(rx);
        let outbox = FrameOutbox::new(SessionId::from("42"), tx);
        outbox.ready();
        outbox.error("boom");
        outbox.console(ConsoleCommand::Clear);
    }
}
