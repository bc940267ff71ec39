//! How a run request reaches the execution context.

use crate::messages::RunRequest;
use std::rc::Rc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

/// An execution context living in the same process as the player.
///
/// Requests are handed over as values, with no serialization.
pub trait SharedEnvironment {
    fn receive(&self, request: RunRequest);
}

/// Outbound side of a player.
#[derive(Clone)]
pub enum Transport {
    /// Direct call into an in-process execution context
    Shared(Rc<dyn SharedEnvironment>),
    /// Serialized message posted to a sandboxed frame. There is no origin
    /// check on either side: the frame boundary is the isolation.
    Isolated(UnboundedSender<String>),
}

impl Transport {
    pub fn shared(environment: Rc<dyn SharedEnvironment>) -> Self {
        Transport::Shared(environment)
    }

    pub fn isolated(frame: UnboundedSender<String>) -> Self {
        Transport::Isolated(frame)
    }

    pub fn is_shared(&self) -> bool {
        matches!(self, Transport::Shared(_))
    }

    /// Deliver a request. Fire and forget: a frame that has gone away simply
    /// never answers.
    pub fn post(&self, request: RunRequest) {
        match self {
            Transport::Shared(environment) => environment.receive(request),
            Transport::Isolated(frame) => match request.to_message() {
                Ok(message) => {
                    if frame.send(message).is_err() {
                        debug!("frame closed, run request dropped");
                    }
                }
                Err(e) => warn!(error = %e, "failed to encode run request"),
            },
        }
    }
}
