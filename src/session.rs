//! Session identity and the loading → ready handshake.

use crate::file_map::FileMap;
use crate::messages::RunRequest;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one mounted player and its execution context.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// A fresh id: the decimal digits of a random fraction.
    ///
    /// There is no collision check. Ids only need to be distinct among the
    /// handful of players mounted in one process at a time.
    pub fn generate() -> Self {
        let fraction: f64 = rand::random();
        let text = fraction.to_string();
        let digits = text.strip_prefix("0.").unwrap_or(&text);
        Self(digits.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Loading,
    Ready,
}

/// Per-player protocol state.
///
/// Starts `Loading`. While loading, run requests are held back and only the
/// latest is kept. The first `ready` moves the session to `Ready` for good
/// and hands back the held request, if any, exactly once.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    status: SessionStatus,
    pending: Option<(FileMap, String)>,
}

impl Session {
    pub fn new() -> Self {
        Self::with_id(SessionId::generate())
    }

    pub fn with_id(id: SessionId) -> Self {
        Self {
            id,
            status: SessionStatus::Loading,
            pending: None,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Returns the envelope to send now, or `None` if the request was held.
    pub fn request_run(&mut self, file_map: FileMap, entry: String) -> Option<RunRequest> {
        match self.status {
            SessionStatus::Loading => {
                self.pending = Some((file_map, entry));
                None
            }
            SessionStatus::Ready => Some(RunRequest::new(file_map, entry)),
        }
    }

    /// Enter `Ready`. Returns the held request on the first call only.
    pub fn mark_ready(&mut self) -> Option<(FileMap, String)> {
        self.status = SessionStatus::Ready;
        self.pending.take()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
