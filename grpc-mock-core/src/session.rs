//! Session Context — the read-only view of which mock session is active.
//!
//! Session lifecycle belongs to an external subsystem. The dispatcher only
//! asks for the current value at call time and must cope with there being
//! none.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// A named scope under which mock artifacts live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub name: String,
    /// Directory holding every session's artifacts.
    pub root: PathBuf,
}

impl Session {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
        }
    }

    /// `<root>/<name>`
    pub fn dir(&self) -> PathBuf {
        self.root.join(&self.name)
    }
}

/// Accessor for the active session.
pub trait SessionContext: Send + Sync {
    fn current(&self) -> Option<Session>;
}

/// Cloneable handle onto a session slot shared with whoever manages sessions.
#[derive(Debug, Clone, Default)]
pub struct SharedSession {
    slot: Arc<RwLock<Option<Session>>>,
}

impl SharedSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle with `name` already active.
    pub fn started(name: impl Into<String>, root: impl AsRef<Path>) -> Self {
        let shared = Self::new();
        shared.start(name, root);
        shared
    }

    /// Make `name` the active session, replacing any previous one.
    pub fn start(&self, name: impl Into<String>, root: impl AsRef<Path>) {
        let session = Session::new(name, root.as_ref());
        tracing::info!("Session '{}' started", session.name);
        *self.slot.write().unwrap_or_else(|e| e.into_inner()) = Some(session);
    }

    pub fn stop(&self) {
        if let Some(session) = self.slot.write().unwrap_or_else(|e| e.into_inner()).take() {
            tracing::info!("Session '{}' stopped", session.name);
        }
    }
}

impl SessionContext for SharedSession {
    fn current(&self) -> Option<Session> {
        self.slot.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dir_joins_root_and_name() {
        let session = Session::new("checkout", "/tmp/sessions");
        assert_eq!(session.dir(), PathBuf::from("/tmp/sessions/checkout"));
    }

    #[test]
    fn new_handle_has_no_session() {
        assert_eq!(SharedSession::new().current(), None);
    }

    #[test]
    fn started_handle_is_active() {
        let shared = SharedSession::started("s1", "/data");
        assert_eq!(shared.current(), Some(Session::new("s1", "/data")));
    }

    #[test]
    fn clones_observe_start_and_stop() {
        let shared = SharedSession::new();
        let reader = shared.clone();

        shared.start("s1", "/data");
        assert_eq!(reader.current(), Some(Session::new("s1", "/data")));

        shared.start("s2", "/data");
        assert_eq!(reader.current().unwrap().name, "s2");

        shared.stop();
        assert_eq!(reader.current(), None);
    }
}
