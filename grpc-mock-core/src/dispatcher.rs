//! CallDispatcher — the generic handler behind every bound method.
//!
//! Resolution, short-circuiting on the first applicable step:
//!
//! ```text
//! Start → SessionChecked ─┬─ no session ──────────────→ Unavailable
//!                         └─ StatusChecked ─┬─ code≠0 ─→ ErrorReturned
//!                                           └─ ContentChecked ─┬─ Success
//!                                                              └─ NotFound
//! ```
//!
//! Every call yields exactly one [`CallOutcome`]. Dropping the future before
//! it completes abandons any pending read and yields nothing.

use std::sync::Arc;

use crate::catalog::MethodKey;
use crate::outcome::{CallError, CallOutcome};
use crate::session::{Session, SessionContext};
use crate::store::MockStore;

pub const NO_SESSION_MESSAGE: &str = "no session started";

pub struct CallDispatcher {
    sessions: Arc<dyn SessionContext>,
    store: Arc<dyn MockStore>,
}

impl CallDispatcher {
    pub fn new(sessions: Arc<dyn SessionContext>, store: Arc<dyn MockStore>) -> Self {
        Self { sessions, store }
    }

    /// The active session, or the Unavailable error every call gets without one.
    pub fn session(&self) -> Result<Session, CallError> {
        self.sessions
            .current()
            .ok_or_else(|| CallError::unavailable(NO_SESSION_MESSAGE))
    }

    /// Resolve one call addressed to `method_path` (`/<package>.<service>/<method>`).
    pub async fn handle(&self, method_path: &str) -> CallOutcome {
        let session = match self.session() {
            Ok(session) => session,
            Err(err) => {
                tracing::warn!("{method_path}: {}", err.message);
                return CallOutcome::Failure(err);
            }
        };

        let Some(key) = MethodKey::from_path(method_path) else {
            tracing::warn!("Unroutable method path '{method_path}'");
            return CallOutcome::Failure(CallError::not_found(format!(
                "no method in path {method_path}"
            )));
        };

        self.resolve(&session, &key.method).await
    }

    async fn resolve(&self, session: &Session, method: &str) -> CallOutcome {
        match self.store.load_status(session, method).await {
            Ok(Some(status)) if !status.is_success() => {
                tracing::debug!(
                    "{method} in session '{}': injected status {}",
                    session.name,
                    status.code
                );
                return CallOutcome::Failure(CallError::new(status.code, status.message));
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("{method} in session '{}': {e}", session.name);
                return not_found(session, method);
            }
        }

        match self.store.load_content(session, method).await {
            Ok(Some(content)) => {
                tracing::debug!("{method} in session '{}': serving content", session.name);
                CallOutcome::Success(content)
            }
            Ok(None) => not_found(session, method),
            Err(e) => {
                tracing::warn!("{method} in session '{}': {e}", session.name);
                not_found(session, method)
            }
        }
    }
}

fn not_found(session: &Session, method: &str) -> CallOutcome {
    let err = CallError::missing_mock(method);
    tracing::warn!("{} (session '{}')", err.message, session.name);
    CallOutcome::Failure(err)
}
