use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::Settings;
use crate::domain::Session;

/// Shared application state holding the single clustering session.
///
/// Handlers lock the session for the whole operation, so concurrent
/// requests serialize and only ever observe pre-step or fully-updated
/// post-step state.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Mutex<Session>>,
}

impl AppState {
    /// Create `AppState` from configuration settings.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        let session = Session::new(
            settings.convergence_policy(),
            settings.max_dataset_size,
            settings.rng_seed,
        );
        Self {
            session: Arc::new(Mutex::new(session)),
        }
    }

    /// Wrap an existing session. Used by tests to inject seeded sessions.
    #[must_use]
    pub fn with_session(session: Session) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
        }
    }
}
