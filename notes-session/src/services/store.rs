use tokio::sync::{broadcast, watch};

use crate::error::SessionError;
use crate::models::{BearerToken, Identity, SessionEvent, SessionPhase, SessionState};

/// In-memory session state. Only the controller writes; everyone else reads
/// or subscribes.
pub struct SessionStore {
    state: watch::Sender<SessionState>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionStore {
    pub fn new() -> Self {
        let (state, _) = watch::channel(SessionState::default());
        let (events, _) = broadcast::channel(16);
        Self { state, events }
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.borrow().phase
    }

    pub fn token(&self) -> Option<BearerToken> {
        self.state.borrow().token.clone()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.state.borrow().identity.clone()
    }

    pub(crate) fn set_phase(&self, phase: SessionPhase) {
        self.state.send_modify(|s| s.phase = phase);
    }

    /// Store a fresh credential and mark the session active.
    pub(crate) fn set_token(&self, token: BearerToken) -> Result<(), SessionError> {
        let identity = Identity::from_token(&token)?;
        self.state.send_modify(|s| {
            s.phase = SessionPhase::Active;
            s.token = Some(token);
            s.identity = Some(identity);
        });
        Ok(())
    }

    /// Drop the credential and derived identity, leaving `phase` behind.
    pub(crate) fn clear(&self, phase: SessionPhase) {
        self.state.send_modify(|s| {
            s.phase = phase;
            s.token = None;
            s.identity = None;
        });
    }

    pub(crate) fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
