use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, watch, OnceCell};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::models::{ApiRequest, BearerToken, Identity, SessionEvent, SessionPhase, SessionState};
use crate::services::auth_client::status_error;
use crate::services::{AuthClient, FilePersistStore, PersistStore, SessionStore};

/// Shared result of the single boot renewal.
pub type BootOutcome = Result<SessionPhase, Arc<SessionError>>;

struct Inner {
    client: AuthClient,
    store: SessionStore,
    persist: Arc<dyn PersistStore>,
    boot: OnceCell<BootOutcome>,
    logout_grace: Duration,
    pending_reset: Mutex<Option<JoinHandle<()>>>,
}

impl Inner {
    /// Store a new credential, cancelling any `Reset` still owed to a
    /// previous logout so it cannot clobber the new session.
    fn adopt(&self, token: BearerToken) -> Result<(), SessionError> {
        self.store.set_token(token)?;
        if let Some(handle) = self.take_pending_reset() {
            debug!("Cancelling pending reset for new session");
            handle.abort();
        }
        Ok(())
    }

    fn take_pending_reset(&self) -> Option<JoinHandle<()>> {
        self.pending_reset
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }
}

/// Keeps a user logged in across restarts and expired access tokens.
///
/// Cloning is cheap and every clone drives the same session.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<Inner>,
}

impl SessionController {
    pub fn new(config: &SessionConfig) -> Result<Self, SessionError> {
        let persist = Arc::new(FilePersistStore::new(config.persist_dir.clone()));
        Self::with_persist_store(config, persist)
    }

    pub fn with_persist_store(
        config: &SessionConfig,
        persist: Arc<dyn PersistStore>,
    ) -> Result<Self, SessionError> {
        Ok(Self::from_parts(AuthClient::new(config)?, persist, config.logout_grace()))
    }

    pub fn from_parts(
        client: AuthClient,
        persist: Arc<dyn PersistStore>,
        logout_grace: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                store: SessionStore::new(),
                persist,
                boot: OnceCell::new(),
                logout_grace,
                pending_reset: Mutex::new(None),
            }),
        }
    }

    /// Resume with an access token obtained elsewhere, e.g. handed over by
    /// another process sharing the same cookie store.
    pub fn with_token(
        client: AuthClient,
        persist: Arc<dyn PersistStore>,
        logout_grace: Duration,
        token: BearerToken,
    ) -> Result<Self, SessionError> {
        let controller = Self::from_parts(client, persist, logout_grace);
        controller.inner.adopt(token)?;
        Ok(controller)
    }

    /// Read-only view of the session state.
    pub fn store(&self) -> &SessionStore {
        &self.inner.store
    }

    pub fn phase(&self) -> SessionPhase {
        self.inner.store.phase()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.inner.store.identity()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.store.subscribe()
    }

    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.store.events()
    }

    /// Restore the session on start-up.
    ///
    /// Only the first call does any work; every caller, concurrent or later,
    /// gets the same outcome.
    pub async fn boot(&self) -> BootOutcome {
        self.inner
            .boot
            .get_or_init(|| self.boot_once())
            .await
            .clone()
    }

    async fn boot_once(&self) -> BootOutcome {
        let store = &self.inner.store;

        if store.token().is_some() {
            store.set_phase(SessionPhase::Active);
            return Ok(SessionPhase::Active);
        }

        if !self.inner.persist.load().await {
            debug!("Persistence disabled, skipping silent renewal");
            store.set_phase(SessionPhase::NoSession);
            return Ok(SessionPhase::NoSession);
        }

        store.set_phase(SessionPhase::Renewing);
        match self.renew().await {
            Ok(_) => {
                info!("Session restored");
                Ok(SessionPhase::Active)
            }
            Err(e) => {
                warn!(error = %e, "Silent renewal failed");
                store.clear(SessionPhase::RenewFailed);
                Err(Arc::new(e))
            }
        }
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<Identity, SessionError> {
        let token = self.inner.client.login(username, password).await?;
        self.inner.adopt(token)?;
        self.inner
            .store
            .identity()
            .ok_or_else(|| SessionError::Decode("identity missing after login".to_string()))
    }

    async fn renew(&self) -> Result<BearerToken, SessionError> {
        let token = self.inner.client.refresh().await?;
        self.inner.adopt(token.clone())?;
        Ok(token)
    }

    /// Send a protected request, renewing the access token once if the server
    /// rejects it with 403.
    ///
    /// The retry is built only after renewal has settled, so it always
    /// carries the new token. A renewal refused with 401/403 ends the
    /// session; transport and server failures leave it intact. Either way the
    /// renewal error is returned as-is.
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn send(&self, request: &ApiRequest) -> Result<Response, SessionError> {
        let token = self.inner.store.token();
        let response = self.inner.client.execute(request, token.as_ref()).await?;

        if response.status() != StatusCode::FORBIDDEN {
            return Ok(response);
        }

        debug!("Access token rejected, renewing");
        let token = match self.renew().await {
            Ok(token) => token,
            Err(e) if e.requires_login() => {
                warn!(error = %e, "Renewal refused, session ended");
                self.inner.store.clear(SessionPhase::RenewFailed);
                return Err(e);
            }
            Err(e) => {
                warn!(error = %e, "Renewal failed, keeping current session");
                return Err(e);
            }
        };

        self.inner.client.execute(request, Some(&token)).await
    }

    pub async fn send_json<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T, SessionError> {
        let response = self.send(request).await?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        Ok(response.json::<T>().await?)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, SessionError> {
        self.send_json(&ApiRequest::get(path)).await
    }

    /// Revoke the refresh cookie and drop local state.
    ///
    /// Local state is cleared even when the server is unreachable; the revoke
    /// error is still returned so the caller can report it.
    pub async fn logout(&self) -> Result<(), SessionError> {
        let result = self.inner.client.logout().await;
        if let Err(e) = &result {
            warn!(error = %e, "Logout request failed, clearing local session anyway");
        }

        self.inner.store.clear(SessionPhase::NoSession);
        self.inner.store.emit(SessionEvent::LoggedOut);

        let inner = self.inner.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(inner.logout_grace).await;
            inner.store.emit(SessionEvent::Reset);
        });

        let previous = self
            .inner
            .pending_reset
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }

        result
    }

    pub async fn persist(&self) -> bool {
        self.inner.persist.load().await
    }

    pub async fn set_persist(&self, persist: bool) -> Result<(), SessionError> {
        self.inner.persist.save(persist).await
    }
}
