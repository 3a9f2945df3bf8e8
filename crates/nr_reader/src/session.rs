use nr_core::{Error, FederatedCredential, IdentityProvider, ProfileUpdate, Result, Session};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "session", rename_all = "camelCase")]
pub enum SessionState {
    /// The identity provider has not reported yet.
    Unresolved,
    SignedOut,
    Authenticated(Session),
}

impl SessionState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, SessionState::Unresolved)
    }
}

impl From<Option<Session>> for SessionState {
    fn from(session: Option<Session>) -> Self {
        match session {
            Some(session) => SessionState::Authenticated(session),
            None => SessionState::SignedOut,
        }
    }
}

/// The one process-wide session. Only this type changes it; everyone else
/// reads or subscribes.
pub struct SessionStore {
    provider: Arc<dyn IdentityProvider>,
    state: Arc<watch::Sender<SessionState>>,
    last_error: Mutex<Option<String>>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl SessionStore {
    /// Starts `Unresolved` and follows the provider's auth state until
    /// [`SessionStore::teardown`]. Must be called from within a tokio runtime.
    pub fn init(provider: Arc<dyn IdentityProvider>) -> Self {
        let (tx, _) = watch::channel(SessionState::Unresolved);
        let state = Arc::new(tx);

        let mut auth_changes = provider.subscribe();
        let forward = state.clone();
        let listener = tokio::spawn(async move {
            // the provider's current value is the first callback
            loop {
                let next = SessionState::from(auth_changes.borrow_and_update().clone());
                forward.send_if_modified(|current| {
                    if *current != next {
                        *current = next;
                        true
                    } else {
                        false
                    }
                });
                if auth_changes.changed().await.is_err() {
                    break;
                }
            }
        });

        Self {
            provider,
            state,
            last_error: Mutex::new(None),
            listener: Mutex::new(Some(listener)),
        }
    }

    /// Stops following the provider. The last state stays readable.
    pub fn teardown(&self) {
        if let Some(listener) = self.listener.lock().unwrap_or_else(|e| e.into_inner()).take() {
            listener.abort();
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn current(&self) -> Option<Session> {
        self.state.borrow().session().cloned()
    }

    pub fn require_session(&self) -> Result<Session> {
        self.current().ok_or(Error::Unauthenticated)
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Records the outcome of a provider call and mirrors it into the state.
    fn settle(&self, what: &str, outcome: Result<Option<Session>>) -> Result<Option<Session>> {
        let mut last_error = self.last_error.lock().unwrap_or_else(|e| e.into_inner());
        match outcome {
            Ok(session) => {
                *last_error = None;
                self.state.send_replace(SessionState::from(session.clone()));
                Ok(session)
            }
            Err(e) => {
                error!("{} failed: {}", what, e);
                *last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub async fn signin(&self, email: &str, password: &str) -> Result<Session> {
        let outcome = self.provider.sign_in_with_email(email, password).await.map(Some);
        let session = self.settle("Sign in", outcome)?;
        session.ok_or(Error::Unauthenticated)
    }

    pub async fn signup(&self, name: Option<&str>, email: &str, password: &str) -> Result<Session> {
        let outcome = self.provider.sign_up(name, email, password).await.map(Some);
        let session = self.settle("Sign up", outcome)?;
        session.ok_or(Error::Unauthenticated)
    }

    pub async fn provider_signin(&self, credential: &FederatedCredential) -> Result<Session> {
        let outcome = self.provider.sign_in_with_provider(credential).await.map(Some);
        let session = self.settle("Provider sign in", outcome)?;
        session.ok_or(Error::Unauthenticated)
    }

    pub async fn guest_signin(&self) -> Result<Session> {
        let outcome = self.provider.sign_in_anonymously().await.map(Some);
        let session = self.settle("Guest sign in", outcome)?;
        info!("👤 Signed in as guest");
        session.ok_or(Error::Unauthenticated)
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Session> {
        let outcome = self.provider.update_profile(update).await.map(Some);
        let session = self.settle("Profile update", outcome)?;
        session.ok_or(Error::Unauthenticated)
    }

    pub async fn signout(&self) -> Result<()> {
        let outcome = self.provider.sign_out().await.map(|_| None);
        self.settle("Sign out", outcome).map(|_| ())
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        self.teardown();
    }
}
