//! Client-side session state and the calls that change it.

use std::sync::Arc;

use tokio::{
    sync::{
        broadcast::{self, error::RecvError},
        watch,
    },
    task::JoinHandle,
};

use crate::{
    Acknowledgement, SessionData,
    auth::{SignInRequest, SignUpRequest},
    client::{ApiClient, ClientError},
    endpoints,
};

const SIGNAL_CAPACITY: usize = 16;

/// Published after every successful change to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSignal {
    /// A user signed in with their email and password.
    SignedIn,
    /// A new user registered and was signed in.
    SignedUp,
    /// The session was ended.
    SignedOut,
}

/// Where the client should go next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Continue to the requested page.
    Allow,
    /// Go to this path instead.
    Redirect(&'static str),
}

#[derive(Debug)]
struct AuthInner {
    api: ApiClient,
    session: watch::Sender<Option<SessionData>>,
    signals: broadcast::Sender<SessionSignal>,
}

/// Wraps the auth endpoints and holds the current session.
///
/// Cloning the store shares its state.
#[derive(Debug, Clone)]
pub struct AuthStore {
    inner: Arc<AuthInner>,
}

impl AuthStore {
    /// Create a store with no session that talks to the server through `api`.
    pub fn new(api: ApiClient) -> Self {
        let (signals, _) = broadcast::channel(SIGNAL_CAPACITY);

        Self {
            inner: Arc::new(AuthInner {
                api,
                session: watch::Sender::new(None),
                signals,
            }),
        }
    }

    /// The last known session.
    pub fn session(&self) -> Option<SessionData> {
        self.inner.session.borrow().clone()
    }

    /// Whether the last known session belongs to a signed in user.
    pub fn logged_in(&self) -> bool {
        self.inner.session.borrow().is_some()
    }

    /// Watch the session for changes.
    pub fn subscribe_session(&self) -> watch::Receiver<Option<SessionData>> {
        self.inner.session.subscribe()
    }

    /// Receive a [SessionSignal] after every sign-in, sign-up and sign-out.
    pub fn subscribe_signals(&self) -> broadcast::Receiver<SessionSignal> {
        self.inner.signals.subscribe()
    }

    /// Sign in with an email and password.
    ///
    /// # Errors
    ///
    /// Returns the [ClientError] from the server, e.g. a 401 for a wrong password.
    pub async fn sign_in_email(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SessionData, ClientError> {
        let request = SignInRequest {
            email: email.to_owned(),
            password: password.to_owned(),
        };

        let session_data: SessionData = self
            .inner
            .api
            .post(endpoints::SIGN_IN_API, &request)
            .await?;
        self.set_session(Some(session_data.clone()), SessionSignal::SignedIn);

        Ok(session_data)
    }

    /// Register a new user and sign them in.
    ///
    /// # Errors
    ///
    /// Returns the [ClientError] from the server, e.g. a 422 if the email is taken.
    pub async fn sign_up_email(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<SessionData, ClientError> {
        let request = SignUpRequest {
            name: name.to_owned(),
            email: email.to_owned(),
            password: password.to_owned(),
        };

        let session_data: SessionData = self
            .inner
            .api
            .post(endpoints::SIGN_UP_API, &request)
            .await?;
        self.set_session(Some(session_data.clone()), SessionSignal::SignedUp);

        Ok(session_data)
    }

    /// End the session and return the client to the sign-in page.
    ///
    /// # Errors
    ///
    /// Returns a [ClientError] if the server could not be reached.
    pub async fn sign_out(&self) -> Result<Navigation, ClientError> {
        let _: Acknowledgement = self
            .inner
            .api
            .post(endpoints::SIGN_OUT_API, &())
            .await?;
        self.set_session(None, SessionSignal::SignedOut);

        Ok(Navigation::Redirect(endpoints::SIGN_IN_VIEW))
    }

    /// Ask the server for the current session and remember the answer.
    ///
    /// # Errors
    ///
    /// Returns a [ClientError] if the request failed. The last known session is kept.
    pub async fn fetch_session(&self) -> Result<Option<SessionData>, ClientError> {
        let session_data: Option<SessionData> =
            self.inner.api.get(endpoints::GET_SESSION_API).await?;
        self.inner.session.send_replace(session_data.clone());

        Ok(session_data)
    }

    /// Re-fetch the session whenever a [SessionSignal] is published.
    ///
    /// The subscription lasts until the returned listener is dropped.
    pub fn listen(&self) -> SessionListener {
        let mut signals = self.subscribe_signals();
        let store = self.clone();

        let task = tokio::spawn(async move {
            loop {
                match signals.recv().await {
                    Ok(signal) => tracing::debug!("Session changed: {signal:?}"),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!("Missed {skipped} session signals")
                    }
                    Err(RecvError::Closed) => break,
                }

                if let Err(error) = store.fetch_session().await {
                    tracing::error!("Could not refresh the session: {error}");
                }
            }
        });

        SessionListener { task }
    }

    fn set_session(&self, session_data: Option<SessionData>, signal: SessionSignal) {
        self.inner.session.send_replace(session_data);
        // No listeners is fine.
        let _ = self.inner.signals.send(signal);
    }
}

/// Keeps the session in sync with sign-in and sign-out events until dropped.
#[derive(Debug)]
pub struct SessionListener {
    task: JoinHandle<()>,
}

impl Drop for SessionListener {
    fn drop(&mut self) {
        self.task.abort();
    }
}
