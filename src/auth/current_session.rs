//! Resolving the session of the user making a request.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use rusqlite::Connection;

use crate::{
    AppState, AuthConfig, Error,
    auth::{SessionData, UserId, cookie::get_session_token, session::get_session_by_token},
    db::lock_connection,
};

/// The state needed to resolve and manage sessions.
#[derive(Debug, Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// Settings for sessions and cookies.
    pub auth_config: AuthConfig,
    /// The database connection for looking up sessions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            auth_config: state.auth_config,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Look up the session whose token is stored in the session cookie in `jar`.
///
/// Returns `None` if there is no cookie, the cookie could not be decrypted,
/// or the session does not exist or has expired.
///
/// # Errors
///
/// Returns an error if the database could not be queried.
pub fn get_session_from_jar(
    jar: &PrivateCookieJar,
    connection: &Connection,
) -> Result<Option<SessionData>, Error> {
    match get_session_token(jar) {
        Some(token) => get_session_by_token(&token, connection),
        None => Ok(None),
    }
}

/// The session of the signed in user making the request.
///
/// Handlers that take this extractor reject requests without a valid session
/// with [Error::Unauthenticated].
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentSession(pub SessionData);

impl CurrentSession {
    /// The ID of the signed in user.
    pub fn user_id(&self) -> UserId {
        self.0.user.id
    }
}

impl<S> FromRequestParts<S> for CurrentSession
where
    AuthState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(current_session) = parts.extensions.get::<CurrentSession>() {
            return Ok(current_session.clone());
        }

        let state = AuthState::from_ref(state);
        let jar = PrivateCookieJar::from_headers(&parts.headers, state.cookie_key);
        let connection = lock_connection(&state.db_connection)?;

        get_session_from_jar(&jar, &connection)?
            .map(CurrentSession)
            .ok_or(Error::Unauthenticated)
    }
}
