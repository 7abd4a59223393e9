//! The endpoint that reports the session of the caller.

use axum::{Json, extract::State};
use axum_extra::extract::PrivateCookieJar;

use crate::{
    Error,
    auth::{AuthState, SessionData, get_session_from_jar},
    db::lock_connection,
};

/// Return the caller's session, or `null` if they are not signed in.
pub async fn get_session(
    State(state): State<AuthState>,
    jar: PrivateCookieJar,
) -> Result<Json<Option<SessionData>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_session_from_jar(&jar, &connection).map(Json)
}
