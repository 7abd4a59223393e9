//! Route handlers that end the current session.

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::PrivateCookieJar;

use crate::{
    Acknowledgement, Error,
    auth::{
        AuthState,
        cookie::{get_session_token, invalidate_session_cookie},
        session::delete_session_by_token,
    },
    db::lock_connection,
    endpoints,
};

/// Delete the session in `jar`, if any, and invalidate the session cookie.
fn end_session(state: &AuthState, jar: PrivateCookieJar) -> Result<PrivateCookieJar, Error> {
    if let Some(token) = get_session_token(&jar) {
        let connection = lock_connection(&state.db_connection)?;
        delete_session_by_token(&token, &connection)?;
    }

    Ok(invalidate_session_cookie(
        jar,
        state.auth_config.secure_cookies,
    ))
}

/// Handler for sign-out requests to the JSON API.
///
/// Signing out without a session is not an error.
pub async fn post_sign_out_api(
    State(state): State<AuthState>,
    jar: PrivateCookieJar,
) -> Result<(PrivateCookieJar, Json<Acknowledgement>), Error> {
    let jar = end_session(&state, jar)?;

    Ok((jar, Json(Acknowledgement::SUCCESS)))
}

/// End the session and redirect the client to the sign-in page.
pub async fn get_sign_out(State(state): State<AuthState>, jar: PrivateCookieJar) -> Response {
    match end_session(&state, jar) {
        Ok(jar) => (jar, Redirect::to(endpoints::SIGN_IN_VIEW)).into_response(),
        Err(error) => {
            tracing::error!("Could not end session: {error}");
            error.into_response()
        }
    }
}
