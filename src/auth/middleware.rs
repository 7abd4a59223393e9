//! The global route guard that checks sessions, extends them, and redirects
//! signed out users to the sign-in page.

use axum::{
    extract::{Request, State},
    http::header::SET_COOKIE,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::PrivateCookieJar;

use crate::{
    Error,
    auth::{
        AuthState, CurrentSession, SessionData,
        cookie::{get_session_token, set_session_cookie},
        session::{get_session_by_token, refresh_session_if_needed},
    },
    db::lock_connection,
    endpoints::{self, is_auth_exempt},
    error_pages::get_internal_server_error_page,
};

/// Middleware function that runs on every request.
///
/// API routes and the public pages are passed through untouched. Any other
/// request must carry a valid session cookie, otherwise a redirect to the
/// sign-in page is returned. Sessions that are close to expiring are
/// extended and the cookie is re-issued with the new expiry.
///
/// **Note**: Route handlers can use the function argument
/// `Extension(session): Extension<CurrentSession>` or the [CurrentSession]
/// extractor to receive the session.
pub async fn route_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    if is_auth_exempt(request.uri().path()) {
        return next.run(request).await;
    }

    let jar = PrivateCookieJar::from_headers(request.headers(), state.cookie_key.clone());

    let (session_data, refreshed) = match resolve_and_refresh(&state, &jar) {
        Ok(Some(resolved)) => resolved,
        Ok(None) => {
            tracing::debug!(
                "No session for {}. Redirecting to sign-in page.",
                request.uri().path()
            );
            return Redirect::to(endpoints::SIGN_IN_VIEW).into_response();
        }
        Err(error) => {
            tracing::error!("Could not resolve session: {error}");
            return get_internal_server_error_page();
        }
    };

    let expires_at = session_data.session.expires_at;
    let (mut parts, body) = request.into_parts();
    parts.extensions.insert(CurrentSession(session_data));
    let response = next.run(Request::from_parts(parts, body)).await;

    if !refreshed {
        return response;
    }

    let Some(token) = get_session_token(&jar) else {
        return response;
    };

    let jar = set_session_cookie(jar, &token, expires_at, state.auth_config.secure_cookies);
    let (mut parts, body) = response.into_parts();

    for (key, val) in jar.into_response().headers().iter() {
        if key != SET_COOKIE {
            continue;
        }

        parts.headers.append(key, val.to_owned());
    }

    Response::from_parts(parts, body)
}

/// Find the session for the cookie in `jar` and extend it if needed.
///
/// Returns the session and whether it was extended.
fn resolve_and_refresh(
    state: &AuthState,
    jar: &PrivateCookieJar,
) -> Result<Option<(SessionData, bool)>, Error> {
    let Some(token) = get_session_token(jar) else {
        return Ok(None);
    };

    let connection = lock_connection(&state.db_connection)?;

    let Some(mut session_data) = get_session_by_token(&token, &connection)? else {
        return Ok(None);
    };

    let refreshed = refresh_session_if_needed(
        &mut session_data.session,
        state.auth_config.session_duration,
        state.auth_config.refresh_threshold,
        &connection,
    )?;

    if refreshed {
        tracing::debug!("Extended session {}", session_data.session.id);
    }

    Ok(Some((session_data, refreshed)))
}
