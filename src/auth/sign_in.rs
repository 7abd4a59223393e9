//! The sign-in page and the email/password sign-in endpoint.

use axum::{
    Form, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::PrivateCookieJar;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    Error, FieldErrors,
    auth::{
        AuthState, PasswordHash, SessionData, User,
        cookie::set_session_cookie,
        session::create_session,
        user::{get_user_credentials, normalize_email},
    },
    db::lock_connection,
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, FORM_ERROR_STYLE, auth_card, base, link, password_input, text_input},
    validation::ApiJson,
};

/// The body of a sign-in request.
///
/// The password is a plain string. There is no need for validation here since
/// it will be compared against the password hash in the database.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignInRequest {
    /// The email address the user signed up with.
    #[serde(default)]
    pub email: String,
    /// The user's password.
    #[serde(default)]
    pub password: String,
}

/// Check that both credentials were given.
fn validate_sign_in(request: &SignInRequest) -> Result<(), Error> {
    let mut errors = FieldErrors::new();

    if request.email.trim().is_empty() {
        errors.push("email", "Email is required");
    }

    if request.password.is_empty() {
        errors.push("password", "Password is required");
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation(errors))
    }
}

/// Find the user with `raw_email` and their password hash.
///
/// Returns `None` if the email is malformed or belongs to nobody.
///
/// # Errors
///
/// Returns an error if the database could not be queried.
pub(crate) fn find_credentials(
    raw_email: &str,
    connection: &Connection,
) -> Result<Option<(User, PasswordHash)>, Error> {
    let Ok(email) = normalize_email(raw_email) else {
        return Ok(None);
    };

    match get_user_credentials(&email, connection) {
        Ok(credentials) => Ok(Some(credentials)),
        Err(Error::NotFound) => Ok(None),
        Err(error) => Err(error),
    }
}

/// Check `password` against the credentials from [find_credentials].
///
/// Missing credentials take as long to reject as a wrong password.
///
/// # Errors
///
/// Returns [Error::InvalidCredentials] if there is no such user or the
/// password is wrong, so that callers cannot tell which one it was.
pub(crate) fn check_password(
    credentials: Option<(User, PasswordHash)>,
    password: &str,
    password_cost: u32,
) -> Result<User, Error> {
    let Some((user, password_hash)) = credentials else {
        PasswordHash::verify_nothing(password, password_cost)?;
        return Err(Error::InvalidCredentials);
    };

    if password_hash.verify(password)? {
        Ok(user)
    } else {
        Err(Error::InvalidCredentials)
    }
}

/// Find the user with `raw_email` and check their password.
///
/// The database is only locked while looking up the user, not while hashing.
fn authenticate(state: &AuthState, raw_email: &str, password: &str) -> Result<User, Error> {
    let credentials = {
        let connection = lock_connection(&state.db_connection)?;
        find_credentials(raw_email, &connection)?
    };

    check_password(credentials, password, state.auth_config.password_cost)
}

/// Start a session for `user` and add the session cookie to `jar`.
pub(crate) fn start_session(
    state: &AuthState,
    jar: PrivateCookieJar,
    user: User,
    connection: &Connection,
) -> Result<(PrivateCookieJar, SessionData), Error> {
    let (token, session) =
        create_session(user.id, state.auth_config.session_duration, connection)?;
    let jar = set_session_cookie(
        jar,
        &token,
        session.expires_at,
        state.auth_config.secure_cookies,
    );

    tracing::info!("User {} signed in", user.id);

    Ok((jar, SessionData { user, session }))
}

/// Handler for sign-in requests to the JSON API.
///
/// On success the session cookie is set and the new session is returned.
pub async fn post_sign_in_api(
    State(state): State<AuthState>,
    jar: PrivateCookieJar,
    ApiJson(request): ApiJson<SignInRequest>,
) -> Result<(PrivateCookieJar, Json<SessionData>), Error> {
    validate_sign_in(&request)?;

    let user = authenticate(&state, &request.email, &request.password)?;
    let connection = lock_connection(&state.db_connection)?;
    let (jar, session_data) = start_session(&state, jar, user, &connection)?;

    Ok((jar, Json(session_data)))
}

fn sign_in_form(email: &str, error_message: Option<&str>) -> Markup {
    html! {
        form
            method="post"
            action=(endpoints::SIGN_IN_VIEW)
            class="space-y-4 md:space-y-6"
        {
            (text_input("email", "Email", "email", email, None))

            (password_input(None))

            @if let Some(error_message) = error_message
            {
                p class=(FORM_ERROR_STYLE) { (error_message) }
            }

            button type="submit" id="submit-button" class=(BUTTON_PRIMARY_STYLE)
            {
                "Sign in"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Don't have an account? "
                (link(endpoints::SIGN_UP_VIEW, "Sign up here"))
            }
        }
    }
}

fn sign_in_page(email: &str, error_message: Option<&str>) -> Markup {
    let content = auth_card("Sign in to your account", &sign_in_form(email, error_message));

    base("Sign In", &content)
}

/// Display the sign-in page.
pub async fn get_sign_in_page() -> Markup {
    sign_in_page("", None)
}

/// Handler for the sign-in form.
///
/// On success the session cookie is set and the client is redirected to the
/// overview page. Otherwise, the page is returned with an error message.
pub async fn post_sign_in_form(
    State(state): State<AuthState>,
    jar: PrivateCookieJar,
    Form(form): Form<SignInRequest>,
) -> Response {
    let result = validate_sign_in(&form).and_then(|_| {
        let user = authenticate(&state, &form.email, &form.password)?;
        let connection = lock_connection(&state.db_connection)?;

        start_session(&state, jar, user, &connection)
    });

    match result {
        Ok((jar, _)) => (jar, Redirect::to(endpoints::ROOT)).into_response(),
        Err(Error::Validation(errors)) => (
            StatusCode::BAD_REQUEST,
            sign_in_page(&form.email, Some(&errors.to_string())),
        )
            .into_response(),
        Err(error @ Error::InvalidCredentials) => (
            error.status_code(),
            sign_in_page(&form.email, Some(&error.to_string())),
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Unhandled error while signing in: {error}");
            (
                error.status_code(),
                sign_in_page(
                    &form.email,
                    Some("An internal error occurred. Please try again later."),
                ),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod credentials_tests {
    use crate::{
        Error,
        test_utils::{TEST_PASSWORD, get_test_app_state, sign_up_test_user},
    };

    use super::{check_password, find_credentials};

    const COST: u32 = 4;

    #[test]
    fn finds_credentials_by_normalized_email() {
        let state = get_test_app_state();
        let (user, _) = sign_up_test_user(&state, "alice@example.com");
        let connection = state.db_connection.lock().unwrap();

        let (found, _) = find_credentials(" Alice@Example.com ", &connection)
            .unwrap()
            .expect("expected credentials");

        assert_eq!(found, user);
    }

    #[test]
    fn unknown_or_malformed_email_has_no_credentials() {
        let state = get_test_app_state();
        let connection = state.db_connection.lock().unwrap();

        for email in ["bob@example.com", "not an email"] {
            assert_eq!(find_credentials(email, &connection), Ok(None), "email {email}");
        }
    }

    #[test]
    fn password_is_checked_while_database_is_locked() {
        let state = get_test_app_state();
        let (user, _) = sign_up_test_user(&state, "alice@example.com");
        let credentials =
            find_credentials("alice@example.com", &state.db_connection.lock().unwrap()).unwrap();
        let _other_request = state.db_connection.lock().unwrap();

        assert_eq!(check_password(credentials.clone(), TEST_PASSWORD, COST), Ok(user));
        assert_eq!(
            check_password(credentials, "wrong password", COST),
            Err(Error::InvalidCredentials)
        );
    }

    #[test]
    fn missing_credentials_are_invalid() {
        assert_eq!(
            check_password(None, TEST_PASSWORD, COST),
            Err(Error::InvalidCredentials)
        );
    }
}

#[cfg(test)]
mod sign_in_api_tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::json;

    use crate::{
        ErrorBody, SessionData, build_router, endpoints,
        auth::COOKIE_SESSION_TOKEN,
        test_utils::{TEST_PASSWORD, get_test_app_state, sign_up_test_user},
    };

    fn get_test_server() -> TestServer {
        let state = get_test_app_state();
        sign_up_test_user(&state, "alice@example.com");

        TestServer::new(build_router(state)).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn sign_in_succeeds_with_valid_credentials() {
        let server = get_test_server();

        let response = server
            .post(endpoints::SIGN_IN_API)
            .json(&json!({"email": "Alice@Example.com", "password": TEST_PASSWORD}))
            .await;

        response.assert_status_ok();
        let session_data = response.json::<SessionData>();
        assert_eq!(session_data.user.email, "alice@example.com");
        assert_eq!(session_data.session.user_id, session_data.user.id);
        let cookie = response.cookie(COOKIE_SESSION_TOKEN);
        assert_eq!(cookie.http_only(), Some(true));
    }

    #[tokio::test]
    async fn sign_in_fails_with_wrong_password() {
        let server = get_test_server();

        let response = server
            .post(endpoints::SIGN_IN_API)
            .json(&json!({"email": "alice@example.com", "password": "wrong password"}))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.json::<ErrorBody>().status_message,
            "Invalid email or password"
        );
    }

    #[tokio::test]
    async fn sign_in_fails_with_unknown_email() {
        let server = get_test_server();

        let response = server
            .post(endpoints::SIGN_IN_API)
            .json(&json!({"email": "bob@example.com", "password": TEST_PASSWORD}))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.json::<ErrorBody>().status_message,
            "Invalid email or password"
        );
    }

    #[tokio::test]
    async fn sign_in_requires_both_fields() {
        let server = get_test_server();

        let response = server
            .post(endpoints::SIGN_IN_API)
            .json(&json!({}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body = response.json::<ErrorBody>();
        let errors = body.data.unwrap();
        assert!(errors.get("email").is_some());
        assert!(errors.get("password").is_some());
    }
}
