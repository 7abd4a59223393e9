//! The sign-up page and the email/password sign-up endpoint.

use axum::{
    Form, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::PrivateCookieJar;
use maud::{Markup, html};
use serde::{Deserialize, Serialize};

use crate::{
    Error, FieldErrors,
    auth::{
        AuthState, PasswordHash, SessionData, ValidatedPassword, create_user,
        sign_in::start_session,
        user::{normalize_email, validate_user_name},
    },
    db::lock_connection,
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, FORM_ERROR_STYLE, auth_card, base, link, password_input, text_input},
    validation::ApiJson,
};

/// The body of a sign-up request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignUpRequest {
    /// The name to display for the user.
    #[serde(default)]
    pub name: String,
    /// The user's email address.
    #[serde(default)]
    pub email: String,
    /// The user's chosen password.
    #[serde(default)]
    pub password: String,
}

/// A sign-up request that passed validation.
struct ValidSignUp {
    name: String,
    email: String,
    password: ValidatedPassword,
}

fn validate_sign_up(request: &SignUpRequest) -> Result<ValidSignUp, Error> {
    let mut errors = FieldErrors::new();

    let name = errors.check("name", validate_user_name(&request.name));
    let email = errors.check("email", normalize_email(&request.email));
    let password = errors.check(
        "password",
        ValidatedPassword::new(&request.password, &[&request.name, &request.email]),
    );

    match (name, email, password) {
        (Some(name), Some(email), Some(password)) => Ok(ValidSignUp {
            name,
            email,
            password,
        }),
        _ => Err(Error::Validation(errors)),
    }
}

/// Validate `request`, create the user and start their first session.
fn sign_up(
    state: &AuthState,
    jar: PrivateCookieJar,
    request: &SignUpRequest,
) -> Result<(PrivateCookieJar, SessionData), Error> {
    let sign_up = validate_sign_up(request)?;
    let password_hash = PasswordHash::new(sign_up.password, state.auth_config.password_cost)?;

    let connection = lock_connection(&state.db_connection)?;
    let user = create_user(&sign_up.name, &sign_up.email, &password_hash, &connection)?;
    tracing::info!("Created user {}", user.id);

    start_session(state, jar, user, &connection)
}

/// Handler for sign-up requests to the JSON API.
///
/// On success the user is created, signed in and the new session is returned.
pub async fn post_sign_up_api(
    State(state): State<AuthState>,
    jar: PrivateCookieJar,
    ApiJson(request): ApiJson<SignUpRequest>,
) -> Result<(PrivateCookieJar, Json<SessionData>), Error> {
    let (jar, session_data) = sign_up(&state, jar, &request)?;

    Ok((jar, Json(session_data)))
}

fn sign_up_form(name: &str, email: &str, errors: &FieldErrors, message: Option<&str>) -> Markup {
    let field_error = |field: &str| errors.get(field).map(|error| error.message.clone());
    let name_error = field_error("name");
    let email_error = field_error("email");
    let password_error = field_error("password");

    html! {
        form
            method="post"
            action=(endpoints::SIGN_UP_VIEW)
            class="space-y-4 md:space-y-6"
        {
            (text_input("name", "Name", "text", name, name_error.as_deref()))

            (text_input("email", "Email", "email", email, email_error.as_deref()))

            (password_input(password_error.as_deref()))

            @if let Some(message) = message
            {
                p class=(FORM_ERROR_STYLE) { (message) }
            }

            button type="submit" id="submit-button" class=(BUTTON_PRIMARY_STYLE)
            {
                "Create account"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "
                (link(endpoints::SIGN_IN_VIEW, "Sign in here"))
            }
        }
    }
}

fn sign_up_page(name: &str, email: &str, errors: &FieldErrors, message: Option<&str>) -> Markup {
    let content = auth_card(
        "Create an account",
        &sign_up_form(name, email, errors, message),
    );

    base("Sign Up", &content)
}

/// Display the sign-up page.
pub async fn get_sign_up_page() -> Markup {
    sign_up_page("", "", &FieldErrors::new(), None)
}

/// Handler for the sign-up form.
///
/// On success the session cookie is set and the client is redirected to the
/// overview page. Otherwise, the page is returned with the errors next to
/// the fields they belong to.
pub async fn post_sign_up_form(
    State(state): State<AuthState>,
    jar: PrivateCookieJar,
    Form(form): Form<SignUpRequest>,
) -> Response {
    match sign_up(&state, jar, &form) {
        Ok((jar, _)) => (jar, Redirect::to(endpoints::ROOT)).into_response(),
        Err(Error::Validation(errors)) => (
            StatusCode::BAD_REQUEST,
            sign_up_page(&form.name, &form.email, &errors, None),
        )
            .into_response(),
        Err(error @ Error::DuplicateEmail) => (
            error.status_code(),
            sign_up_page(
                &form.name,
                &form.email,
                &FieldErrors::single("email", error.to_string()),
                None,
            ),
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Unhandled error while signing up: {error}");
            (
                error.status_code(),
                sign_up_page(
                    &form.name,
                    &form.email,
                    &FieldErrors::new(),
                    Some("An internal error occurred. Please try again later."),
                ),
            )
                .into_response()
        }
    }
}


#[cfg(test)]
mod sign_up_api_tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::json;

    use crate::{
        ErrorBody, SessionData, build_router, endpoints,
        auth::COOKIE_SESSION_TOKEN,
        test_utils::{TEST_PASSWORD, get_test_app_state},
    };

    fn get_test_server() -> TestServer {
        TestServer::new(build_router(get_test_app_state())).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn sign_up_creates_user_and_session() {
        let server = get_test_server();

        let response = server
            .post(endpoints::SIGN_UP_API)
            .json(&json!({"name": "Alice", "email": "alice@example.com", "password": TEST_PASSWORD}))
            .await;

        response.assert_status_ok();
        let session_data = response.json::<SessionData>();
        assert_eq!(session_data.user.name, "Alice");
        assert_eq!(session_data.user.email, "alice@example.com");
        let cookie = response.cookie(COOKIE_SESSION_TOKEN);

        let response = server.get(endpoints::GET_SESSION_API).add_cookie(cookie).await;

        response.assert_status_ok();
        assert_eq!(response.json::<Option<SessionData>>(), Some(session_data));
    }

    #[tokio::test]
    async fn sign_up_rejects_duplicate_email() {
        let server = get_test_server();
        let body = json!({"name": "Alice", "email": "alice@example.com", "password": TEST_PASSWORD});
        server.post(endpoints::SIGN_UP_API).json(&body).await.assert_status_ok();

        let response = server.post(endpoints::SIGN_UP_API).json(&body).await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.json::<ErrorBody>().status_message, "User already exists");
    }

    #[tokio::test]
    async fn sign_up_rejects_weak_password() {
        let server = get_test_server();

        let response = server
            .post(endpoints::SIGN_UP_API)
            .json(&json!({"name": "Alice", "email": "alice@example.com", "password": "password1"}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body = response.json::<ErrorBody>();
        assert!(body.data.unwrap().get("password").is_some());
    }

    #[tokio::test]
    async fn sign_up_rejects_malformed_json() {
        let server = get_test_server();

        let response = server
            .post(endpoints::SIGN_UP_API)
            .content_type("application/json")
            .text("{not json")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body = response.json::<ErrorBody>();
        assert!(body.data.unwrap().get("body").is_some());
    }
}
