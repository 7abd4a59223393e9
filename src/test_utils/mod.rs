#![allow(missing_docs)]

use axum::{http::header::SET_COOKIE, response::IntoResponse};
use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, Key},
};
use rusqlite::Connection;
use scraper::Html;
use tokio::net::TcpListener;
use time::{Duration, OffsetDateTime};

use crate::{
    AppState, AuthConfig, TransactionType,
    auth::{
        COOKIE_SESSION_TOKEN, PasswordHash, User, UserId, ValidatedPassword, create_session,
        create_user, set_session_cookie,
    },
    category::{Category, CategoryName, NewCategory, create_category},
    build_router,
    transaction::{NewTransaction, Transaction, create_transaction},
};

/// A password that `zxcvbn` rates as strong enough to sign up with.
pub(crate) const TEST_PASSWORD: &str = "correct-horse-battery-staple-42";

/// The lowest cost bcrypt accepts, so that tests do not spend seconds hashing.
const TEST_PASSWORD_COST: u32 = 4;

pub(crate) fn get_test_app_state() -> AppState {
    AppState::new(
        Connection::open_in_memory().expect("Could not open database in memory."),
        "42",
        AuthConfig {
            session_duration: Duration::days(7),
            refresh_threshold: Duration::days(1),
            secure_cookies: false,
            password_cost: TEST_PASSWORD_COST,
        },
    )
    .expect("Could not create app state.")
}

/// Create a user with [TEST_PASSWORD] and a session for them.
///
/// Returns the user and their encrypted session cookie, ready to be added to
/// test requests.
#[track_caller]
pub(crate) fn sign_up_test_user(state: &AppState, email: &str) -> (User, Cookie<'static>) {
    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked(TEST_PASSWORD),
        TEST_PASSWORD_COST,
    )
    .expect("Could not hash password.");

    let connection = state.db_connection.lock().unwrap();
    let user = create_user("Test User", email, &password_hash, &connection)
        .expect("Could not create test user.");
    let (token, session) =
        create_session(user.id, state.auth_config.session_duration, &connection)
            .expect("Could not create session.");

    let jar = set_session_cookie(
        PrivateCookieJar::new(state.cookie_key.clone()),
        &token,
        session.expires_at,
        false,
    );

    (user, encrypted_cookie(jar))
}

/// Get the encrypted session cookie that `jar` would send to the client.
#[track_caller]
pub(crate) fn encrypted_cookie(jar: PrivateCookieJar<Key>) -> Cookie<'static> {
    let response = jar.into_response();

    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .filter_map(|header| Cookie::parse(header.to_owned()).ok())
        .find(|cookie| cookie.name() == COOKIE_SESSION_TOKEN)
        .expect("Session cookie was not set.")
}

#[track_caller]
pub(crate) fn create_test_category(
    state: &AppState,
    user_id: UserId,
    name: &str,
    type_: TransactionType,
) -> Category {
    let connection = state.db_connection.lock().unwrap();

    create_category(
        user_id,
        NewCategory {
            name: CategoryName::new_unchecked(name),
            type_,
        },
        &connection,
    )
    .expect("Could not create test category.")
}

#[track_caller]
pub(crate) fn create_test_transaction(
    state: &AppState,
    user_id: UserId,
    category: &Category,
    amount: f64,
    date: OffsetDateTime,
) -> Transaction {
    let connection = state.db_connection.lock().unwrap();

    create_transaction(
        user_id,
        NewTransaction {
            category_id: category.id,
            type_: category.type_,
            amount,
            description: format!("{} purchase", category.name),
            date,
        },
        &connection,
    )
    .expect("Could not create test transaction.")
}

/// Serve the app on a random local port for the client tests.
///
/// Returns the server's base URL. The server runs until the test's runtime shuts down.
pub(crate) async fn spawn_test_server(state: AppState) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Could not bind test server.");
    let address = listener
        .local_addr()
        .expect("Could not get test server address.");

    tokio::spawn(async move {
        axum::serve(listener, build_router(state))
            .await
            .expect("Test server failed.");
    });

    format!("http://{address}")
}

pub(crate) fn parse_html_text(text: &str) -> Html {
    Html::parse_document(text)
}

#[track_caller]
pub(crate) fn assert_valid_html(html: &Html) {
    assert!(
        html.errors.is_empty(),
        "Got HTML parsing errors: {:?}",
        html.errors
    );
}
