//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/transactions/{transaction_id}', use [format_endpoint].

/// The overview page for logged in users.
pub const ROOT: &str = "/";
/// The route for getting the sign-in page.
pub const SIGN_IN_VIEW: &str = "/signin";
/// The route for getting the sign-up page.
pub const SIGN_UP_VIEW: &str = "/signup";
/// The route that ends the current session and returns to the sign-in page.
pub const SIGN_OUT_VIEW: &str = "/signout";

/// Routes that can be navigated to without a session.
pub const PUBLIC_ROUTES: [&str; 2] = [SIGN_IN_VIEW, SIGN_UP_VIEW];

/// The prefix shared by all JSON API routes.
pub const API_PREFIX: &str = "/api/";

/// The route for creating an account with an email and password.
pub const SIGN_UP_API: &str = "/api/auth/sign-up/email";
/// The route for signing in with an email and password.
pub const SIGN_IN_API: &str = "/api/auth/sign-in/email";
/// The route for ending the current session.
pub const SIGN_OUT_API: &str = "/api/auth/sign-out";
/// The route for reading the current session.
pub const GET_SESSION_API: &str = "/api/auth/get-session";
/// The route to list and create categories.
pub const CATEGORIES_API: &str = "/api/categories";
/// The route to list and create transactions.
pub const TRANSACTIONS_API: &str = "/api/transactions";
/// The route to update or delete a single transaction.
pub const TRANSACTION_API: &str = "/api/transactions/{transaction_id}";
/// [TRANSACTION_API] with the transaction ID left out.
pub const TRANSACTION_MISSING_ID_API: &str = "/api/transactions/";

/// Whether a request to `path` skips the session check of the route guard.
///
/// API routes authenticate themselves and the public routes are where
/// unauthenticated users get redirected to.
pub fn is_auth_exempt(path: &str) -> bool {
    path.starts_with(API_PREFIX) || PUBLIC_ROUTES.contains(&path)
}

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/api/transactions/{transaction_id}', '{transaction_id}' is the parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: impl std::fmt::Display) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|offset| param_start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
