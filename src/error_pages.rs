//! The pages shown when a page cannot be found or the server fails.

use axum::{
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};

use crate::{Error, endpoints::API_PREFIX, html::error_view};

/// The response for a failure that the user cannot fix themselves.
pub fn get_internal_server_error_page() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        error_view(
            "Internal Server Error",
            "500",
            "Sorry, something went wrong.",
            "Try again later or check the server logs.",
        ),
    )
        .into_response()
}

/// The fallback handler for unknown routes.
///
/// API clients get a JSON error body, everyone else gets the 404 page.
pub async fn get_404_not_found(uri: Uri) -> Response {
    if uri.path().starts_with(API_PREFIX) {
        return Error::NotFound.into_response();
    }

    (
        StatusCode::NOT_FOUND,
        error_view(
            "Not Found",
            "404",
            "Something's missing.",
            "Sorry, we can't find that page. You'll find lots to explore on the home page.",
        ),
    )
        .into_response()
}
