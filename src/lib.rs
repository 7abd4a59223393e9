//! A personal finance tracker.
//!
//! Users sign up with an email and password, record income and expense
//! transactions against their own categories, and filter their transaction
//! history by date range and category.
//!
//! This library provides the JSON API, the small server-rendered UI that sits
//! in front of it, and a typed [client] for talking to a running server.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde::{Deserialize, Serialize};
use tokio::signal;

mod app_state;
mod auth;
mod category;
pub mod client;
mod dashboard;
mod db;
pub mod endpoints;
mod error_pages;
mod html;
mod logging;
mod routing;
mod timestamp;
mod transaction;
mod transaction_type;
mod validation;

#[cfg(test)]
mod test_utils;

pub use app_state::{AppState, AuthConfig};
pub use auth::{PasswordHash, SessionData, User, UserId, ValidatedPassword, create_user};
pub use category::{
    Category, CategoryId, CategoryName, MAX_CATEGORY_NAME_LENGTH, NewCategory, create_category,
};
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use transaction::{
    MAX_DESCRIPTION_LENGTH, NewTransaction, Transaction, TransactionFilters, TransactionId,
    TransactionQuery, create_transaction, get_transaction, update_transaction,
};
pub use transaction_type::TransactionType;
pub use validation::{FieldError, FieldErrors};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
        },
    }

    handle.graceful_shutdown(Some(Duration::from_secs(1)));
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The request did not carry a valid session cookie.
    #[error("No session found")]
    Unauthenticated,

    /// The email and password did not match a registered user.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// The user provided a password that is too easy to guess.
    #[error("Password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// A user with the given email address already exists.
    #[error("User already exists")]
    DuplicateEmail,

    /// The email address is not a valid address.
    #[error("Invalid email address")]
    InvalidEmail,

    /// The user's display name was empty.
    #[error("Name is required")]
    EmptyUserName,

    /// An empty string was used to create a category name.
    #[error("Name is required")]
    EmptyCategoryName,

    /// The category name was longer than [MAX_CATEGORY_NAME_LENGTH] characters.
    #[error("Name must be at most 100 characters")]
    CategoryNameTooLong,

    /// The transaction type was neither "expense" nor "income".
    #[error("Type must be 'expense' or 'income'")]
    InvalidTransactionType,

    /// A transaction was submitted without a category ID.
    #[error("Category is required")]
    MissingCategory,

    /// The category ID does not refer to a category owned by the current user.
    #[error("Category not found")]
    UnknownCategory,

    /// The transaction amount was missing or was not a number.
    #[error("Amount must be a number")]
    InvalidAmount,

    /// The transaction amount was zero, negative or not a finite number.
    #[error("Amount must be positive")]
    NonPositiveAmount,

    /// An empty string was used as a transaction description.
    #[error("Description is required")]
    EmptyDescription,

    /// The description was longer than [MAX_DESCRIPTION_LENGTH] characters.
    #[error("Description must be at most 500 characters")]
    DescriptionTooLong,

    /// A date or timestamp could not be parsed.
    #[error("Invalid date format")]
    InvalidDate,

    /// One or more fields of a request failed validation.
    #[error("Validation error: {0}")]
    Validation(FieldErrors),

    /// The request path did not include the transaction ID.
    #[error("Transaction ID is required")]
    MissingTransactionId,

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to update a transaction that does not exist or belongs to another user.
    #[error("Transaction not found")]
    UpdateMissingTransaction,

    /// Tried to delete a transaction that does not exist or belongs to another user.
    #[error("Transaction not found")]
    DeleteMissingTransaction,

    /// A timestamp stored in the database or a cookie could not be converted.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

/// The JSON body sent to the client when a request fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// The HTTP status code.
    pub status_code: u16,
    /// A short, human readable description of the error.
    pub status_message: String,
    /// Field-level validation details, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<FieldErrors>,
}

/// The JSON body for operations that have nothing to return except success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgement {
    /// Always `true` for a successful operation.
    pub success: bool,
}

impl Acknowledgement {
    /// A successful acknowledgement.
    pub const SUCCESS: Self = Self { success: true };
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated | Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Error::DuplicateEmail => StatusCode::UNPROCESSABLE_ENTITY,
            Error::TooWeak(_)
            | Error::InvalidEmail
            | Error::EmptyUserName
            | Error::EmptyCategoryName
            | Error::CategoryNameTooLong
            | Error::InvalidTransactionType
            | Error::MissingCategory
            | Error::UnknownCategory
            | Error::InvalidAmount
            | Error::NonPositiveAmount
            | Error::EmptyDescription
            | Error::DescriptionTooLong
            | Error::InvalidDate
            | Error::Validation(_)
            | Error::MissingTransactionId => StatusCode::BAD_REQUEST,
            Error::NotFound | Error::UpdateMissingTransaction | Error::DeleteMissingTransaction => {
                StatusCode::NOT_FOUND
            }
            Error::HashingError(_)
            | Error::InvalidTimestamp(_)
            | Error::SqlError(_)
            | Error::DatabaseLockError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match self {
            Error::Validation(errors) => ErrorBody {
                status_code: status.as_u16(),
                status_message: "Validation error".to_owned(),
                data: Some(errors),
            },
            Error::NotFound => ErrorBody {
                status_code: status.as_u16(),
                status_message: "Not found".to_owned(),
                data: None,
            },
            // Internal errors are logged but the details are not shown to the client.
            error if status == StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!("An unexpected error occurred: {}", error);
                ErrorBody {
                    status_code: status.as_u16(),
                    status_message: "Internal server error".to_owned(),
                    data: None,
                }
            }
            error => ErrorBody {
                status_code: status.as_u16(),
                status_message: error.to_string(),
                data: None,
            },
        };

        (status, Json(body)).into_response()
    }
}
