//! Code for creating the user table and fetching users from the database.

use std::{fmt::Display, str::FromStr};

use email_address::EmailAddress;
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    Error,
    auth::PasswordHash,
    timestamp::{get_timestamp, now, to_millis},
};

/// A newtype wrapper for user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Create a new user ID.
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a new random user ID.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A user of the application.
///
/// The password hash is not part of this struct so that a user
/// can be sent to clients as is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserId,
    /// The user's display name.
    pub name: String,
    /// The user's email address, in lowercase.
    pub email: String,
    /// When the user signed up.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Validate and normalize an email address for storage and lookup.
///
/// # Errors
/// Returns [Error::InvalidEmail] if `raw_email` is not a valid email address.
pub fn normalize_email(raw_email: &str) -> Result<String, Error> {
    let email = EmailAddress::from_str(raw_email.trim()).map_err(|_| Error::InvalidEmail)?;

    Ok(email.as_str().to_lowercase())
}

/// Validate a display name.
///
/// # Errors
/// Returns [Error::EmptyUserName] if `raw_name` is empty or only whitespace.
pub fn validate_user_name(raw_name: &str) -> Result<String, Error> {
    let name = raw_name.trim();

    if name.is_empty() {
        Err(Error::EmptyUserName)
    } else {
        Ok(name.to_owned())
    }
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id BLOB PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                created_at INTEGER NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// `name` and `email` are expected to have been validated with
/// [validate_user_name] and [normalize_email].
///
/// # Errors
///
/// Returns a:
/// - [Error::DuplicateEmail] if a user with `email` already exists,
/// - or [Error::SqlError] if some other SQL related error occurred.
pub fn create_user(
    name: &str,
    email: &str,
    password_hash: &PasswordHash,
    connection: &Connection,
) -> Result<User, Error> {
    let user = User {
        id: UserId::generate(),
        name: name.to_owned(),
        email: email.to_owned(),
        created_at: now(),
    };

    connection.execute(
        "INSERT INTO user (id, name, email, password, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            user.id.as_uuid(),
            &user.name,
            &user.email,
            password_hash.as_ref(),
            to_millis(user.created_at),
        ),
    )?;

    Ok(user)
}

/// Get the user with `email` along with their password hash, for verifying credentials.
///
/// # Errors
///
/// Returns an [Error::NotFound] if no user has the email address `email`.
pub fn get_user_credentials(
    email: &str,
    connection: &Connection,
) -> Result<(User, PasswordHash), Error> {
    connection
        .prepare("SELECT id, name, email, created_at, password FROM user WHERE email = :email")?
        .query_row(&[(":email", &email)], |row| {
            let user = map_user_row(row)?;
            let raw_password_hash: String = row.get(4)?;

            Ok((user, PasswordHash::new_unchecked(&raw_password_hash)))
        })
        .map_err(|error| error.into())
}

/// Map the first four columns of `row` (id, name, email, created_at) to a user.
pub fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    Ok(User {
        id: UserId::new(row.get(0)?),
        name: row.get(1)?,
        email: row.get(2)?,
        created_at: get_timestamp(row, 3)?,
    })
}
