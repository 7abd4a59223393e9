//! Session storage.
//!
//! A session is identified by a random token that only the client knows. The
//! database keeps the SHA-256 digest of the token so that a leaked database
//! cannot be used to impersonate users.

use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::{
    Error,
    auth::{User, UserId, user::map_user_row},
    timestamp::{get_timestamp, now, to_millis},
};

/// The secret that identifies a session, as stored in the session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    /// Generate a new random token.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Wrap a token read from a cookie.
    pub fn new_unchecked(raw_token: &str) -> Self {
        Self(raw_token.to_owned())
    }

    /// The digest of the token that is stored in the database.
    fn digest(&self) -> String {
        format!("{:x}", Sha256::digest(self.0.as_bytes()))
    }
}

impl AsRef<str> for SessionToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A signed in session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// The session's ID in the application database.
    pub id: Uuid,
    /// The user the session belongs to.
    pub user_id: UserId,
    /// When the session stops being valid.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
    /// When the user signed in.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A session together with the user it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    /// The signed in user.
    pub user: User,
    /// The session details.
    pub session: Session,
}

/// Create the session table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_session_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS session (
                id BLOB PRIMARY KEY,
                token_hash TEXT NOT NULL UNIQUE,
                user_id BLOB NOT NULL,
                expires_at INTEGER NOT NULL,
                created_at INTEGER NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

/// Start a new session for `user_id` that lasts for `duration`.
///
/// Returns the token for the session cookie along with the stored session.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the session could not be inserted, e.g.
/// because `user_id` does not refer to a user.
pub fn create_session(
    user_id: UserId,
    duration: Duration,
    connection: &Connection,
) -> Result<(SessionToken, Session), Error> {
    let token = SessionToken::generate();
    let created_at = now();
    let session = Session {
        id: Uuid::new_v4(),
        user_id,
        expires_at: created_at + duration,
        created_at,
    };

    connection.execute(
        "INSERT INTO session (id, token_hash, user_id, expires_at, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            session.id,
            token.digest(),
            session.user_id.as_uuid(),
            to_millis(session.expires_at),
            to_millis(session.created_at),
        ),
    )?;

    Ok((token, session))
}

/// Find the unexpired session for `token`.
///
/// An expired session is deleted and reported as absent.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the query failed.
pub fn get_session_by_token(
    token: &SessionToken,
    connection: &Connection,
) -> Result<Option<SessionData>, Error> {
    let session_data = connection
        .prepare(
            "SELECT user.id, user.name, user.email, user.created_at,
                session.id, session.expires_at, session.created_at
            FROM session
            INNER JOIN user ON user.id = session.user_id
            WHERE session.token_hash = :token_hash",
        )?
        .query_row(&[(":token_hash", &token.digest())], |row| {
            let user = map_user_row(row)?;

            Ok(SessionData {
                session: Session {
                    id: row.get(4)?,
                    user_id: user.id,
                    expires_at: get_timestamp(row, 5)?,
                    created_at: get_timestamp(row, 6)?,
                },
                user,
            })
        })
        .optional()?;

    match session_data {
        Some(data) if data.session.expires_at <= OffsetDateTime::now_utc() => {
            tracing::debug!("session {} has expired", data.session.id);
            delete_session(data.session.id, connection)?;
            Ok(None)
        }
        other => Ok(other),
    }
}

/// Push the expiry of the session `session_id` out to `expires_at`.
///
/// # Errors
///
/// Returns an [Error::NotFound] if the session no longer exists.
pub fn set_session_expiry(
    session_id: Uuid,
    expires_at: OffsetDateTime,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE session SET expires_at = ?1 WHERE id = ?2",
        (to_millis(expires_at), session_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Extend `session` to `session_duration` from now if it expires within
/// `refresh_threshold`.
///
/// Returns whether the session was extended.
///
/// # Errors
///
/// Returns an error if the new expiry could not be saved.
pub fn refresh_session_if_needed(
    session: &mut Session,
    session_duration: Duration,
    refresh_threshold: Duration,
    connection: &Connection,
) -> Result<bool, Error> {
    let now = now();

    if session.expires_at - now > refresh_threshold {
        return Ok(false);
    }

    let expires_at = now + session_duration;
    set_session_expiry(session.id, expires_at, connection)?;
    session.expires_at = expires_at;

    Ok(true)
}

/// Delete the session `session_id`.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the query failed.
pub fn delete_session(session_id: Uuid, connection: &Connection) -> Result<(), Error> {
    connection.execute("DELETE FROM session WHERE id = ?1", (session_id,))?;

    Ok(())
}

/// Delete the session identified by `token`, if it exists.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the query failed.
pub fn delete_session_by_token(token: &SessionToken, connection: &Connection) -> Result<(), Error> {
    connection.execute(
        "DELETE FROM session WHERE token_hash = ?1",
        (token.digest(),),
    )?;

    Ok(())
}
