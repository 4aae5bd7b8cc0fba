//! Server-side sessions that associate an opaque token with a logged in user.
//!
//! The token is the only thing the client holds (see [super::cookie]). The
//! user ID and expiry never leave the server.

use std::{cmp::max, fmt::Display};

use rusqlite::{Connection, Row};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::{Error, user::UserID};

/// An opaque, random session token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    /// Generate a new random token.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Wrap a token string sent by the client.
    ///
    /// The token is not checked here, look it up with [get_session] to find
    /// out whether it refers to a live session.
    pub fn new_unchecked(raw_token: &str) -> Self {
        Self(raw_token.to_owned())
    }

    /// The token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Only show a prefix so full tokens do not end up in the logs.
        let prefix: String = self.0.chars().take(8).collect();
        write!(f, "{prefix}…")
    }
}

/// A session bound to a user.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// The token that identifies the session.
    pub token: SessionToken,
    /// The user the session belongs to.
    pub user_id: UserID,
    /// The time after which the session is no longer valid.
    pub expires_at: OffsetDateTime,
}

impl Session {
    /// Whether the session has expired at the time `now`.
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at <= now
    }
}

/// Create the session table.
///
/// Expiry times are stored as unix timestamps (seconds, UTC) so that they can
/// be compared directly in SQL.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_session_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS session (
                token TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL,
                expires_at INTEGER NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

/// Start a new session for `user_id` that expires `duration` from now.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the session could not be inserted, e.g.
/// because `user_id` does not refer to a registered user.
pub fn create_session(
    user_id: UserID,
    duration: Duration,
    connection: &Connection,
) -> Result<Session, Error> {
    let session = Session {
        token: SessionToken::generate(),
        user_id,
        expires_at: truncate_to_seconds(OffsetDateTime::now_utc() + duration),
    };

    connection.execute(
        "INSERT INTO session (token, user_id, expires_at) VALUES (?1, ?2, ?3)",
        (
            session.token.as_str(),
            session.user_id.as_i64(),
            session.expires_at.unix_timestamp(),
        ),
    )?;

    tracing::debug!("Created session {} for user {}", session.token, user_id);

    Ok(session)
}

/// Get the session identified by `token`, whether or not it has expired.
///
/// # Errors
///
/// Returns a [Error::NotFound] if there is no session with the given token.
pub fn get_session(token: &SessionToken, connection: &Connection) -> Result<Session, Error> {
    connection
        .prepare("SELECT token, user_id, expires_at FROM session WHERE token = :token")?
        .query_row(&[(":token", &token.as_str())], map_session_row)
        .map_err(|error| error.into())
}

/// Resolve `token` to the ID of the user that owns the session.
///
/// A session that has expired is deleted and treated as if it did not exist.
///
/// # Errors
///
/// Returns an [Error::Unauthorized] if the session does not exist or has
/// expired, or an [Error::SqlError] if the session table could not be read.
pub fn get_session_user_id(
    token: &SessionToken,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<UserID, Error> {
    let session = match get_session(token, connection) {
        Ok(session) => session,
        Err(Error::NotFound) => {
            return Err(Error::Unauthorized(
                "no active session, please log in".to_owned(),
            ));
        }
        Err(error) => return Err(error),
    };

    if session.is_expired(now) {
        tracing::debug!("Session {} expired at {}", token, session.expires_at);
        delete_session(token, connection)?;
        return Err(Error::Unauthorized(
            "the session has expired, please log in again".to_owned(),
        ));
    }

    Ok(session.user_id)
}

/// Set the expiry of the session to the latest of its current expiry and
/// `duration` from now.
///
/// Returns the new expiry.
///
/// # Errors
///
/// Returns a [Error::NotFound] if there is no session with the given token.
pub fn extend_session(
    token: &SessionToken,
    duration: Duration,
    connection: &Connection,
) -> Result<OffsetDateTime, Error> {
    let session = get_session(token, connection)?;
    let expires_at = max(
        session.expires_at,
        truncate_to_seconds(OffsetDateTime::now_utc() + duration),
    );

    connection.execute(
        "UPDATE session SET expires_at = ?1 WHERE token = ?2",
        (expires_at.unix_timestamp(), token.as_str()),
    )?;

    Ok(expires_at)
}

type RowsAffected = usize;

/// Delete the session identified by `token`.
///
/// Deleting a session that does not exist is not an error.
pub fn delete_session(token: &SessionToken, connection: &Connection) -> Result<RowsAffected, Error> {
    connection
        .execute(
            "DELETE FROM session WHERE token = :token",
            &[(":token", &token.as_str())],
        )
        .map_err(|error| error.into())
}

/// Delete every session that expired at or before `now`.
pub fn delete_expired_sessions(
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    connection
        .execute(
            "DELETE FROM session WHERE expires_at <= :now",
            &[(":now", &now.unix_timestamp())],
        )
        .map_err(|error| error.into())
}

fn truncate_to_seconds(date_time: OffsetDateTime) -> OffsetDateTime {
    date_time.replace_nanosecond(0).unwrap_or(date_time)
}

fn map_session_row(row: &Row) -> Result<Session, rusqlite::Error> {
    let raw_token: String = row.get(0)?;
    let raw_user_id = row.get(1)?;
    let raw_expires_at: i64 = row.get(2)?;

    let expires_at = OffsetDateTime::from_unix_timestamp(raw_expires_at).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Integer, Box::new(error))
    })?;

    Ok(Session {
        token: SessionToken::new_unchecked(&raw_token),
        user_id: UserID::new(raw_user_id),
        expires_at,
    })
}
