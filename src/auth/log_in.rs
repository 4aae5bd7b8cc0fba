//! Defines the endpoint for logging in with an email and password.

use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Json,
    extract::{FromRef, State, rejection::JsonRejection},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use rusqlite::Connection;
use serde::Deserialize;
use time::Duration;

use crate::{
    AppState, Error,
    user::{User, UserID, get_user_by_email},
};

use super::{
    cookie::{get_session_token_from_cookies, set_session_cookie},
    session::{create_session, delete_session},
};

/// The state needed to perform a login.
#[derive(Debug, Clone)]
pub struct LoginState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// How long the new session stays valid without any requests.
    pub session_duration: Duration,
    /// The database connection for reading users and storing sessions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            session_duration: state.session_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LoginState> for Key {
    fn from_ref(state: &LoginState) -> Self {
        state.cookie_key.clone()
    }
}

/// The credentials sent by the client to log in.
///
/// The password is a plain string. There is no need for validation here since
/// it will be compared against the hash in the database.
#[derive(Clone, Deserialize)]
pub struct LogInData {
    /// Email entered during log-in, case is ignored.
    pub email: String,
    /// Password entered during log-in.
    pub password: String,
}

/// Handler for log-in requests.
///
/// On success a new session is started, the session cookie is set and the
/// logged in user is returned.
///
/// # Errors
///
/// This function will return an error in a few situations.
/// - The email does not belong to a registered user or the password is not
///   correct. Both cases give the same [Error::InvalidCredentials].
/// - An internal error occurred when verifying the password.
pub async fn log_in_endpoint(
    State(state): State<LoginState>,
    jar: PrivateCookieJar,
    payload: Result<Json<LogInData>, JsonRejection>,
) -> Result<(PrivateCookieJar, Json<User>), Error> {
    let Json(credentials) = payload?;

    let user = match get_user_by_email(&credentials.email, &*lock_connection(&state)?) {
        Ok(user) => user,
        Err(Error::NotFound) => {
            tracing::info!("Log-in attempt with unknown email");
            return Err(Error::InvalidCredentials);
        }
        Err(error) => return Err(error),
    };

    // The database lock is released while the slow password check runs.
    let is_password_valid = user
        .password_hash
        .verify(&credentials.password)
        .map_err(|error| {
            tracing::error!("Unhandled error while verifying credentials: {error}");
            Error::HashingError(error.to_string())
        })?;

    if !is_password_valid {
        tracing::info!("Log-in attempt with wrong password for user {}", user.id);
        return Err(Error::InvalidCredentials);
    }

    let jar = start_session(
        jar,
        user.id,
        state.session_duration,
        &*lock_connection(&state)?,
    )?;

    Ok((jar, Json(user)))
}

fn lock_connection(state: &LoginState) -> Result<MutexGuard<'_, Connection>, Error> {
    state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })
}

/// Start a new session for `user_id` and put its token in the session cookie.
///
/// A session the client was still holding on to is ended first.
pub(super) fn start_session(
    jar: PrivateCookieJar,
    user_id: UserID,
    session_duration: Duration,
    connection: &Connection,
) -> Result<PrivateCookieJar, Error> {
    if let Ok(previous_token) = get_session_token_from_cookies(&jar) {
        delete_session(&previous_token, connection)?;
    }

    let session = create_session(user_id, session_duration, connection)?;
    tracing::info!("User {user_id} logged in");

    Ok(set_session_cookie(jar, &session.token, session.expires_at))
}
