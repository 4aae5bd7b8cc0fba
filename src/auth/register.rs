//! Defines the endpoint for registering a new user.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State, rejection::JsonRejection},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use rusqlite::Connection;
use serde::Deserialize;
use time::Duration;

use crate::{
    AppState, Error, PasswordHash, ValidatedPassword,
    user::{User, create_user, get_user_by_email},
};

use super::log_in::start_session;

/// The state needed to register a user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// How long the new session stays valid without any requests.
    pub session_duration: Duration,
    /// The bcrypt cost for hashing the new password.
    pub password_hash_cost: u32,
    /// The database connection for storing users and sessions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            session_duration: state.session_duration,
            password_hash_cost: state.password_hash_cost,
            db_connection: state.db_connection.clone(),
        }
    }
}

impl FromRef<RegistrationState> for Key {
    fn from_ref(state: &RegistrationState) -> Self {
        state.cookie_key.clone()
    }
}

/// The data sent by the client to register.
#[derive(Clone, Deserialize)]
pub struct RegisterForm {
    /// The name to show for the new user.
    pub name: String,
    /// The email the user will log in with.
    pub email: String,
    /// The password the user will log in with.
    pub password: String,
}

/// A route handler for registering a new user.
///
/// The new user is logged in straight away: the session cookie is set and
/// the created user is returned.
///
/// # Errors
///
/// - [Error::BadRequest] if the name, email or password is blank.
/// - [Error::DuplicateEmail] if the email is already registered, ignoring case.
/// - [Error::HashingError] if the password could not be hashed.
pub async fn register_endpoint(
    State(state): State<RegistrationState>,
    jar: PrivateCookieJar,
    payload: Result<Json<RegisterForm>, JsonRejection>,
) -> Result<(PrivateCookieJar, Json<User>), Error> {
    let Json(form) = payload?;

    let name = form.name.trim();
    if name.is_empty() {
        return Err(Error::BadRequest("name must not be blank".to_owned()));
    }

    let email = form.email.trim();
    if email.is_empty() {
        return Err(Error::BadRequest("email must not be blank".to_owned()));
    }

    let password = ValidatedPassword::new(&form.password)?;
    // Hashing is slow, so it is done before taking the database lock.
    let password_hash = PasswordHash::new(password, state.password_hash_cost)?;

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    match get_user_by_email(email, &connection) {
        Ok(_) => return Err(Error::DuplicateEmail),
        Err(Error::NotFound) => {}
        Err(error) => return Err(error),
    }

    let user = create_user(name, email, password_hash, &connection)?;
    tracing::info!("Registered user {}", user.id);

    let jar = start_session(jar, user.id, state.session_duration, &connection)?;

    Ok((jar, Json(user)))
}
