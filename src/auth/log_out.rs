//! Defines the endpoint for logging out.

use axum::{extract::State, http::StatusCode};
use axum_extra::extract::PrivateCookieJar;

use crate::Error;

use super::{
    AuthState,
    cookie::{get_session_token_from_cookies, invalidate_session_cookie},
    session::delete_session,
};

/// A route handler that ends the current session and clears the session cookie.
///
/// Logging out without a session, or with one that has already expired, is
/// not an error.
pub async fn log_out_endpoint(
    State(state): State<AuthState>,
    jar: PrivateCookieJar,
) -> Result<(PrivateCookieJar, StatusCode), Error> {
    if let Ok(token) = get_session_token_from_cookies(&jar) {
        let connection = state.db_connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            Error::DatabaseLockError
        })?;

        if delete_session(&token, &connection)? > 0 {
            tracing::info!("Ended session {token}");
        }
    }

    Ok((invalidate_session_cookie(jar), StatusCode::OK))
}
