//! Defines the endpoint for getting the logged in user.

use axum::{Extension, Json, extract::State};

use crate::{
    Error,
    user::{User, UserID, get_user_by_id},
};

use super::AuthState;

/// A route handler that responds with the logged in user.
///
/// Responds with a 404 if the user no longer exists.
pub async fn get_me_endpoint(
    State(state): State<AuthState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<User>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    get_user_by_id(user_id, &connection).map(Json)
}
