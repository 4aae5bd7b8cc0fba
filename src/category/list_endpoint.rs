//! Defines the endpoint for listing the categories of the logged in user.

use axum::{Extension, Json, extract::State};

use crate::{Error, user::UserID};

use super::{Category, CategoryState, core::get_categories_by_user};

/// A route handler that responds with the categories owned by the logged in user.
pub async fn get_categories_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Vec<Category>>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    get_categories_by_user(user_id, &connection).map(Json)
}
