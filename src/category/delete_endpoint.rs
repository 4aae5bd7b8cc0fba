//! Defines the endpoint for deleting a category.

use axum::{
    Extension,
    extract::{Path, State, rejection::PathRejection},
    http::StatusCode,
};

use crate::{Error, database_id::CategoryId, user::UserID};

use super::{CategoryState, core::delete_category_if_owned};

/// A route handler for deleting a category along with its transactions.
///
/// Categories that do not exist or belong to another user are left alone, and
/// the response is the same 200 OK either way.
pub async fn delete_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    category_id: Result<Path<CategoryId>, PathRejection>,
) -> Result<StatusCode, Error> {
    let Path(category_id) = category_id?;

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    match delete_category_if_owned(category_id, user_id, &connection)? {
        0 => tracing::info!("User {user_id} tried to delete category {category_id}, ignoring"),
        _ => tracing::debug!("User {user_id} deleted category {category_id}"),
    }

    Ok(StatusCode::OK)
}
