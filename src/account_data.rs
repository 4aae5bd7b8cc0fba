//! Endpoints for clearing out all of the logged in user's data at once.

use axum::{Extension, Json, extract::State};
use rusqlite::Connection;
use serde::Serialize;

use crate::{Error, category::CategoryState, user::UserID};

type RowsAffected = usize;

/// The response to deleting all of a user's transactions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DeletedTransactions {
    /// How many transactions were deleted.
    pub deleted: RowsAffected,
}

/// The response to deleting all of a user's categories.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedCategories {
    /// How many transactions were deleted along with the categories.
    pub deleted_transactions: RowsAffected,
    /// How many categories were deleted.
    pub deleted_categories: RowsAffected,
}

/// Delete every transaction owned by `user_id`.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn delete_all_transactions(
    user_id: UserID,
    connection: &Connection,
) -> Result<DeletedTransactions, Error> {
    let deleted = connection.execute(
        "DELETE FROM \"transaction\" WHERE user_id = ?1",
        [user_id.as_i64()],
    )?;

    Ok(DeletedTransactions { deleted })
}

/// Delete every transaction and then every category owned by `user_id`.
///
/// Both deletes run in one SQL transaction, so a failure leaves the user's
/// data untouched.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn delete_all_categories(
    user_id: UserID,
    connection: &Connection,
) -> Result<DeletedCategories, Error> {
    let transaction = connection.unchecked_transaction()?;

    let deleted_transactions = transaction.execute(
        "DELETE FROM \"transaction\" WHERE user_id = ?1",
        [user_id.as_i64()],
    )?;
    let deleted_categories =
        transaction.execute("DELETE FROM category WHERE user_id = ?1", [user_id.as_i64()])?;

    transaction.commit()?;

    Ok(DeletedCategories {
        deleted_transactions,
        deleted_categories,
    })
}

/// A route handler that deletes all of the logged in user's transactions.
pub async fn delete_all_transactions_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<DeletedTransactions>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let deleted = delete_all_transactions(user_id, &connection)?;
    tracing::info!("Deleted {} transactions of user {user_id}", deleted.deleted);

    Ok(Json(deleted))
}

/// A route handler that deletes all of the logged in user's categories and transactions.
pub async fn delete_all_categories_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<DeletedCategories>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let deleted = delete_all_categories(user_id, &connection)?;
    tracing::info!(
        "Deleted {} categories and {} transactions of user {user_id}",
        deleted.deleted_categories,
        deleted.deleted_transactions
    );

    Ok(Json(deleted))
}
