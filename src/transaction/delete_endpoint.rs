//! Defines the endpoint for deleting a transaction.

use axum::{
    Extension,
    extract::{Path, State, rejection::PathRejection},
    http::StatusCode,
};

use crate::{Error, database_id::TransactionId, user::UserID};

use super::{TransactionsViewState, core::delete_transaction_if_owned};

/// A route handler for deleting a transaction.
///
/// Transactions that do not exist or belong to another user are left alone,
/// and the response is the same 200 OK either way.
pub async fn delete_transaction_endpoint(
    State(state): State<TransactionsViewState>,
    Extension(user_id): Extension<UserID>,
    transaction_id: Result<Path<TransactionId>, PathRejection>,
) -> Result<StatusCode, Error> {
    let Path(transaction_id) = transaction_id?;

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    match delete_transaction_if_owned(transaction_id, user_id, &connection)? {
        0 => tracing::info!("User {user_id} tried to delete transaction {transaction_id}, ignoring"),
        _ => tracing::debug!("User {user_id} deleted transaction {transaction_id}"),
    }

    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error, PasswordHash,
        category::{CategoryName, create_category},
        db::initialize,
        transaction::{
            NewTransaction, TransactionType, TransactionsViewState, create_transaction,
            get_transaction,
        },
        user::create_user,
    };

    use super::delete_transaction_endpoint;

    #[tokio::test]
    async fn delete_is_ok_for_owned_and_foreign_transactions() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let owner = create_user(
            "Owner",
            "owner@test.de",
            PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .unwrap();
        let intruder = create_user(
            "Intruder",
            "intruder@test.de",
            PasswordHash::new_unchecked("hunter3"),
            &connection,
        )
        .unwrap();
        let category =
            create_category(CategoryName::new_unchecked("Essen"), None, owner.id, &connection)
                .unwrap();
        let transaction = create_transaction(
            NewTransaction::new(
                "Brot",
                3.5,
                TransactionType::Expense,
                date!(2025 - 10 - 05),
                category.id,
            )
            .unwrap(),
            owner.id,
            &connection,
        )
        .unwrap();
        let state = TransactionsViewState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let status = delete_transaction_endpoint(
            State(state.clone()),
            Extension(intruder.id),
            Ok(Path(transaction.id)),
        )
        .await;
        assert_eq!(status, Ok(StatusCode::OK));
        assert_eq!(
            get_transaction(transaction.id, &state.db_connection.lock().unwrap()),
            Ok(transaction.clone())
        );

        let status = delete_transaction_endpoint(
            State(state.clone()),
            Extension(owner.id),
            Ok(Path(transaction.id)),
        )
        .await;
        assert_eq!(status, Ok(StatusCode::OK));
        assert_eq!(
            get_transaction(transaction.id, &state.db_connection.lock().unwrap()),
            Err(Error::NotFound)
        );
    }
}
