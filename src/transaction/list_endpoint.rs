//! Defines the endpoints for listing and summarising the logged in user's transactions.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Query, State, rejection::QueryRejection},
};
use rusqlite::Connection;

use crate::{AppState, Error, user::UserID};

use super::{
    Transaction,
    filter::{TransactionFilter, TransactionQuery},
    query::{FinancialSummary, get_financial_summary, get_transactions},
};

/// The state needed to query transactions.
#[derive(Debug, Clone)]
pub struct TransactionsViewState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionsViewState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that responds with the logged in user's transactions,
/// filtered by the optional `categoryId`, `from` and `to` query parameters.
pub async fn get_transactions_endpoint(
    State(state): State<TransactionsViewState>,
    Extension(user_id): Extension<UserID>,
    query: Result<Query<TransactionQuery>, QueryRejection>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let Query(query) = query?;
    let filter = TransactionFilter::from_query(user_id, &query)?;

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    get_transactions(&filter, &connection).map(Json)
}

/// A route handler that responds with the total income, total expenses and
/// balance of the logged in user's transactions, using the same filters as
/// [get_transactions_endpoint].
pub async fn get_summary_endpoint(
    State(state): State<TransactionsViewState>,
    Extension(user_id): Extension<UserID>,
    query: Result<Query<TransactionQuery>, QueryRejection>,
) -> Result<Json<FinancialSummary>, Error> {
    let Query(query) = query?;
    let filter = TransactionFilter::from_query(user_id, &query)?;

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    get_financial_summary(&filter, &connection).map(Json)
}
