//! Database queries for selecting and summarising a user's transactions.

use rusqlite::{Connection, named_params};
use serde::Serialize;

use crate::Error;

use super::{
    TransactionType,
    core::{TRANSACTION_COLUMNS, Transaction, map_transaction_row},
    filter::TransactionFilter,
};

/// The `WHERE` clause shared by the list and summary queries.
///
/// Each optional parameter only constrains the result when it is not `NULL`.
const FILTER_CLAUSE: &str = "WHERE user_id = :user_id \
    AND (:category_id IS NULL OR category_id = :category_id) \
    AND (:from IS NULL OR date >= :from) \
    AND (:to IS NULL OR date <= :to)";

/// Get the transactions matching `filter`, most recent first.
///
/// Transactions on the same date are ordered by descending ID, i.e. the most
/// recently created transaction comes first.
///
/// # Errors
/// Returns [Error::SqlError] if:
/// - SQL query preparation or execution fails
/// - Transaction row mapping fails
pub fn get_transactions(
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let query = format!(
        "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" {FILTER_CLAUSE} \
        ORDER BY date DESC, id DESC"
    );

    connection
        .prepare(&query)?
        .query_map(
            named_params! {
                ":user_id": filter.user_id.as_i64(),
                ":category_id": filter.category_id,
                ":from": filter.from,
                ":to": filter.to,
            },
            map_transaction_row,
        )?
        .map(|transaction_result| transaction_result.map_err(Error::from))
        .collect()
}

/// The total income and expenses over a set of transactions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialSummary {
    /// The sum of all income.
    pub total_income: f64,
    /// The sum of all expenses.
    pub total_expense: f64,
    /// Income minus expenses.
    pub balance: f64,
}

impl FinancialSummary {
    /// Create a summary from the income and expense totals.
    pub fn new(total_income: f64, total_expense: f64) -> Self {
        Self {
            total_income,
            total_expense,
            balance: total_income - total_expense,
        }
    }
}

/// Sum the income and expenses of the transactions matching `filter`.
///
/// When no transactions match, both totals are zero.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn get_financial_summary(
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<FinancialSummary, Error> {
    let query = format!(
        "SELECT \
            SUM(CASE WHEN type = :income THEN amount ELSE 0 END), \
            SUM(CASE WHEN type = :expense THEN amount ELSE 0 END) \
        FROM \"transaction\" {FILTER_CLAUSE}"
    );

    // SUM over zero rows is NULL, not zero.
    let (total_income, total_expense): (Option<f64>, Option<f64>) = connection
        .prepare(&query)?
        .query_row(
            named_params! {
                ":income": TransactionType::Income,
                ":expense": TransactionType::Expense,
                ":user_id": filter.user_id.as_i64(),
                ":category_id": filter.category_id,
                ":from": filter.from,
                ":to": filter.to,
            },
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

    Ok(FinancialSummary::new(
        total_income.unwrap_or(0.0),
        total_expense.unwrap_or(0.0),
    ))
}
