//! Defines the core data models and database queries for transactions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    Error,
    database_id::{CategoryId, TransactionId},
    user::UserID,
};

// ============================================================================
// MODELS
// ============================================================================

/// The format used for dates in JSON bodies and query strings, e.g. "2025-10-05".
const DATE_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");

time::serde::format_description!(date_format, Date, "[year]-[month]-[day]");

/// Parse an ISO 8601 calendar date such as "2025-10-05".
///
/// # Errors
/// Returns an [Error::BadRequest] naming `field` if `raw_date` is not a valid date.
pub fn parse_date(raw_date: &str, field: &str) -> Result<Date, Error> {
    Date::parse(raw_date.trim(), DATE_FORMAT).map_err(|error| {
        Error::BadRequest(format!(
            "{field} must be a date in the format YYYY-MM-DD, got \"{raw_date}\": {error}"
        ))
    })
}

/// Whether money was earned or spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    /// Money earned, e.g. a salary.
    Income,
    /// Money spent, e.g. groceries.
    Expense,
}

impl TransactionType {
    /// The name of the type as it is stored in the database and sent to clients.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "INCOME",
            TransactionType::Expense => "EXPENSE",
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    /// Parse a transaction type, ignoring case and surrounding whitespace.
    fn from_str(raw_type: &str) -> Result<Self, Self::Err> {
        let trimmed = raw_type.trim();

        if trimmed.eq_ignore_ascii_case("INCOME") {
            Ok(TransactionType::Income)
        } else if trimmed.eq_ignore_ascii_case("EXPENSE") {
            Ok(TransactionType::Expense)
        } else {
            Err(Error::BadRequest(format!(
                "type must be INCOME or EXPENSE, got \"{raw_type}\""
            )))
        }
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The amount of money spent or earned in this transaction, always positive.
    pub amount: f64,
    /// Whether the money was earned or spent.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// When the transaction happened.
    #[serde(with = "date_format")]
    pub date: Date,
    /// The ID of the category the transaction belongs to.
    pub category_id: CategoryId,
    /// The user that owns the transaction.
    pub user_id: UserID,
}

/// The validated fields of a transaction that has not been saved yet.
///
/// Use [NewTransaction::new] to check the amount and description.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    description: String,
    amount: f64,
    transaction_type: TransactionType,
    date: Date,
    category_id: CategoryId,
}

impl NewTransaction {
    /// Validate the fields for a new transaction.
    ///
    /// # Errors
    /// Returns an [Error::BadRequest] if `description` is blank or if `amount`
    /// is not a finite number greater than zero.
    pub fn new(
        description: &str,
        amount: f64,
        transaction_type: TransactionType,
        date: Date,
        category_id: CategoryId,
    ) -> Result<Self, Error> {
        Ok(Self {
            description: validate_description(description)?.to_owned(),
            amount: validate_amount(amount)?,
            transaction_type,
            date,
            category_id,
        })
    }

    /// The ID of the category the new transaction will belong to.
    pub fn category_id(&self) -> CategoryId {
        self.category_id
    }
}

/// Trim `description`, rejecting it with an [Error::BadRequest] if nothing is left.
pub(super) fn validate_description(description: &str) -> Result<&str, Error> {
    let description = description.trim();

    if description.is_empty() {
        Err(Error::BadRequest(
            "description must not be blank".to_owned(),
        ))
    } else {
        Ok(description)
    }
}

/// Reject `amount` with an [Error::BadRequest] unless it is a finite number greater than zero.
pub(super) fn validate_amount(amount: f64) -> Result<f64, Error> {
    if amount.is_finite() && amount > 0.0 {
        Ok(amount)
    } else {
        Err(Error::BadRequest(format!(
            "amount must be greater than zero, got {amount}"
        )))
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the transaction table in the database.
///
/// Categories cannot be deleted while they still have transactions, use
/// the category store to delete both together.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                description TEXT NOT NULL,
                amount REAL NOT NULL CHECK (amount > 0),
                type TEXT NOT NULL CHECK (type IN ('INCOME', 'EXPENSE')),
                date TEXT NOT NULL,
                category_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    // Every query on this table is scoped to a user and ordered or filtered by date.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
///
/// The columns must be selected in the order of [TRANSACTION_COLUMNS].
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let description = row.get(1)?;
    let amount = row.get(2)?;
    let transaction_type = row.get(3)?;
    let date = row.get(4)?;
    let category_id = row.get(5)?;
    let raw_user_id = row.get(6)?;

    Ok(Transaction {
        id,
        description,
        amount,
        transaction_type,
        date,
        category_id,
        user_id: UserID::new(raw_user_id),
    })
}

/// The columns read by [map_transaction_row], in order.
pub(crate) const TRANSACTION_COLUMNS: &str =
    "id, description, amount, type, date, category_id, user_id";

/// Save a new transaction owned by `user_id`.
///
/// The caller must check that the category belongs to `user_id` first.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error,
/// e.g. if the category does not exist.
pub fn create_transaction(
    transaction: NewTransaction,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(&format!(
            "INSERT INTO \"transaction\" (description, amount, type, date, category_id, user_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (
                transaction.description,
                transaction.amount,
                transaction.transaction_type,
                transaction.date,
                transaction.category_id,
                user_id.as_i64(),
            ),
            map_transaction_row,
        )
        .map_err(Error::from)
}

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE id = :id"
        ))?
        .query_row(&[(":id", &id)], map_transaction_row)?;

    Ok(transaction)
}

type RowsAffected = usize;

/// Delete the transaction with `id` if, and only if, it is owned by `user_id`.
///
/// Returns the number of deleted transactions, zero if the transaction does
/// not exist or belongs to another user.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn delete_transaction_if_owned(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    match get_transaction(id, connection) {
        Ok(transaction) if transaction.user_id == user_id => {}
        Ok(_) | Err(Error::NotFound) => return Ok(0),
        Err(error) => return Err(error),
    }

    connection
        .execute(
            "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
            (id, user_id.as_i64()),
        )
        .map_err(Error::from)
}

// ============================================================================
// TESTS
// ============================================================================


#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error, PasswordHash,
        category::{Category, CategoryName, create_category},
        db::initialize,
        user::{User, create_user},
    };

    use super::{
        NewTransaction, TransactionType, create_transaction, delete_transaction_if_owned,
        get_transaction,
    };

    fn get_test_connection() -> (Connection, User, Category) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let user = create_user(
            "Test User",
            "test@test.de",
            PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .unwrap();
        let category =
            create_category(CategoryName::new_unchecked("Essen"), None, user.id, &connection)
                .unwrap();

        (connection, user, category)
    }

    fn new_expense(amount: f64, category: &Category) -> NewTransaction {
        NewTransaction::new(
            "Supermarkt",
            amount,
            TransactionType::Expense,
            date!(2025 - 10 - 05),
            category.id,
        )
        .unwrap()
    }

    #[test]
    fn create_succeeds() {
        let (connection, user, category) = get_test_connection();

        let transaction =
            create_transaction(new_expense(12.3, &category), user.id, &connection).unwrap();

        assert_eq!(transaction.amount, 12.3);
        assert_eq!(transaction.transaction_type, TransactionType::Expense);
        assert_eq!(transaction.date, date!(2025 - 10 - 05));
        assert_eq!(transaction.category_id, category.id);
        assert_eq!(transaction.user_id, user.id);
        assert_eq!(get_transaction(transaction.id, &connection), Ok(transaction));
    }

    #[test]
    fn create_fails_on_missing_category() {
        let (connection, user, category) = get_test_connection();
        let transaction = NewTransaction::new(
            "Nirgendwo",
            1.0,
            TransactionType::Income,
            date!(2025 - 10 - 05),
            category.id + 42,
        )
        .unwrap();

        let result = create_transaction(transaction, user.id, &connection);

        assert!(matches!(result, Err(Error::SqlError(_))));
    }

    #[test]
    fn get_missing_transaction_is_not_found() {
        let (connection, _, _) = get_test_connection();

        assert_eq!(get_transaction(1337, &connection), Err(Error::NotFound));
    }

    #[test]
    fn delete_own_transaction_succeeds() {
        let (connection, user, category) = get_test_connection();
        let transaction =
            create_transaction(new_expense(5.0, &category), user.id, &connection).unwrap();

        assert_eq!(
            delete_transaction_if_owned(transaction.id, user.id, &connection),
            Ok(1)
        );
        assert_eq!(get_transaction(transaction.id, &connection), Err(Error::NotFound));
    }

    #[test]
    fn delete_other_users_transaction_is_a_no_op() {
        let (connection, user, category) = get_test_connection();
        let other_user = create_user(
            "Other User",
            "other@test.de",
            PasswordHash::new_unchecked("hunter3"),
            &connection,
        )
        .unwrap();
        let transaction =
            create_transaction(new_expense(5.0, &category), user.id, &connection).unwrap();

        assert_eq!(
            delete_transaction_if_owned(transaction.id, other_user.id, &connection),
            Ok(0)
        );
        assert_eq!(get_transaction(transaction.id, &connection), Ok(transaction));
    }

    #[test]
    fn deleting_category_deletes_its_transactions() {
        let (connection, user, category) = get_test_connection();
        let transaction =
            create_transaction(new_expense(5.0, &category), user.id, &connection).unwrap();

        crate::category::delete_category_if_owned(category.id, user.id, &connection).unwrap();

        assert_eq!(get_transaction(transaction.id, &connection), Err(Error::NotFound));
    }
}
