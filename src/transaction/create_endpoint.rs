//! Defines the endpoint for creating a new transaction.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State, rejection::JsonRejection},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error, category::get_owned_category, database_id::CategoryId, timezone::today_in,
    user::UserID,
};

use super::{
    Transaction, TransactionType,
    core::{
        NewTransaction, create_transaction, parse_date, validate_amount, validate_description,
    },
};

/// The state needed to create a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The request body for creating a transaction.
///
/// Every field is optional here so that a missing field is reported with the
/// same kind of message as an invalid one.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionForm {
    /// Text detailing the transaction.
    pub description: Option<String>,
    /// The value of the transaction, must be greater than zero.
    pub amount: Option<f64>,
    /// Either "INCOME" or "EXPENSE", case is ignored.
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    /// The category the transaction belongs to.
    pub category_id: Option<CategoryId>,
    /// The date when the transaction occurred. Defaults to today.
    pub date: Option<String>,
}

impl TransactionForm {
    /// Check the form fields in order, stopping at the first invalid one.
    ///
    /// `local_timezone` decides what "today" is when no date was given.
    fn validate(self, local_timezone: &str) -> Result<NewTransaction, Error> {
        let description = self.description.unwrap_or_default();
        validate_description(&description)?;

        let amount = self
            .amount
            .ok_or_else(|| Error::BadRequest("amount is required".to_owned()))
            .and_then(validate_amount)?;

        let transaction_type: TransactionType = self
            .transaction_type
            .as_deref()
            .ok_or_else(|| Error::BadRequest("type is required".to_owned()))?
            .parse()?;

        let category_id = self
            .category_id
            .ok_or_else(|| Error::BadRequest("categoryId is required".to_owned()))?;

        let date = match self.date.as_deref().map(str::trim) {
            None | Some("") => today_in(local_timezone)?,
            Some(raw_date) => parse_date(raw_date, "date")?,
        };

        NewTransaction::new(&description, amount, transaction_type, date, category_id)
    }
}

/// A route handler for creating a new transaction owned by the logged in user.
///
/// Responds with the created transaction, or a 404 if the category does not
/// exist or belongs to another user.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserID>,
    payload: Result<Json<TransactionForm>, JsonRejection>,
) -> Result<Json<Transaction>, Error> {
    let Json(form) = payload?;
    let new_transaction = form.validate(&state.local_timezone)?;

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    get_owned_category(new_transaction.category_id(), user_id, &connection).inspect_err(
        |error| {
            if *error == Error::NotFound {
                tracing::info!(
                    "User {user_id} tried to add a transaction to category {}, which they do not own",
                    new_transaction.category_id()
                );
            }
        },
    )?;

    let transaction = create_transaction(new_transaction, user_id, &connection)?;
    tracing::debug!("User {user_id} created transaction {}", transaction.id);

    Ok(Json(transaction))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, Json, extract::State};
    use rusqlite::Connection;
    use time::{OffsetDateTime, macros::date};

    use crate::{
        Error, PasswordHash,
        category::{Category, CategoryName, create_category},
        db::initialize,
        transaction::{NewTransaction, TransactionType, get_transaction},
        user::{User, create_user},
    };

    use super::{CreateTransactionState, TransactionForm, create_transaction_endpoint};

    fn get_state() -> (CreateTransactionState, User, Category) {
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

        let state = CreateTransactionState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Etc/UTC".to_owned(),
        };

        (state, user, category)
    }

    fn valid_form(category: &Category) -> TransactionForm {
        TransactionForm {
            description: Some("Supermarkt".to_owned()),
            amount: Some(42.5),
            transaction_type: Some("expense".to_owned()),
            category_id: Some(category.id),
            date: Some("2025-10-05".to_owned()),
        }
    }

    #[tokio::test]
    async fn can_create_transaction() {
        let (state, user, category) = get_state();

        let Json(transaction) = create_transaction_endpoint(
            State(state.clone()),
            Extension(user.id),
            Ok(Json(valid_form(&category))),
        )
        .await
        .unwrap();

        assert_eq!(transaction.description, "Supermarkt");
        assert_eq!(transaction.amount, 42.5);
        assert_eq!(transaction.transaction_type, TransactionType::Expense);
        assert_eq!(transaction.date, date!(2025 - 10 - 05));
        assert_eq!(transaction.user_id, user.id);
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(get_transaction(transaction.id, &connection), Ok(transaction));
    }

    #[tokio::test]
    async fn missing_date_defaults_to_today() {
        let (state, user, category) = get_state();
        let form = TransactionForm {
            date: Some("".to_owned()),
            ..valid_form(&category)
        };

        let Json(transaction) =
            create_transaction_endpoint(State(state), Extension(user.id), Ok(Json(form)))
                .await
                .unwrap();

        assert_eq!(transaction.date, OffsetDateTime::now_utc().date());
    }

    #[tokio::test]
    async fn invalid_fields_are_bad_requests() {
        let (state, user, category) = get_state();
        let forms = [
            TransactionForm {
                description: None,
                ..valid_form(&category)
            },
            TransactionForm {
                amount: Some(0.0),
                ..valid_form(&category)
            },
            TransactionForm {
                amount: Some(-1.0),
                ..valid_form(&category)
            },
            TransactionForm {
                transaction_type: Some("TRANSFER".to_owned()),
                ..valid_form(&category)
            },
            TransactionForm {
                category_id: None,
                ..valid_form(&category)
            },
            TransactionForm {
                date: Some("gestern".to_owned()),
                ..valid_form(&category)
            },
        ];

        for form in forms {
            let description = format!("{form:?}");

            let result =
                create_transaction_endpoint(State(state.clone()), Extension(user.id), Ok(Json(form)))
                    .await;

            assert!(
                matches!(result, Err(Error::BadRequest(_))),
                "want bad request for {description}, got {result:?}"
            );
        }
    }

    #[test]
    fn validate_reports_first_invalid_field_like_new_transaction() {
        let form = TransactionForm {
            description: Some("  ".to_owned()),
            amount: Some(f64::NAN),
            transaction_type: Some("TRANSFER".to_owned()),
            category_id: None,
            date: Some("gestern".to_owned()),
        };
        let want = NewTransaction::new(
            "  ",
            1.0,
            TransactionType::Income,
            date!(2025 - 10 - 05),
            1,
        );

        assert_eq!(form.validate("Etc/UTC"), want);

        let form = TransactionForm {
            description: Some("Kaffee".to_owned()),
            amount: Some(-5.0),
            transaction_type: None,
            category_id: None,
            date: None,
        };
        let want = NewTransaction::new(
            "Kaffee",
            -5.0,
            TransactionType::Expense,
            date!(2025 - 10 - 05),
            1,
        );

        assert_eq!(form.validate("Etc/UTC"), want);
    }

    #[tokio::test]
    async fn validation_happens_before_ownership_check() {
        let (state, user, _) = get_state();
        let form = TransactionForm {
            description: Some("Kaffee".to_owned()),
            amount: Some(-5.0),
            transaction_type: Some("EXPENSE".to_owned()),
            category_id: Some(999),
            date: None,
        };

        let result =
            create_transaction_endpoint(State(state), Extension(user.id), Ok(Json(form))).await;

        assert!(matches!(result, Err(Error::BadRequest(_))));
    }

    #[tokio::test]
    async fn other_users_category_is_not_found() {
        let (state, _, category) = get_state();
        let other_user = {
            let connection = state.db_connection.lock().unwrap();
            create_user(
                "Other User",
                "other@test.de",
                PasswordHash::new_unchecked("hunter3"),
                &connection,
            )
            .unwrap()
        };

        let result = create_transaction_endpoint(
            State(state),
            Extension(other_user.id),
            Ok(Json(valid_form(&category))),
        )
        .await;

        assert_eq!(result.map(|Json(transaction)| transaction), Err(Error::NotFound));
    }
}
