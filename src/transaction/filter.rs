//! Parses the optional query parameters used to filter transactions.

use serde::Deserialize;
use time::Date;

use crate::{Error, database_id::CategoryId, user::UserID};

use super::core::parse_date;

/// The raw query parameters for filtering transactions, e.g.
/// `?categoryId=2&from=2025-10-01&to=`.
///
/// Parameters are kept as strings so that blank values can be treated the
/// same as missing ones instead of failing to deserialize.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionQuery {
    /// Only include transactions in this category.
    pub category_id: Option<String>,
    /// Only include transactions on or after this date.
    pub from: Option<String>,
    /// Only include transactions on or before this date.
    pub to: Option<String>,
}

/// The constraints for selecting a user's transactions.
///
/// A field that is `None` imposes no constraint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransactionFilter {
    /// The owner of the transactions, always required.
    pub user_id: UserID,
    /// Only include transactions in this category.
    pub category_id: Option<CategoryId>,
    /// Only include transactions on or after this date.
    pub from: Option<Date>,
    /// Only include transactions on or before this date.
    pub to: Option<Date>,
}

impl TransactionFilter {
    /// A filter that selects all of the transactions owned by `user_id`.
    #[cfg(test)]
    pub fn for_user(user_id: UserID) -> Self {
        Self {
            user_id,
            category_id: None,
            from: None,
            to: None,
        }
    }

    /// Build a filter for `user_id` from the raw query parameters.
    ///
    /// # Errors
    /// Returns an [Error::BadRequest] if a parameter is present, not blank and
    /// cannot be parsed.
    pub fn from_query(user_id: UserID, query: &TransactionQuery) -> Result<Self, Error> {
        let category_id = non_blank(&query.category_id)
            .map(|raw_id| {
                raw_id.parse::<CategoryId>().map_err(|error| {
                    Error::BadRequest(format!(
                        "categoryId must be an integer, got \"{raw_id}\": {error}"
                    ))
                })
            })
            .transpose()?;
        let from = non_blank(&query.from)
            .map(|raw_date| parse_date(raw_date, "from"))
            .transpose()?;
        let to = non_blank(&query.to)
            .map(|raw_date| parse_date(raw_date, "to"))
            .transpose()?;

        Ok(Self {
            user_id,
            category_id,
            from,
            to,
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
