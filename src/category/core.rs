//! Core category types and the queries that read and write the category table.

use std::fmt::Display;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, database_id::CategoryId, user::UserID};

/// A validated, non-empty category name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::BadRequest] if `name` is empty or only whitespace.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::BadRequest("category name must not be blank".to_owned()))
        } else {
            Ok(Self(name.to_owned()))
        }
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user defined grouping for transactions, e.g. 'Groceries' or 'Salary'.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// The category's ID in the application database.
    pub id: CategoryId,
    /// The name of the category.
    pub name: CategoryName,
    /// An optional, longer explanation of what belongs in the category.
    pub description: Option<String>,
    /// The user that owns the category.
    pub user_id: UserID,
}

/// Create the category table and its index on the owning user.
///
/// Deleting a user deletes their categories too.
///
/// # Errors
/// Returns an error if the table or index cannot be created.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT,
            user_id INTEGER NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_category_user_id ON category(user_id)",
        (),
    )?;

    Ok(())
}

fn map_row_to_category(row: &Row) -> Result<Category, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_name: String = row.get(1)?;
    let description = row.get(2)?;
    let raw_user_id = row.get(3)?;

    Ok(Category {
        id,
        name: CategoryName::new_unchecked(&raw_name),
        description,
        user_id: UserID::new(raw_user_id),
    })
}

/// Create a category owned by `user_id`.
///
/// A blank `description` is stored as no description.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error, e.g. if `user_id`
/// does not refer to a registered user.
pub fn create_category(
    name: CategoryName,
    description: Option<&str>,
    user_id: UserID,
    connection: &Connection,
) -> Result<Category, Error> {
    let description = description
        .map(str::trim)
        .filter(|description| !description.is_empty());

    connection
        .prepare(
            "INSERT INTO category (name, description, user_id) VALUES (?1, ?2, ?3)
            RETURNING id, name, description, user_id",
        )?
        .query_row(
            (name.as_ref(), description, user_id.as_i64()),
            map_row_to_category,
        )
        .map_err(Error::from)
}

/// Retrieve the category with `category_id`, regardless of who owns it.
///
/// # Errors
/// Returns an [Error::NotFound] if `category_id` does not refer to a category.
pub fn get_category(category_id: CategoryId, connection: &Connection) -> Result<Category, Error> {
    connection
        .prepare("SELECT id, name, description, user_id FROM category WHERE id = :id")?
        .query_row(&[(":id", &category_id)], map_row_to_category)
        .map_err(Error::from)
}

/// Retrieve the category with `category_id` only if it is owned by `user_id`.
///
/// # Errors
/// Returns an [Error::NotFound] if `category_id` does not refer to a category
/// or if the category belongs to another user. The two cases are
/// indistinguishable to the caller.
pub fn get_owned_category(
    category_id: CategoryId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Category, Error> {
    let category = get_category(category_id, connection)?;

    if category.user_id == user_id {
        Ok(category)
    } else {
        Err(Error::NotFound)
    }
}

/// Retrieve all of the categories owned by `user_id`, in the order they were created.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_categories_by_user(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    connection
        .prepare(
            "SELECT id, name, description, user_id FROM category
            WHERE user_id = :user_id ORDER BY id ASC",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_row_to_category)?
        .map(|maybe_category| maybe_category.map_err(Error::from))
        .collect()
}

type RowsAffected = usize;

/// Delete the category with `category_id` if, and only if, it is owned by `user_id`.
///
/// The category's transactions are deleted along with it in a single SQL
/// transaction, so either both are deleted or neither is.
///
/// Returns the number of categories deleted, which is zero when the category
/// does not exist or belongs to another user.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn delete_category_if_owned(
    category_id: CategoryId,
    user_id: UserID,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    match get_owned_category(category_id, user_id, connection) {
        Ok(_) => {}
        Err(Error::NotFound) => return Ok(0),
        Err(error) => return Err(error),
    }

    let transaction = connection.unchecked_transaction()?;

    transaction.execute(
        "DELETE FROM \"transaction\" WHERE category_id = ?1",
        [category_id],
    )?;
    let rows_affected = transaction.execute(
        "DELETE FROM category WHERE id = ?1 AND user_id = ?2",
        (category_id, user_id.as_i64()),
    )?;

    transaction.commit()?;

    Ok(rows_affected)
}
