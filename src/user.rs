//! Code for creating the user table and fetching users from the database.

use std::fmt::Display;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, PasswordHash};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A registered user of the application.
///
/// Serializing a user never includes the password hash.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The user's display name.
    pub name: String,
    /// The user's email address, unique ignoring case.
    pub email: String,
    /// The user's password hash.
    #[serde(skip)]
    pub password_hash: PasswordHash,
}

/// Create the user table.
///
/// Emails are compared case-insensitively, so "Foo@Bar.com" and "foo@bar.com"
/// cannot both be registered.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE COLLATE NOCASE,
                password TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Trim `email` and fold it to lower case, so that addresses differing only
/// in case, including non-ASCII letters, are treated as the same address.
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Create and insert a new user into the database.
///
/// The email is stored trimmed and in lower case.
///
/// # Errors
///
/// Returns a:
/// - [Error::DuplicateEmail] if a user with the same email (ignoring case) already exists,
/// - or [Error::SqlError] if some other SQL related error occurred.
pub fn create_user(
    name: &str,
    email: &str,
    password_hash: PasswordHash,
    connection: &Connection,
) -> Result<User, Error> {
    let email = normalize_email(email);

    connection.execute(
        "INSERT INTO user (name, email, password) VALUES (?1, ?2, ?3)",
        (name, &email, password_hash.as_ref()),
    )?;

    let id = UserID::new(connection.last_insert_rowid());

    Ok(User {
        id,
        name: name.to_owned(),
        email,
        password_hash,
    })
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, name, email, password FROM user WHERE id = :id")?
        .query_row(&[(":id", &user_id.as_i64())], map_user_row)
        .map_err(|error| error.into())
}

/// Get the user whose email matches `email`, ignoring case.
///
/// # Errors
///
/// This function will return an error if:
/// - `email` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_email(email: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, name, email, password FROM user WHERE email = :email COLLATE NOCASE")?
        .query_row(&[(":email", &normalize_email(email))], map_user_row)
        .map_err(|error| error.into())
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_id = row.get(0)?;
    let raw_password_hash: String = row.get(3)?;

    Ok(User {
        id: UserID::new(raw_id),
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
    })
}
