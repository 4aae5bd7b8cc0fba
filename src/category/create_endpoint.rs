//! Defines the endpoint for creating a new category.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State, rejection::JsonRejection},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{AppState, Error, user::UserID};

use super::{Category, CategoryName, core::create_category};

/// The state needed to list, create or delete categories.
#[derive(Debug, Clone)]
pub struct CategoryState {
    /// The database connection for managing categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for creating a category.
///
/// There is deliberately no user ID here, the owner is always the logged in user.
#[derive(Debug, Deserialize)]
pub struct CategoryForm {
    /// The name of the new category.
    pub name: String,
    /// An optional description of the new category.
    #[serde(default)]
    pub description: Option<String>,
}

/// A route handler for creating a new category owned by the logged in user.
///
/// Responds with the created category.
pub async fn create_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    payload: Result<Json<CategoryForm>, JsonRejection>,
) -> Result<Json<Category>, Error> {
    let Json(form) = payload?;
    let name = CategoryName::new(&form.name)?;

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let category = create_category(name, form.description.as_deref(), user_id, &connection)?;
    tracing::debug!("User {user_id} created category {}", category.id);

    Ok(Json(category))
}
