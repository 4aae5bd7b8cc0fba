//! Categories group a user's transactions, e.g. 'Groceries' or 'Salary'.

mod core;
mod create_endpoint;
mod delete_endpoint;
mod list_endpoint;

pub use core::{Category, CategoryName, create_category_table, get_owned_category};
pub use create_endpoint::{CategoryState, create_category_endpoint};
pub use delete_endpoint::delete_category_endpoint;
pub use list_endpoint::get_categories_endpoint;

#[cfg(test)]
pub(crate) use core::{create_category, delete_category_if_owned, get_categories_by_user};
