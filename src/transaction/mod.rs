//! Transactions record money earned or spent by a user, each in one of the user's categories.

mod core;
mod create_endpoint;
mod delete_endpoint;
mod filter;
mod list_endpoint;
mod query;

pub use core::{Transaction, TransactionType, create_transaction_table};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transaction_endpoint;
pub use list_endpoint::{TransactionsViewState, get_summary_endpoint, get_transactions_endpoint};

#[cfg(test)]
pub(crate) use core::{NewTransaction, create_transaction, get_transaction};
#[cfg(test)]
pub(crate) use filter::TransactionFilter;
#[cfg(test)]
pub(crate) use query::get_transactions;
