//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};

use crate::{
    AppState, Error,
    account_data::{delete_all_categories_endpoint, delete_all_transactions_endpoint},
    auth::{
        auth_guard, get_me_endpoint, log_in_endpoint, log_out_endpoint, register_endpoint,
    },
    category::{create_category_endpoint, delete_category_endpoint, get_categories_endpoint},
    endpoints,
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, get_summary_endpoint,
        get_transactions_endpoint,
    },
};

/// Return a router with all the app's routes.
///
/// Every route except registration, log-in and log-out requires a session.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::REGISTER, post(register_endpoint))
        .route(endpoints::LOG_IN, post(log_in_endpoint))
        .route(endpoints::LOG_OUT, post(log_out_endpoint));

    let protected_routes = Router::new()
        .route(endpoints::ME, get(get_me_endpoint))
        .route(
            endpoints::CATEGORIES,
            get(get_categories_endpoint)
                .post(create_category_endpoint)
                .delete(delete_all_categories_endpoint),
        )
        .route(endpoints::CATEGORY, delete(delete_category_endpoint))
        .route(
            endpoints::TRANSACTIONS,
            get(get_transactions_endpoint)
                .post(create_transaction_endpoint)
                .delete(delete_all_transactions_endpoint),
        )
        .route(endpoints::TRANSACTIONS_SUMMARY, get(get_summary_endpoint))
        .route(endpoints::TRANSACTION, delete(delete_transaction_endpoint))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

async fn get_404_not_found() -> Error {
    Error::NotFound
}
