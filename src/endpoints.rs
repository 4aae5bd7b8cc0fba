//! The API endpoints URIs.

/// The route for registering a new user.
pub const REGISTER: &str = "/auth/register";
/// The route for logging in a user.
pub const LOG_IN: &str = "/auth/login";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/auth/logout";
/// The route for getting the logged in user.
pub const ME: &str = "/auth/me";
/// The route to list, create or delete all of the user's categories.
pub const CATEGORIES: &str = "/categories";
/// The route to delete a single category.
pub const CATEGORY: &str = "/categories/{category_id}";
/// The route to list, create or delete all of the user's transactions.
pub const TRANSACTIONS: &str = "/transactions";
/// The route to delete a single transaction.
pub const TRANSACTION: &str = "/transactions/{transaction_id}";
/// The route for the income, expense and balance totals.
pub const TRANSACTIONS_SUMMARY: &str = "/transactions/summary/balance";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter starts with a left brace and ends with a right brace, e.g.
/// '{category_id}' in '/categories/{category_id}'. Only the first parameter
/// is replaced.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// original `endpoint_path`.
#[cfg(test)]
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|offset| param_start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}

#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    use super::format_endpoint;

    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok(), "{uri} is not a valid URI");
    }

    #[test]
    fn endpoints_are_valid_uris() {
        assert_endpoint_is_valid_uri(endpoints::REGISTER);
        assert_endpoint_is_valid_uri(endpoints::LOG_IN);
        assert_endpoint_is_valid_uri(endpoints::LOG_OUT);
        assert_endpoint_is_valid_uri(endpoints::ME);
        assert_endpoint_is_valid_uri(endpoints::CATEGORIES);
        assert_endpoint_is_valid_uri(endpoints::TRANSACTIONS);
        assert_endpoint_is_valid_uri(endpoints::TRANSACTIONS_SUMMARY);
        assert_endpoint_is_valid_uri(&format_endpoint(endpoints::CATEGORY, 1));
        assert_endpoint_is_valid_uri(&format_endpoint(endpoints::TRANSACTION, 1));
    }

    #[test]
    fn replaces_parameter() {
        assert_eq!(format_endpoint(endpoints::CATEGORY, 42), "/categories/42");
    }

    #[test]
    fn returns_original_path_with_no_parameter() {
        assert_eq!(format_endpoint("/hello/world", 1), "/hello/world");
    }

    #[test]
    fn parameter_in_middle() {
        assert_eq!(format_endpoint("/hello/{world}/bye", 1), "/hello/1/bye");
    }
}
