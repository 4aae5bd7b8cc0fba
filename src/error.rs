//! Defines the app level error type and its conversion to JSON error responses.
use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The request needs a valid session and there was none, or the session
    /// has expired.
    #[error("{0}")]
    Unauthorized(String),

    /// The email and password did not match a registered user.
    ///
    /// The same error is used for an unknown email and a wrong password so
    /// that clients cannot probe for registered email addresses.
    #[error("incorrect email or password")]
    InvalidCredentials,

    /// The email used to register is already taken (compared case-insensitively).
    #[error("the email address is already in use")]
    DuplicateEmail,

    /// The client sent input that could not be parsed or failed validation.
    #[error("{0}")]
    BadRequest(String),

    /// The requested resource was not found.
    ///
    /// Resources owned by another user are reported as not found as well, so
    /// that a client cannot learn whether another user's resource exists.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezone(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Error::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Error::BadRequest(rejection.body_text())
    }
}

/// The JSON body sent to the client when a request fails.
#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthorized(_) | Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Error::DuplicateEmail => StatusCode::CONFLICT,
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::HashingError(_)
            | Error::InvalidTimezone(_)
            | Error::SqlError(_)
            | Error::DatabaseLockError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            // Any server errors are not intended to be shown to the client.
            tracing::error!("An unexpected error occurred: {}", self);
            "An unexpected error occurred, check the server logs for more details.".to_owned()
        } else {
            self.to_string()
        };

        (status, Json(ErrorBody { error: &message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use super::Error;

    async fn body_text(error: Error) -> (StatusCode, String) {
        let response = error.into_response();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        (status, String::from_utf8_lossy(&body).to_string())
    }

    #[tokio::test]
    async fn maps_errors_to_status_codes() {
        let cases = [
            (Error::Unauthorized("no".to_owned()), StatusCode::UNAUTHORIZED),
            (Error::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (Error::DuplicateEmail, StatusCode::CONFLICT),
            (Error::BadRequest("bad".to_owned()), StatusCode::BAD_REQUEST),
            (Error::NotFound, StatusCode::NOT_FOUND),
            (Error::DatabaseLockError, StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, want) in cases {
            let (got, _) = body_text(error).await;
            assert_eq!(got, want);
        }
    }

    #[tokio::test]
    async fn bad_request_body_contains_message() {
        let (_, body) = body_text(Error::BadRequest("amount must be positive".to_owned())).await;

        assert_eq!(body, r#"{"error":"amount must be positive"}"#);
    }

    #[tokio::test]
    async fn internal_errors_hide_details() {
        let (status, body) = body_text(Error::HashingError("secret detail".to_owned())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.contains("secret detail"), "got body {body}");
    }

    #[test]
    fn query_returned_no_rows_is_not_found() {
        let error: Error = rusqlite::Error::QueryReturnedNoRows.into();

        assert_eq!(error, Error::NotFound);
    }
}
