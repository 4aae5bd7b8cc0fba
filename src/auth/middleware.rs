//! Authentication middleware that resolves the session cookie to a user and extends the session.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::header::SET_COOKIE,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use crate::{AppState, Error, user::UserID};

use super::{
    cookie::{get_session_token_from_cookies, set_session_cookie},
    session::{SessionToken, extend_session, get_session_user_id},
};

/// The state needed for the auth middleware and the session endpoints.
#[derive(Debug, Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// How long a session stays valid after the last authenticated request.
    pub session_duration: Duration,
    /// The database connection holding the sessions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            session_duration: state.session_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

/// Middleware function that checks for a live session.
///
/// The user ID is placed into the request and the request is executed
/// normally if the session cookie refers to a session that has not expired.
/// Otherwise, a 401 Unauthorized response is returned and the route handler
/// never runs. After the handler has run, the session expiry is pushed back
/// and the refreshed cookie is added to the response.
///
/// **Note**: Route handlers can use the function argument `Extension(user_id): Extension<UserID>` to receive the user ID.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();
    let jar = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(error) => {
            tracing::error!("Error getting cookie jar: {error:?}");
            return Error::Unauthorized("no active session, please log in".to_owned())
                .into_response();
        }
    };

    let token = match get_session_token_from_cookies(&jar) {
        Ok(token) => token,
        Err(error) => return error.into_response(),
    };

    let user_id = match resolve_user_id(&state, &token) {
        Ok(user_id) => user_id,
        Err(error) => return error.into_response(),
    };

    parts.extensions.insert(user_id);
    let request = Request::from_parts(parts, body);
    let response = next.run(request).await;

    let jar = match refresh_session(&state, &token) {
        Ok(expires_at) => set_session_cookie(jar, &token, expires_at),
        Err(error) => {
            tracing::warn!("Could not extend session {token}: {error}");
            return response;
        }
    };

    let (mut parts, body) = response.into_parts();
    for (key, val) in jar.into_response().headers().iter() {
        if key != SET_COOKIE {
            continue;
        }

        parts.headers.append(key, val.to_owned());
    }

    Response::from_parts(parts, body)
}

// The lock is taken in plain functions so that the guard is never held across an `.await`.
fn resolve_user_id(state: &AuthState, token: &SessionToken) -> Result<UserID, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    get_session_user_id(token, OffsetDateTime::now_utc(), &connection)
}

fn refresh_session(state: &AuthState, token: &SessionToken) -> Result<OffsetDateTime, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    extend_session(token, state.session_duration, &connection)
}

#[cfg(test)]
mod auth_guard_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension, Router,
        extract::{Path, State},
        http::StatusCode,
        middleware,
        routing::{get, post},
    };
    use axum_extra::extract::{
        PrivateCookieJar,
        cookie::{Cookie, Key},
    };
    use axum_test::TestServer;
    use rusqlite::Connection;
    use sha2::{Digest, Sha512};
    use time::{Duration, OffsetDateTime};

    use crate::{
        Error, PasswordHash,
        auth::{
            cookie::{COOKIE_SESSION, set_session_cookie},
            session::{SessionToken, create_session, get_session},
        },
        db::initialize,
        user::{UserID, create_user},
    };

    use super::{AuthState, auth_guard};

    const TEST_LOG_IN_ROUTE_PATH: &str = "/log_in/{seconds}";
    const TEST_PROTECTED_ROUTE: &str = "/protected";

    async fn test_handler(Extension(user_id): Extension<UserID>) -> String {
        user_id.to_string()
    }

    /// Start a session for the first user that expires after `seconds`.
    async fn stub_log_in_route(
        State(state): State<AuthState>,
        Path(seconds): Path<i64>,
        jar: PrivateCookieJar,
    ) -> Result<PrivateCookieJar, Error> {
        let connection = state.db_connection.lock().unwrap();
        let session = create_session(UserID::new(1), Duration::seconds(seconds), &connection)?;

        Ok(set_session_cookie(jar, &session.token, session.expires_at))
    }

    fn get_state() -> AuthState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        create_user(
            "Test User",
            "test@test.de",
            PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .unwrap();

        AuthState {
            cookie_key: Key::from(&Sha512::digest("nafstenoas")),
            session_duration: Duration::minutes(30),
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    fn get_test_server(state: AuthState) -> TestServer {
        let app = Router::new()
            .route(TEST_PROTECTED_ROUTE, get(test_handler))
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard))
            .route(TEST_LOG_IN_ROUTE_PATH, post(stub_log_in_route))
            .with_state(state);

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn get_protected_route_without_cookie_is_unauthorized() {
        let server = get_test_server(get_state());

        let response = server.get(TEST_PROTECTED_ROUTE).await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        assert!(response.text().contains("\"error\""));
    }

    #[tokio::test]
    async fn get_protected_route_with_unencrypted_cookie_is_unauthorized() {
        let state = get_state();
        let session = {
            let connection = state.db_connection.lock().unwrap();
            create_session(UserID::new(1), Duration::minutes(5), &connection).unwrap()
        };
        let server = get_test_server(state);

        // Not encrypted with the server's key, so the jar will not decrypt it.
        server
            .get(TEST_PROTECTED_ROUTE)
            .add_cookie(Cookie::new(COOKIE_SESSION, session.token.as_str().to_owned()))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn get_protected_route_with_session_succeeds() {
        let server = get_test_server(get_state());
        let session_cookie = server.post("/log_in/60").await.cookie(COOKIE_SESSION);

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .add_cookie(session_cookie)
            .await;

        response.assert_status_ok();
        response.assert_text("1");
    }

    #[tokio::test]
    async fn get_protected_route_extends_session() {
        let state = get_state();
        let server = get_test_server(state.clone());
        let session_cookie = server.post("/log_in/60").await.cookie(COOKIE_SESSION);
        let initial_expiry = session_cookie.expires_datetime().unwrap();

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .add_cookie(session_cookie)
            .await;

        response.assert_status_ok();
        let refreshed_cookie = response.cookie(COOKIE_SESSION);
        let refreshed_expiry = refreshed_cookie.expires_datetime().unwrap();
        assert!(
            refreshed_expiry > initial_expiry,
            "want expiry after {initial_expiry}, got {refreshed_expiry}"
        );
        let connection = state.db_connection.lock().unwrap();
        let token = {
            let mut statement = connection.prepare("SELECT token FROM session").unwrap();
            let raw_token: String = statement.query_row([], |row| row.get(0)).unwrap();
            SessionToken::new_unchecked(&raw_token)
        };
        let session = get_session(&token, &connection).unwrap();
        assert!(session.expires_at >= OffsetDateTime::now_utc() + Duration::minutes(29));
    }

    #[tokio::test]
    async fn get_protected_route_with_expired_session_is_unauthorized() {
        let server = get_test_server(get_state());
        let session_cookie = server.post("/log_in/-10").await.cookie(COOKIE_SESSION);

        server
            .get(TEST_PROTECTED_ROUTE)
            .add_cookie(session_cookie)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
