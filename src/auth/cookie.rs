//! Defines functions for carrying the session token in a private cookie.
//!
//! The cookie is encrypted and signed with the app's cookie key, and it only
//! ever holds the opaque [SessionToken]. Whether the session is still valid is
//! decided on the server (see [super::session]).

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use time::{Duration, OffsetDateTime};

use crate::Error;

use super::session::SessionToken;

pub(crate) const COOKIE_SESSION: &str = "session";
/// The default duration for which a session is valid after the last request.
pub const DEFAULT_SESSION_DURATION: Duration = Duration::minutes(30);

/// Add the session cookie to the cookie jar, indicating that a user is logged in.
///
/// The cookie expires at `expires_at`, which should match the expiry of the
/// server-side session.
///
/// Returns the cookie jar with the cookie added.
pub(crate) fn set_session_cookie(
    jar: PrivateCookieJar,
    token: &SessionToken,
    expires_at: OffsetDateTime,
) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_SESSION, token.as_str().to_owned()))
            .path("/")
            .expires(expires_at)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

/// Set the session cookie to an invalid value and set its max age to zero, which should delete the cookie on the client side.
pub(crate) fn invalidate_session_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_SESSION, "deleted"))
            .path("/")
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

/// Get the session token from the session cookie.
///
/// # Errors
///
/// Returns an [Error::Unauthorized] if the cookie is missing or could not be
/// decrypted.
pub(crate) fn get_session_token_from_cookies(jar: &PrivateCookieJar) -> Result<SessionToken, Error> {
    match jar.get(COOKIE_SESSION) {
        Some(cookie) if !cookie.value_trimmed().is_empty() => {
            Ok(SessionToken::new_unchecked(cookie.value_trimmed()))
        }
        _ => Err(Error::Unauthorized(
            "no active session, please log in".to_owned(),
        )),
    }
}
