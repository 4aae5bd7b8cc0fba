//! Session based authentication: logging in and out, registration and the auth middleware.

mod cookie;
mod log_in;
mod log_out;
mod me;
mod middleware;
mod register;
mod session;

pub use cookie::DEFAULT_SESSION_DURATION;
pub use log_in::log_in_endpoint;
pub use log_out::log_out_endpoint;
pub use me::get_me_endpoint;
pub use middleware::{AuthState, auth_guard};
pub use register::register_endpoint;
pub use session::{create_session_table, delete_expired_sessions};

#[cfg(test)]
pub(crate) use cookie::COOKIE_SESSION;
