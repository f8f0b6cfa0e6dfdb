//! JSON HTTP API definitions.

pub mod auth;
pub mod profile;
pub mod user;

use axum::{
    routing::{get, post},
    Router,
};

use crate::define_error;

pub use self::user::User;

/// Creates a [`Router`] serving the JSON API.
///
/// Expected to be nested under the `/api` path.
#[must_use]
pub fn router() -> Router {
    Router::new()
        .route("/register", post(auth::register))
        .route("/signin", post(auth::sign_in))
        .route("/logout", post(auth::logout))
        .route("/profile", get(profile::get).put(profile::update))
}

define_error! {
    enum ValidationError {
        #[code = "INVALID_EMAIL"]
        #[status = BAD_REQUEST]
        #[message = "Invalid email address"]
        Email,

        #[code = "INVALID_PASSWORD"]
        #[status = BAD_REQUEST]
        #[message = "Password must be 1 to 128 bytes long"]
        Password,

        #[code = "INVALID_NAME"]
        #[status = BAD_REQUEST]
        #[message = "Name must be at most 512 bytes long"]
        Name,
    }
}

/// Parses an optional [`domain::user::Name`] provided by a client.
///
/// Blank names are treated as absent.
///
/// # Errors
///
/// With [`ValidationError::Name`] if the name is too long.
///
/// [`domain::user::Name`]: service::domain::user::Name
pub fn parse_name(
    name: Option<String>,
) -> Result<Option<service::domain::user::Name>, ValidationError> {
    match name.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(name) => service::domain::user::Name::new(name)
            .map(Some)
            .ok_or(ValidationError::Name),
    }
}
