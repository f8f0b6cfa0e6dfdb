//! Profile handlers of the current `User`.

use axum::{extract::rejection::JsonRejection, Json};
use serde::{Deserialize, Serialize};
use service::command::{self, update_user_profile, Command as _};

use crate::{api, context::AuthError, AsError, Context, Error};

/// Profile of the current `User`.
#[derive(Debug, Serialize)]
pub struct Profile {
    /// Current [`api::User`].
    pub user: api::User,
}

/// Profile of the current `User` after its update.
#[derive(Debug, Serialize)]
pub struct ProfileUpdated {
    /// Human-readable outcome.
    pub message: &'static str,

    /// Updated [`api::User`].
    pub user: api::User,
}

/// New names of the current `User`.
///
/// Both names are replaced, so an absent or blank one is cleared.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Names {
    /// New first name.
    pub first_name: Option<String>,

    /// New last name.
    pub last_name: Option<String>,
}

/// Returns the profile of the current `User`.
///
/// # Errors
///
/// With `UNAUTHORIZED` error code if the request carries no valid session.
#[tracing::instrument(skip_all, fields(http.route = "/api/profile"))]
pub async fn get(ctx: Context) -> Result<Json<Profile>, Error> {
    let user = ctx.current_user().await?.clone();

    Ok(Json(Profile { user: user.into() }))
}

/// Updates the names of the current `User`.
///
/// # Errors
///
/// Possible error codes:
/// - `UNAUTHORIZED` - the request carries no valid session;
/// - `INVALID_NAME` - one of the provided names is too long.
#[tracing::instrument(
    skip_all,
    fields(http.route = "/api/profile", user.id = tracing::field::Empty),
)]
pub async fn update(
    ctx: Context,
    payload: Result<Json<Names>, JsonRejection>,
) -> Result<Json<ProfileUpdated>, Error> {
    let user_id = ctx.current_user().await?.id;
    _ = tracing::Span::current()
        .record("user.id", tracing::field::display(user_id));

    let Json(names) = payload.map_err(AsError::into_error)?;
    let first_name = api::parse_name(names.first_name)?;
    let last_name = api::parse_name(names.last_name)?;

    let user = ctx
        .service()
        .execute(command::UpdateUserProfile {
            user_id,
            first_name,
            last_name,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(ProfileUpdated {
        message: "Profile updated successfully",
        user: user.into(),
    }))
}

impl AsError for update_user_profile::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            // Removed between the session lookup and the update.
            Self::UserNotExists(_) => Some(AuthError::Unauthorized.into()),
        }
    }
}
