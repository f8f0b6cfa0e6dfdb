//! Registration and sign-in handlers.

use axum::{extract::rejection::JsonRejection, Json};
use axum_extra::extract::{
    cookie::{Cookie, SameSite},
    CookieJar,
};
use derive_more::Debug;
use secrecy::SecretBox;
use serde::{Deserialize, Serialize};
use service::{
    auth::cookie,
    command::{self, create_user, create_user_session, Command as _},
    domain::user::{self, session},
};

use crate::{api, define_error, AsError, Context, Error};

/// Credentials provided by a client to register or sign in.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Credentials {
    /// Email address of the `User`.
    pub email: Option<String>,

    /// Password of the `User`.
    #[debug(skip)]
    pub password: Option<String>,

    /// First name of a new `User`.
    pub first_name: Option<String>,

    /// Last name of a new `User`.
    pub last_name: Option<String>,
}

impl Credentials {
    /// Splits these [`Credentials`] into a validated [`user::Email`] and
    /// [`user::Password`].
    ///
    /// # Errors
    ///
    /// With an [`InvalidCredentials`] describing the first failed check.
    fn validate(
        &self,
    ) -> Result<(user::Email, user::Password), InvalidCredentials> {
        let (Some(email), Some(password)) = (
            self.email.as_deref().filter(|e| !e.is_empty()),
            self.password.as_deref().filter(|p| !p.is_empty()),
        ) else {
            return Err(InvalidCredentials::Missing);
        };

        let email = user::Email::new(email.trim())
            .ok_or(InvalidCredentials::Email)?;
        let password = user::Password::new(password)
            .ok_or(InvalidCredentials::Password)?;
        Ok((email, password))
    }
}

/// Reason of [`Credentials`] being rejected before reaching the `Service`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum InvalidCredentials {
    /// Email or password is absent or empty.
    Missing,

    /// Email is malformed.
    Email,

    /// Password is malformed.
    Password,
}

impl From<InvalidCredentials> for Error {
    fn from(e: InvalidCredentials) -> Self {
        match e {
            InvalidCredentials::Missing => CredentialsError::Required.into(),
            InvalidCredentials::Email => api::ValidationError::Email.into(),
            InvalidCredentials::Password => {
                api::ValidationError::Password.into()
            }
        }
    }
}

/// Response of a successful registration or sign-in.
#[derive(Debug, Serialize)]
pub struct SignedIn {
    /// Always `true`.
    pub success: bool,

    /// Human-readable outcome.
    pub message: &'static str,

    /// Signed-in [`api::User`].
    pub user: api::User,
}

/// Response of a successful logout.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct LoggedOut {
    /// Human-readable outcome.
    pub message: &'static str,
}

/// Registers a new `User` and signs it in.
///
/// # Errors
///
/// Possible error codes:
/// - `CREDENTIALS_REQUIRED` - email or password is missing;
/// - `INVALID_EMAIL`, `INVALID_PASSWORD`, `INVALID_NAME` - malformed input;
/// - `EMAIL_OCCUPIED` - provided email is used by another `User`.
#[tracing::instrument(
    skip_all,
    fields(http.route = "/api/register", email = tracing::field::Empty),
)]
pub async fn register(
    ctx: Context,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<(http::StatusCode, CookieJar, Json<SignedIn>), Error> {
    let Json(creds) = payload.map_err(AsError::into_error)?;
    let (email, password) = creds.validate()?;
    _ = tracing::Span::current().record("email", tracing::field::display(&email));
    let first_name = api::parse_name(creds.first_name)?;
    let last_name = api::parse_name(creds.last_name)?;

    let user = ctx
        .service()
        .execute(command::CreateUser {
            email,
            password: SecretBox::new(Box::new(password)),
            first_name,
            last_name,
        })
        .await
        .map_err(AsError::into_error)?;
    let output = ctx
        .service()
        .execute(command::CreateUserSession::ByUserId(user.id))
        .await
        .map_err(AsError::into_error)?;

    let cookies = ctx
        .cookies()
        .clone()
        .add(session_cookie(&ctx.service().config().cookie, output.token));
    Ok((
        http::StatusCode::CREATED,
        cookies,
        Json(SignedIn {
            success: true,
            message: "User registered successfully",
            user: output.user.into(),
        }),
    ))
}

/// Signs in an existing `User` by its credentials.
///
/// # Errors
///
/// Possible error codes:
/// - `CREDENTIALS_REQUIRED` - email or password is missing;
/// - `WRONG_CREDENTIALS` - provided credentials do not match any `User`.
#[tracing::instrument(
    skip_all,
    fields(http.route = "/api/signin", email = tracing::field::Empty),
)]
pub async fn sign_in(
    ctx: Context,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<(CookieJar, Json<SignedIn>), Error> {
    let Json(creds) = payload.map_err(AsError::into_error)?;
    let (email, password) = creds.validate().map_err(|e| match e {
        InvalidCredentials::Missing => Error::from(CredentialsError::Required),
        // Malformed credentials never match a `User`.
        InvalidCredentials::Email | InvalidCredentials::Password => {
            CredentialsError::Wrong.into()
        }
    })?;
    _ = tracing::Span::current().record("email", tracing::field::display(&email));

    let output = ctx
        .service()
        .execute(command::CreateUserSession::ByCredentials {
            email,
            password: SecretBox::new(Box::new(password)),
        })
        .await
        .map_err(AsError::into_error)?;

    let cookies = ctx
        .cookies()
        .clone()
        .add(session_cookie(&ctx.service().config().cookie, output.token));
    Ok((
        cookies,
        Json(SignedIn {
            success: true,
            message: "Signed in successfully",
            user: output.user.into(),
        }),
    ))
}

/// Signs out the current `User` by removing its session cookie.
///
/// The cookie is cleared even if the request didn't carry it.
#[tracing::instrument(skip_all, fields(http.route = "/api/logout"))]
pub async fn logout(ctx: Context) -> (CookieJar, Json<LoggedOut>) {
    let mut removal =
        Cookie::build((ctx.service().config().cookie.name.clone(), ""))
            .path("/")
            .build();
    removal.make_removal();
    (
        ctx.cookies().clone().add(removal),
        Json(LoggedOut {
            message: "Logged out successfully",
        }),
    )
}

/// Builds a cookie carrying the provided session [`session::Token`].
#[must_use]
pub fn session_cookie(
    config: &cookie::Config,
    token: session::Token,
) -> Cookie<'static> {
    Cookie::build((config.name.clone(), token.into_inner()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.secure)
        .max_age(
            time::Duration::try_from(cookie::Config::MAX_AGE)
                .unwrap_or(time::Duration::MAX),
        )
        .build()
}

impl AsError for create_user::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::EmailOccupied(_) => {
                Some(RegistrationError::EmailOccupied.into())
            }
            Self::Hashing(_) => None,
        }
    }
}

impl AsError for create_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Hashing(_)
            | Self::JsonWebTokenEncodeError(_)
            | Self::UserNotExists(_) => None,
            Self::WrongCredentials => Some(CredentialsError::Wrong.into()),
        }
    }
}

define_error! {
    enum CredentialsError {
        #[code = "CREDENTIALS_REQUIRED"]
        #[status = BAD_REQUEST]
        #[message = "Email and password required"]
        Required,

        #[code = "WRONG_CREDENTIALS"]
        #[status = UNAUTHORIZED]
        #[message = "Invalid email or password"]
        Wrong,
    }
}

define_error! {
    enum RegistrationError {
        #[code = "EMAIL_OCCUPIED"]
        #[status = CONFLICT]
        #[message = "User with this email already exists"]
        EmailOccupied,
    }
}
