//! [`Context`]-related definitions.

use axum::{async_trait, extract::FromRequestParts};
use axum_extra::extract::{cookie::Cookie, CookieJar};
use service::{
    auth::cookie,
    command::{self, authorize_user_session, Command as _},
    domain::User,
};
use tokio::sync::OnceCell;
use tracing as log;

use crate::{define_error, AsError, Error, Service};

/// Request context of API handlers.
#[derive(Debug)]
pub struct Context {
    /// [`Service`] instance.
    service: Service,

    /// Cookies sent with the request.
    cookies: CookieJar,

    /// [`User`] authorized by the request session, once resolved.
    current_user: OnceCell<User>,
}

impl Context {
    /// Returns [`Service`] instance of this [`Context`].
    #[must_use]
    pub fn service(&self) -> &Service {
        &self.service
    }

    /// Returns cookies sent with the request.
    #[must_use]
    pub fn cookies(&self) -> &CookieJar {
        &self.cookies
    }

    /// Returns the [`User`] authorized by the session cookie of the request.
    ///
    /// # Errors
    ///
    /// With [`AuthError::Unauthorized`] if the request carries no valid
    /// session, or its [`User`] no longer exists.
    pub async fn current_user(&self) -> Result<&User, Error> {
        self.current_user
            .get_or_try_init(|| async {
                self.service
                    .execute(command::AuthorizeUserSession {
                        cookies: Cookies(&self.cookies),
                    })
                    .await
                    .map_err(AsError::into_error)
            })
            .await
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Context
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _: &S,
    ) -> Result<Self, Self::Rejection> {
        let service = parts
            .extensions
            .get::<Service>()
            .cloned()
            .ok_or_else(|| Error::internal(&"missing `Service` extension"))?;

        Ok(Self {
            service,
            cookies: CookieJar::from_headers(&parts.headers),
            current_user: OnceCell::new(),
        })
    }
}

/// [`CookieJar`] readable by the [`Service`].
#[derive(Clone, Copy, Debug)]
pub struct Cookies<'j>(pub &'j CookieJar);

impl cookie::Jar for Cookies<'_> {
    fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(Cookie::value)
    }
}

impl AsError for authorize_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::MissingToken => Some(AuthError::Unauthorized.into()),
            Self::Token(e) => {
                log::debug!(kind = e.kind(), "rejected session token: {e}");
                Some(AuthError::Unauthorized.into())
            }
            Self::UserNotExists(id) => {
                log::debug!("session of a removed `User(id: {id})`");
                Some(AuthError::Unauthorized.into())
            }
        }
    }
}

define_error! {
    enum AuthError {
        #[code = "UNAUTHORIZED"]
        #[status = UNAUTHORIZED]
        #[message = "Unauthorized"]
        Unauthorized,
    }
}
