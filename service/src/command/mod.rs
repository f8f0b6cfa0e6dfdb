//! [`Command`] definition.

pub mod authorize_user_session;
pub mod create_user;
pub mod create_user_session;
pub mod update_user_profile;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    authorize_user_session::AuthorizeUserSession, create_user::CreateUser,
    create_user_session::CreateUserSession,
    update_user_profile::UpdateUserProfile,
};

#[cfg(test)]
pub(crate) mod test {
    //! Helpers for [`Command`] tests.

    use secrecy::{SecretBox, SecretString};

    use crate::{
        auth,
        domain::{user, User},
        infra::Memory,
        Config, Service,
    };

    use super::{Command as _, CreateUser};

    /// Name of the session cookie in tests.
    pub(crate) const COOKIE: &str = "token";

    /// Creates a new [`Service`] backed by an empty [`Memory`] database.
    pub(crate) fn service() -> Service<Memory> {
        Service::new(
            Config {
                jwt_secret: SecretString::from("test secret".to_owned()),
                cookie: auth::cookie::Config {
                    name: COOKIE.to_owned(),
                    secure: false,
                },
                routes: auth::gate::Routes::default(),
            },
            Memory::new(),
        )
        .unwrap()
    }

    /// Creates a [`SecretBox`]ed [`user::Password`].
    pub(crate) fn password(s: &str) -> SecretBox<user::Password> {
        SecretBox::new(Box::new(user::Password::new(s).unwrap()))
    }

    /// Registers a new [`User`] with the provided credentials.
    pub(crate) async fn register(
        svc: &Service<Memory>,
        email: &str,
        pass: &str,
    ) -> User {
        svc.execute(CreateUser {
            email: user::Email::new(email).unwrap(),
            password: password(pass),
            first_name: None,
            last_name: None,
        })
        .await
        .unwrap()
    }
}
