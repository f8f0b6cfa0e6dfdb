//! [`Command`] for creating a [`Session`].

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret, SecretBox};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::user::{session::Token, Email, Password, Session};
use crate::{
    domain::{
        user::{self, session},
        User,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a [`Session`].
#[derive(Clone, Debug, From)]
pub enum CreateUserSession {
    /// Create a new [`Session`] by [`User`] credentials.
    ByCredentials {
        /// [`Email`] of a [`User`].
        email: user::Email,

        /// [`Password`] of a [`User`].
        password: SecretBox<user::Password>,
    },

    /// Create a new [`Session`] by [`User`] ID.
    ByUserId(user::Id),
}

/// Output of [`CreateUserSession`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// [`Token`] of the created [`Session`].
    pub token: session::Token,

    /// [`User`] whose [`Session`] has been created.
    pub user: User,

    /// [`DateTime`] when the [`Session`] expires.
    ///
    /// [`DateTime`]: common::DateTime
    pub expires_at: session::ExpirationDateTime,
}

impl<Db> Command<CreateUserSession> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + for<'l> Database<
            Select<By<Option<User>, &'l user::Email>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        use CreateUserSession as Cmd;
        use ExecutionError as E;

        let user = match cmd {
            Cmd::ByCredentials { email, password } => {
                let user = self
                    .database()
                    .execute(Select::by(&email))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?;

                // Unknown emails cost the same as wrong passwords.
                let hash = user.as_ref().map(|u| u.password_hash.clone());
                let matches = tokio::task::spawn_blocking(move || {
                    match &hash {
                        Some(h) => h,
                        None => user::PasswordHash::dummy(),
                    }
                    .verify(password.expose_secret())
                })
                .await
                .map_err(tracerr::from_and_wrap!(=> E))?;

                match user {
                    Some(user) if matches => user,
                    Some(_) | None => {
                        return Err(tracerr::new!(E::WrongCredentials));
                    }
                }
            }
            Cmd::ByUserId(user_id) => self
                .database()
                .execute(Select::by(user_id))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or_else(|| E::UserNotExists(user_id))
                .map_err(tracerr::wrap!())?,
        };

        let (token, session) = self
            .codec()
            .issue((&user).into())
            .map_err(tracerr::from_and_wrap!(=> E))?;

        Ok(Output {
            token,
            user,
            expires_at: session.expires_at,
        })
    }
}

/// Error of [`CreateUserSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`jsonwebtoken`] encoding error.
    #[display("Failed to encode a JSON Web Token: {_0}")]
    JsonWebTokenEncodeError(jsonwebtoken::errors::Error),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    #[from(ignore)]
    UserNotExists(#[error(not(source))] user::Id),

    /// [`user::Password`] verification task failed to complete.
    #[display("Password verification failed: {_0}")]
    Hashing(tokio::task::JoinError),

    /// [`CreateUserSession::ByCredentials`] contains wrong credentials.
    #[display("Wrong `User` credentials")]
    WrongCredentials,
}

#[cfg(test)]
mod spec {
    use crate::{
        command::test::{password, register, service},
        domain::user,
        Command as _,
    };

    use super::{CreateUserSession, ExecutionError};

    #[tokio::test]
    async fn signs_in_with_valid_credentials() {
        let svc = service();
        let user = register(&svc, "jane@email.com", "s3cr3t-passw0rd").await;

        let out = svc
            .execute(CreateUserSession::ByCredentials {
                email: user::Email::new("Jane@Email.com").unwrap(),
                password: password("s3cr3t-passw0rd"),
            })
            .await
            .unwrap();

        assert_eq!(out.user.id, user.id);
        let identity = svc.codec().verify(&out.token).unwrap();
        assert_eq!(identity.id, user.id);
        assert_eq!(identity.email, user.email);
    }

    #[tokio::test]
    async fn rejects_wrong_password_and_unknown_email_alike() {
        let svc = service();
        drop(register(&svc, "jane@email.com", "s3cr3t-passw0rd").await);

        let wrong_password = svc
            .execute(CreateUserSession::ByCredentials {
                email: user::Email::new("jane@email.com").unwrap(),
                password: password("s3cr3t-passw0rd!"),
            })
            .await
            .unwrap_err();
        let unknown_email = svc
            .execute(CreateUserSession::ByCredentials {
                email: user::Email::new("john@email.com").unwrap(),
                password: password("s3cr3t-passw0rd"),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            wrong_password.as_ref(),
            ExecutionError::WrongCredentials,
        ));
        assert!(matches!(
            unknown_email.as_ref(),
            ExecutionError::WrongCredentials,
        ));
        assert_eq!(
            wrong_password.as_ref().to_string(),
            unknown_email.as_ref().to_string(),
        );
    }

    #[tokio::test]
    async fn signs_in_by_user_id() {
        let svc = service();
        let user = register(&svc, "jane@email.com", "s3cr3t-passw0rd").await;

        let out = svc
            .execute(CreateUserSession::ByUserId(user.id))
            .await
            .unwrap();
        assert_eq!(out.user.id, user.id);

        let err = svc
            .execute(CreateUserSession::ByUserId(user::Id::new()))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::UserNotExists(_)));
    }

    #[tokio::test]
    async fn verifies_without_blocking_other_tasks() {
        let svc = service();
        let user = register(&svc, "jane@email.com", "s3cr3t-passw0rd").await;

        let mut signing_in =
            std::pin::pin!(svc.execute(CreateUserSession::ByCredentials {
                email: user::Email::new("jane@email.com").unwrap(),
                password: password("s3cr3t-passw0rd"),
            }));
        let mut ticks = 0_usize;
        let out = loop {
            tokio::select! {
                biased;
                res = &mut signing_in => break res.unwrap(),
                () = tokio::task::yield_now() => ticks += 1,
            }
        };

        assert!(ticks > 0, "verification blocked the runtime thread");
        assert_eq!(out.user.id, user.id);
    }
}
