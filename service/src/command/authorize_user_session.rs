//! [`Command`] for authorizing a [`User`].

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::user::Session;
use crate::{
    auth::{cookie, token},
    domain::{
        user::{self, session},
        User,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for authorizing a [`User`] by the [`Session`] cookie of a
/// request.
#[derive(Clone, Copy, Debug)]
pub struct AuthorizeUserSession<J> {
    /// [`cookie::Jar`] of the request to authorize.
    pub cookies: J,
}

impl<Db, J> Command<AuthorizeUserSession<J>> for Service<Db>
where
    Db: Database<
        Select<By<Option<User>, user::Id>>,
        Ok = Option<User>,
        Err = Traced<database::Error>,
    >,
    J: cookie::Jar,
{
    type Ok = User;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AuthorizeUserSession<J>,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AuthorizeUserSession { cookies } = cmd;

        let token = cookies
            .get(&self.config().cookie.name)
            .filter(|t| !t.is_empty())
            .map(|t| session::Token::from(t.to_owned()))
            .ok_or(E::MissingToken)
            .map_err(tracerr::wrap!())?;

        let identity = self
            .codec()
            .verify(&token)
            .map_err(tracerr::from_and_wrap!(=> E))?;

        self.database()
            .execute(Select::by(identity.id))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(identity.id))
            .map_err(tracerr::wrap!())
    }
}

/// Error of [`AuthorizeUserSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Request carries no [`session::Token`].
    #[display("No session token provided")]
    MissingToken,

    /// [`session::Token`] failed verification.
    #[display("Session token is rejected: {_0}")]
    Token(token::VerificationError),

    /// [`User`] the [`Session`] belongs to does not exist.
    #[display("`User(id: {_0})` does not exist")]
    #[from(ignore)]
    UserNotExists(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use std::collections::HashMap;

    use crate::{
        auth::token::VerificationError,
        command::test::{register, service, COOKIE},
        domain::user::{self, session::Identity},
        Command as _,
    };

    use super::{AuthorizeUserSession, ExecutionError};

    fn cookies(token: &str) -> HashMap<String, String> {
        HashMap::from([(COOKIE.to_owned(), token.to_owned())])
    }

    #[tokio::test]
    async fn resolves_user() {
        let svc = service();
        let user = register(&svc, "jane@email.com", "s3cr3t-passw0rd").await;
        let (token, _) = svc.codec().issue((&user).into()).unwrap();

        let resolved = svc
            .execute(AuthorizeUserSession {
                cookies: cookies(token.as_ref()),
            })
            .await
            .unwrap();

        assert_eq!(resolved.id, user.id);
        assert_eq!(resolved.email, user.email);
    }

    #[tokio::test]
    async fn requires_token() {
        let svc = service();

        for jar in [HashMap::new(), cookies("")] {
            let err = svc
                .execute(AuthorizeUserSession { cookies: jar })
                .await
                .unwrap_err();

            assert!(matches!(err.as_ref(), ExecutionError::MissingToken));
        }
    }

    #[tokio::test]
    async fn rejects_invalid_token() {
        let svc = service();

        let err = svc
            .execute(AuthorizeUserSession {
                cookies: cookies("garbage"),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::Token(VerificationError::InvalidToken(_)),
        ));
    }

    #[tokio::test]
    async fn rejects_token_of_unknown_user() {
        let svc = service();
        let id = user::Id::new();
        let (token, _) = svc
            .codec()
            .issue(Identity {
                id,
                email: user::Email::new("ghost@email.com").unwrap(),
            })
            .unwrap();

        let err = svc
            .execute(AuthorizeUserSession {
                cookies: cookies(token.as_ref()),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::UserNotExists(missing) if *missing == id,
        ));
    }
}
