//! In-memory [`Database`] implementation.

use std::{collections::HashMap, sync::Arc};

use common::operations::{By, Commit, Insert, Select, Transact, Update};
use derive_more::{Display, Error as StdError};
use tokio::sync::RwLock;
use tracerr::Traced;

#[cfg(doc)]
use crate::infra::Database;
use crate::{
    domain::{user, User},
    infra::database,
};

/// In-memory [`Database`] keeping [`User`]s in a shared map.
///
/// [`Transact`]ions are not isolated: every operation is applied immediately
/// and [`Commit`] is a no-op.
#[derive(Clone, Debug, Default)]
pub struct Memory {
    /// Stored [`User`]s.
    users: Arc<RwLock<HashMap<user::Id, User>>>,
}

impl Memory {
    /// Creates a new empty [`Memory`] database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// [`Memory`] database [`Error`].
///
/// [`Error`]: enum@Error
#[derive(Clone, Copy, Debug, Display, StdError)]
pub enum Error {
    /// Unique constraint is violated.
    #[display("Unique constraint `{constraint}` is violated")]
    UniqueViolation {
        /// Name of the violated constraint.
        #[error(not(source))]
        constraint: &'static str,
    },
}

impl Error {
    /// Checks if the error is a unique violation of the specified constraint.
    #[must_use]
    pub fn is_unique_violation(&self, constraint: Option<&str>) -> bool {
        match self {
            Self::UniqueViolation { constraint: c } => {
                constraint.map_or(true, |constraint| *c == constraint)
            }
        }
    }
}

impl database::Database<Transact> for Memory {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(self.clone())
    }
}

impl database::Database<Commit> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl database::Database<Select<By<Option<User>, user::Id>>> for Memory {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.users.read().await.get(&by.into_inner()).cloned())
    }
}

impl<'l> database::Database<Select<By<Option<User>, &'l user::Email>>>
    for Memory
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, &'l user::Email>>,
    ) -> Result<Self::Ok, Self::Err> {
        let email = by.into_inner();
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| &u.email == email)
            .cloned())
    }
}

impl database::Database<Insert<User>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(user): Insert<User>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.id) {
            return Err(tracerr::new!(database::Error::from(
                Error::UniqueViolation {
                    constraint: "users_pkey",
                }
            )));
        }
        if users.values().any(|u| u.email == user.email) {
            return Err(tracerr::new!(database::Error::from(
                Error::UniqueViolation {
                    constraint: "users_email_key",
                }
            )));
        }
        drop(users.insert(user.id, user));
        Ok(())
    }
}

impl database::Database<Update<User>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(user): Update<User>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.id != user.id && u.email == user.email) {
            return Err(tracerr::new!(database::Error::from(
                Error::UniqueViolation {
                    constraint: "users_email_key",
                }
            )));
        }
        drop(users.insert(user.id, user));
        Ok(())
    }
}
