//! [`Session`] definitions.

use std::time::Duration;

use common::{unit, DateTime, DateTimeOf};
use derive_more::{AsRef, Debug, From};
use serde::{Deserialize, Serialize};

use crate::domain::{user, User};

/// User session, carried as the claims of a signed [`Token`].
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Session {
    /// ID of the [`User`] this [`Session`] belongs to.
    #[serde(rename = "id")]
    pub user_id: user::Id,

    /// [`user::Email`] of the [`User`] this [`Session`] belongs to.
    pub email: user::Email,

    /// [`DateTime`] when this [`Session`] was issued.
    #[serde(rename = "iat", with = "common::datetime::serde::unix_timestamp")]
    pub issued_at: IssueDateTime,

    /// [`DateTime`] before which this [`Session`] is not valid yet.
    #[serde(rename = "nbf", with = "common::datetime::serde::unix_timestamp")]
    pub not_before: ActivationDateTime,

    /// [`DateTime`] when this [`Session`] expires.
    #[serde(rename = "exp", with = "common::datetime::serde::unix_timestamp")]
    pub expires_at: ExpirationDateTime,
}

impl Session {
    /// [`Duration`] a [`Session`] stays valid for.
    pub const LIFETIME: Duration = Duration::from_secs(7 * 24 * 60 * 60);

    /// Creates a new [`Session`] of the provided [`Identity`] issued at the
    /// provided [`DateTime`].
    ///
    /// Sub-second precision is dropped, as [`Token`]s carry whole seconds.
    #[must_use]
    pub fn new(identity: Identity, now: DateTime) -> Self {
        let Identity { id, email } = identity;
        let issued_at = now.truncate_to_seconds();

        Self {
            user_id: id,
            email,
            issued_at: issued_at.coerce(),
            not_before: issued_at.coerce(),
            expires_at: (issued_at + Self::LIFETIME).coerce(),
        }
    }

    /// Returns the [`Identity`] authenticated by this [`Session`].
    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.user_id,
            email: self.email.clone(),
        }
    }
}

/// Authenticated identity of a [`User`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Identity {
    /// ID of the [`User`].
    pub id: user::Id,

    /// [`user::Email`] of the [`User`].
    pub email: user::Email,
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
        }
    }
}

/// Signed representation of a [`Session`].
///
/// Nothing is guaranteed about its contents until it's verified.
#[derive(AsRef, Clone, Debug, From)]
#[as_ref(str)]
pub struct Token(#[debug(skip)] String);

impl Token {
    /// Consumes this [`Token`] returning its string representation.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

/// [`DateTime`] when a [`Session`] was issued.
pub type IssueDateTime = DateTimeOf<(Session, unit::Creation)>;

/// [`DateTime`] when a [`Session`] becomes valid.
pub type ActivationDateTime = DateTimeOf<(Session, unit::Activation)>;

/// [`DateTime`] of a [`Session`] expiration.
pub type ExpirationDateTime = DateTimeOf<(Session, unit::Expiration)>;
