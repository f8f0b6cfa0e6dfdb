//! [`User`]-related definitions.

use serde::Serialize;
use service::domain::{self, user};

/// [`domain::User`] as exposed to API clients.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// ID of this [`User`].
    pub id: user::Id,

    /// Email address of this [`User`].
    pub email: user::Email,

    /// First name of this [`User`], if any.
    pub first_name: Option<String>,

    /// Last name of this [`User`], if any.
    pub last_name: Option<String>,

    /// [`DateTime`] when this [`User`] was created.
    ///
    /// [`DateTime`]: common::DateTime
    #[serde(with = "common::datetime::serde::rfc3339")]
    pub created_at: user::CreationDateTime,

    /// [`DateTime`] when this [`User`] was modified the last time.
    ///
    /// [`DateTime`]: common::DateTime
    #[serde(with = "common::datetime::serde::rfc3339")]
    pub updated_at: user::ModificationDateTime,
}

impl From<domain::User> for User {
    fn from(user: domain::User) -> Self {
        let domain::User {
            id,
            email,
            password_hash: _,
            first_name,
            last_name,
            created_at,
            updated_at,
        } = user;

        Self {
            id,
            email,
            first_name: first_name.map(|n| n.to_string()),
            last_name: last_name.map(|n| n.to_string()),
            created_at,
            updated_at,
        }
    }
}

#[cfg(test)]
mod spec {
    use common::DateTime;
    use serde_json::json;
    use service::domain::{self, user};

    use super::User;

    #[test]
    fn never_exposes_password_hash() {
        let at = DateTime::from_unix_timestamp(0).unwrap();
        let id = user::Id::new();
        let user = User::from(domain::User {
            id,
            email: user::Email::new("jane@email.com").unwrap(),
            password_hash: user::PasswordHash::new(
                &user::Password::new("s3cr3t-passw0rd").unwrap(),
            ),
            first_name: user::Name::new("Jane"),
            last_name: None,
            created_at: at.coerce(),
            updated_at: at.coerce(),
        });

        assert_eq!(
            serde_json::to_value(&user).unwrap(),
            json!({
                "id": id.to_string(),
                "email": "jane@email.com",
                "firstName": "Jane",
                "lastName": null,
                "createdAt": "1970-01-01T00:00:00Z",
                "updatedAt": "1970-01-01T00:00:00Z",
            }),
        );
    }
}
