//! [`User`] definitions.

pub mod session;

use std::sync::LazyLock;

use argon2::Argon2;
#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{AsRef, Debug, Display, From, FromStr, Into};
use password_hash::{
    rand_core::OsRng, PasswordHash as Phc, PasswordHasher as _,
    PasswordVerifier as _, SaltString,
};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;
use secrecy::{zeroize::Zeroize, CloneableSecret};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use self::session::Session;

/// Platform user.
#[derive(Clone, Debug)]
pub struct User {
    /// ID of this [`User`].
    pub id: Id,

    /// [`Email`] of this [`User`], used as its login.
    pub email: Email,

    /// [`PasswordHash`] of this [`User`].
    pub password_hash: PasswordHash,

    /// First [`Name`] of this [`User`].
    pub first_name: Option<Name>,

    /// Last [`Name`] of this [`User`].
    pub last_name: Option<Name>,

    /// [`DateTime`] when this [`User`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`User`] was modified the last time.
    pub updated_at: ModificationDateTime,
}

/// ID of a [`User`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Name (either first or last) of a [`User`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Name(String);

impl Name {
    /// Creates a new [`Name`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        Self::check(&name).then_some(Self(name))
    }

    /// Checks whether the given `name` is a valid [`Name`].
    fn check(name: impl AsRef<str>) -> bool {
        let name = name.as_ref();
        name.trim() == name && !name.is_empty() && name.len() <= 512
    }
}

impl FromStr for Name {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Name`")
    }
}

/// Password of a [`User`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Password(#[debug(skip)] String);

impl Password {
    /// Creates a new [`Password`] if the given `password` is valid.
    #[must_use]
    pub fn new(password: impl Into<String>) -> Option<Self> {
        let password = password.into();
        Self::check(&password).then_some(Self(password))
    }

    /// Checks whether the given `password` is a valid [`Password`].
    fn check(password: impl AsRef<str>) -> bool {
        let password = password.as_ref();
        !password.is_empty() && password.len() <= 128
    }
}

impl FromStr for Password {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Password`")
    }
}

impl CloneableSecret for Password {}
impl Zeroize for Password {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

/// Salted [Argon2id] hash of a [`User`]'s [`Password`] in a [PHC] format.
///
/// [Argon2id]: https://en.wikipedia.org/wiki/Argon2
/// [PHC]: https://github.com/P-H-C/phc-string-format/blob/master/phc-sf-spec.md
#[derive(Clone, Debug, Display, Eq, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Creates a new [`PasswordHash`] from the given [`Password`] using a
    /// freshly generated salt.
    #[expect(clippy::missing_panics_doc, reason = "infallible")]
    #[must_use]
    pub fn new(password: &Password) -> Self {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.0.as_bytes(), &salt)
            .expect("infallible for a bounded `Password`");
        Self(hash.to_string())
    }

    /// Returns a [`PasswordHash`] matching no real [`User`].
    ///
    /// Verifying against it costs the same as verifying against a real one.
    #[must_use]
    pub fn dummy() -> &'static Self {
        /// Lazily computed dummy [`PasswordHash`].
        static DUMMY: LazyLock<PasswordHash> = LazyLock::new(|| {
            PasswordHash::new(&Password("correct horse battery".to_owned()))
        });

        &DUMMY
    }

    /// Checks whether the given [`Password`] matches this [`PasswordHash`].
    ///
    /// Malformed hashes never match.
    #[must_use]
    pub fn verify(&self, password: &Password) -> bool {
        Phc::new(&self.0).is_ok_and(|phc| {
            Argon2::default()
                .verify_password(password.0.as_bytes(), &phc)
                .is_ok()
        })
    }
}

/// Email address of a [`User`].
///
/// Always stored in lower case.
#[derive(
    AsRef, Clone, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize,
)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Email(String);

impl Email {
    /// Creates a new [`Email`] if the given `address` is valid.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Option<Self> {
        let address = address.into().to_lowercase();
        Self::check(&address).then_some(Self(address))
    }

    /// Checks whether the given `address` is a valid [`Email`].
    fn check(address: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Email`] format.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(
                "^([^\\x00-\\x20\\x22\\x28\\x29\\x2c\\x2e\\x3a-\
                     \\x3c\\x3e\\x40\\x5b-\\x5d\\x7f-\\xff]+\
                  |\\x22([^\\x0d\\x22\\x5c\\x80-\\xff]\
                  |\\x5c[\\x00-\\x7f])*\\x22)\
                  (\\x2e([^\\x00-\\x20\\x22\\x28\\x29\\x2c\\x2e\\x3a-\
                           \\x3c\\x3e\\x40\\x5b-\\x5d\\x7f-\\xff]+\
                        |\\x22([^\\x0d\\x22\\x5c\\x80-\\xff]\
                        |\\x5c[\\x00-\\x7f])*\\x22))*\\x40\
                  ([^\\x00-\\x20\\x22\\x28\\x29\\x2c\\x2e\\x3a-\
                     \\x3c\\x3e\\x40\\x5b-\\x5d\\x7f-\\xff]+\
                  |\\x5b([^\\x0d\\x5b-\\x5d\\x80-\\xff]\
                        |\\x5c[\\x00-\\x7f])*\\x5d)\
                  (\\x2e([^\\x00-\\x20\\x22\\x28\\x29\\x2c\\x2e\\x3a-\
                           \\x3c\\x3e\\x40\\x5b-\\x5d\\x7f-\\xff]+\
                        |\\x5b([^\\x0d\\x5b-\\x5d\\x80-\\xff]\
                        |\\x5c[\\x00-\\x7f])*\\x5d))*$",
            )
            .expect("valid regex")
        });

        REGEX.is_match(address.as_ref())
    }
}

impl FromStr for Email {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Email`")
    }
}

/// [`DateTime`] when a [`User`] was created.
pub type CreationDateTime = DateTimeOf<(User, unit::Creation)>;

/// [`DateTime`] when a [`User`] was modified.
pub type ModificationDateTime = DateTimeOf<(User, unit::Modification)>;

#[cfg(test)]
mod spec {
    use super::{Email, Name, Password, PasswordHash};

    fn password(s: &str) -> Password {
        Password::new(s).unwrap()
    }

    #[test]
    fn hash_verifies_original_password() {
        let pass = password("s3cr3t-passw0rd");

        assert!(PasswordHash::new(&pass).verify(&pass));
    }

    #[test]
    fn hash_is_salted() {
        let pass = password("s3cr3t-passw0rd");

        let first = PasswordHash::new(&pass);
        let second = PasswordHash::new(&pass);

        assert_ne!(first, second);
        assert!(first.verify(&pass));
        assert!(second.verify(&pass));
    }

    #[test]
    fn hash_rejects_other_passwords() {
        let hash = PasswordHash::new(&password("s3cr3t-passw0rd"));

        assert!(!hash.verify(&password("s3cr3t-passw0rd ")));
        assert!(!hash.verify(&password("S3cr3t-passw0rd")));
        assert!(!hash.verify(&password("x")));
    }

    #[test]
    fn malformed_hash_never_matches() {
        let pass = password("s3cr3t-passw0rd");

        assert!(!PasswordHash(String::new()).verify(&pass));
        assert!(!PasswordHash("s3cr3t-passw0rd".to_owned()).verify(&pass));
        assert!(!PasswordHash("$argon2id$v=19$garbage".to_owned())
            .verify(&pass));
    }

    #[test]
    fn dummy_hash_matches_nothing_supplied() {
        assert!(!PasswordHash::dummy().verify(&password("password")));
        assert!(!PasswordHash::dummy().verify(&password("correct horse")));
    }

    #[test]
    fn password_bounds() {
        assert!(Password::new("").is_none());
        assert!(Password::new("a").is_some());
        assert!(Password::new("a".repeat(128)).is_some());
        assert!(Password::new("a".repeat(129)).is_none());
    }

    #[test]
    fn email_is_lowercased_and_validated() {
        let email = Email::new("User@Email.COM").unwrap();
        assert_eq!(AsRef::<str>::as_ref(&email), "user@email.com");
        assert!(Email::new("not an email").is_none());
        assert!(Email::new("").is_none());
    }

    #[test]
    fn name_rejects_surrounding_whitespace() {
        assert!(Name::new("Jane").is_some());
        assert!(Name::new(" Jane").is_none());
        assert!(Name::new("").is_none());
    }
}
