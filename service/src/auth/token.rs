//! [`Codec`] issuing and verifying [`Token`]s.

use common::DateTime;
use derive_more::{Debug, Display, Error, From};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret as _, SecretString};

use crate::domain::user::session::{
    ActivationDateTime, ExpirationDateTime, Identity, Session, Token,
};

/// [JWT] codec of [`Session`] [`Token`]s.
///
/// Only [`Codec::ALGORITHM`] is accepted on verification, so [`Token`]s
/// declaring any other algorithm are rejected regardless of their signature.
///
/// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
#[derive(Clone, Debug)]
pub struct Codec {
    /// [JWT] encoding key.
    ///
    /// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
    #[debug(skip)]
    encoding_key: EncodingKey,

    /// [JWT] decoding key.
    ///
    /// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
    #[debug(skip)]
    decoding_key: DecodingKey,

    /// [`Validation`] rules applied to decoded [`Token`]s.
    validation: Validation,
}

impl Codec {
    /// The only [`Algorithm`] [`Token`]s are signed and verified with.
    pub const ALGORITHM: Algorithm = Algorithm::HS256;

    /// Creates a new [`Codec`] signing with the provided symmetric `secret`.
    ///
    /// # Errors
    ///
    /// With [`MisconfiguredSecret`] if the `secret` is empty.
    pub fn new(secret: &SecretString) -> Result<Self, MisconfiguredSecret> {
        let secret = secret.expose_secret();
        if secret.trim().is_empty() {
            return Err(MisconfiguredSecret);
        }

        // Time bounds are checked by `Codec::verify_at()` to distinguish
        // between `Expired` and `NotYetValid` tokens.
        let mut validation = Validation::new(Self::ALGORITHM);
        validation.leeway = 0;
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.required_spec_claims =
            ["exp", "nbf"].into_iter().map(ToOwned::to_owned).collect();

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// Issues a new [`Token`] for the provided [`Identity`], valid from now
    /// for the [`Session::LIFETIME`].
    ///
    /// # Errors
    ///
    /// If [`jsonwebtoken`] fails to encode the [`Session`].
    pub fn issue(
        &self,
        identity: Identity,
    ) -> Result<(Token, Session), jsonwebtoken::errors::Error> {
        self.issue_at(identity, DateTime::now())
    }

    /// Issues a new [`Token`] for the provided [`Identity`] as if it was
    /// issued at the provided [`DateTime`].
    ///
    /// # Errors
    ///
    /// If [`jsonwebtoken`] fails to encode the [`Session`].
    pub fn issue_at(
        &self,
        identity: Identity,
        now: DateTime,
    ) -> Result<(Token, Session), jsonwebtoken::errors::Error> {
        let session = Session::new(identity, now);
        let token = jsonwebtoken::encode(
            &Header::new(Self::ALGORITHM),
            &session,
            &self.encoding_key,
        )?;
        Ok((token.into(), session))
    }

    /// Verifies the provided [`Token`] returning the [`Identity`] it
    /// authenticates.
    ///
    /// # Errors
    ///
    /// See [`VerificationError`] for details.
    pub fn verify(&self, token: &Token) -> Result<Identity, VerificationError> {
        self.verify_at(token, DateTime::now())
    }

    /// Verifies the provided [`Token`] against the provided [`DateTime`]
    /// returning the [`Identity`] it authenticates.
    ///
    /// # Errors
    ///
    /// See [`VerificationError`] for details.
    pub fn verify_at(
        &self,
        token: &Token,
        now: DateTime,
    ) -> Result<Identity, VerificationError> {
        use VerificationError as E;

        let session = jsonwebtoken::decode::<Session>(
            token.as_ref(),
            &self.decoding_key,
            &self.validation,
        )?
        .claims;

        if now >= session.expires_at.coerce() {
            return Err(E::Expired(session.expires_at));
        }
        if now < session.not_before.coerce() {
            return Err(E::NotYetValid(session.not_before));
        }

        Ok(session.identity())
    }
}

/// Error of a [`Codec`] being configured with an empty secret.
#[derive(Clone, Copy, Debug, Display, Error)]
#[display("JWT secret must not be empty")]
pub struct MisconfiguredSecret;

/// Error of verifying a [`Token`].
#[derive(Debug, Display, Error, From)]
pub enum VerificationError {
    /// [`Token`] is malformed, has a wrong signature or algorithm.
    #[display("Invalid token: {_0}")]
    InvalidToken(jsonwebtoken::errors::Error),

    /// [`Token`] has expired.
    #[display("Token expired at {}", _0.to_rfc3339())]
    #[from(ignore)]
    Expired(#[error(not(source))] ExpirationDateTime),

    /// [`Token`] is not valid yet.
    #[display("Token is not valid before {}", _0.to_rfc3339())]
    #[from(ignore)]
    NotYetValid(#[error(not(source))] ActivationDateTime),
}

impl VerificationError {
    /// Returns a short machine-readable name of this [`VerificationError`]
    /// kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidToken(_) => "invalid",
            Self::Expired(_) => "expired",
            Self::NotYetValid(_) => "not_yet_valid",
        }
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::DateTime;
    use jsonwebtoken::{Algorithm, EncodingKey, Header};
    use secrecy::SecretString;

    use super::{Codec, VerificationError};
    use crate::domain::user::{
        self,
        session::{Identity, Session, Token},
    };

    fn codec(secret: &str) -> Codec {
        Codec::new(&SecretString::from(secret.to_owned())).unwrap()
    }

    fn identity() -> Identity {
        Identity {
            id: user::Id::new(),
            email: user::Email::new("user@email.com").unwrap(),
        }
    }

    #[test]
    fn rejects_empty_secret() {
        assert!(Codec::new(&SecretString::from(String::new())).is_err());
        assert!(Codec::new(&SecretString::from("   ".to_owned())).is_err());
    }

    #[test]
    fn round_trips_identity() {
        let codec = codec("secret");
        let identity = identity();

        let (token, _) = codec.issue(identity.clone()).unwrap();

        assert_eq!(codec.verify(&token).unwrap(), identity);
    }

    #[test]
    fn accepts_until_expiration() {
        let codec = codec("secret");
        let issued = DateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let (token, session) = codec.issue_at(identity(), issued).unwrap();

        let last_moment =
            session.expires_at.coerce::<()>() - Duration::from_secs(1);
        assert!(codec.verify_at(&token, last_moment).is_ok());
        assert!(matches!(
            codec.verify_at(&token, session.expires_at.coerce()),
            Err(VerificationError::Expired(_)),
        ));
    }

    #[test]
    fn rejects_expired() {
        let codec = codec("secret");
        let issued =
            DateTime::now() - Session::LIFETIME - Duration::from_secs(1);
        let (token, _) = codec.issue_at(identity(), issued).unwrap();

        assert!(matches!(
            codec.verify(&token),
            Err(VerificationError::Expired(_)),
        ));
    }

    #[test]
    fn rejects_not_yet_valid() {
        let codec = codec("secret");
        let issued = DateTime::now() + Duration::from_secs(60 * 60);
        let (token, _) = codec.issue_at(identity(), issued).unwrap();

        assert!(matches!(
            codec.verify(&token),
            Err(VerificationError::NotYetValid(_)),
        ));
    }

    #[test]
    fn rejects_other_secret() {
        let (token, _) = codec("secret").issue(identity()).unwrap();

        assert!(matches!(
            codec("another secret").verify(&token),
            Err(VerificationError::InvalidToken(_)),
        ));
    }

    #[test]
    fn rejects_other_algorithm() {
        let session = Session::new(identity(), DateTime::now());
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS512),
            &session,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        assert!(matches!(
            codec("secret").verify(&Token::from(token)),
            Err(VerificationError::InvalidToken(_)),
        ));
    }

    #[test]
    fn rejects_garbage() {
        let codec = codec("secret");

        for token in ["", "garbage", "a.b.c"] {
            assert!(matches!(
                codec.verify(&Token::from(token.to_owned())),
                Err(VerificationError::InvalidToken(_)),
            ));
        }
    }

    #[test]
    fn rejects_tampered_payload() {
        let codec = codec("secret");
        let (token, _) = codec.issue(identity()).unwrap();
        let (other, _) = codec.issue(identity()).unwrap();

        let mut parts = token.as_ref().split('.').collect::<Vec<_>>();
        let other_parts = other.as_ref().split('.').collect::<Vec<_>>();
        parts[1] = other_parts[1];

        assert!(matches!(
            codec.verify(&Token::from(parts.join("."))),
            Err(VerificationError::InvalidToken(_)),
        ));
    }
}
