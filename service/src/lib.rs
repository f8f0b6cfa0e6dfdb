//! Service contains the business logic of the application.
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod auth;
pub mod command;
pub mod domain;
pub mod infra;

use std::sync::Arc;

use derive_more::{Debug, Display, Error, From};
use secrecy::SecretString;

#[cfg(doc)]
use infra::Database;

pub use self::command::Command;

/// [`Service`] configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Secret the session [JWT]s are signed with.
    ///
    /// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
    #[debug(skip)]
    pub jwt_secret: SecretString,

    /// Session [`auth::cookie::Config`].
    pub cookie: auth::cookie::Config,

    /// [`auth::gate::Routes`] the [`auth::Gate`] operates on.
    pub routes: auth::gate::Routes,
}

/// Domain service.
#[derive(Clone, Debug)]
pub struct Service<Db> {
    /// Configuration of this [`Service`].
    config: Arc<Config>,

    /// [`auth::Codec`] of this [`Service`] sessions.
    codec: auth::Codec,

    /// [`Database`] of this [`Service`].
    database: Db,
}

impl<Db> Service<Db> {
    /// Creates a new [`Service`] with the provided parameters.
    ///
    /// # Errors
    ///
    /// If the provided [`Config`] is unusable. See [`StartupError`] for
    /// details.
    pub fn new(config: Config, database: Db) -> Result<Self, StartupError> {
        let codec = auth::Codec::new(&config.jwt_secret)?;
        if config.cookie.name.trim().is_empty() {
            return Err(StartupError::MisconfiguredCookie);
        }

        Ok(Self {
            config: Arc::new(config),
            codec,
            database,
        })
    }

    /// Returns [`Config`] of this [`Service`].
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns [`auth::Codec`] of this [`Service`].
    #[must_use]
    pub fn codec(&self) -> &auth::Codec {
        &self.codec
    }

    /// Returns [`auth::Gate`] guarding pages of this [`Service`].
    #[must_use]
    pub fn gate(&self) -> auth::Gate<'_> {
        auth::Gate::new(&self.codec, &self.config.cookie, &self.config.routes)
    }

    /// Returns [`Database`] of this [`Service`].
    #[must_use]
    pub fn database(&self) -> &Db {
        &self.database
    }
}

/// Error of starting a [`Service`].
#[derive(Clone, Copy, Debug, Display, Error, From)]
pub enum StartupError {
    /// Session signing secret is not configured.
    #[display("{_0}")]
    MisconfiguredSecret(auth::token::MisconfiguredSecret),

    /// Session cookie name is not configured.
    #[display("Session cookie name must not be empty")]
    #[from(ignore)]
    MisconfiguredCookie,
}

#[cfg(test)]
mod spec {
    use secrecy::SecretString;

    use super::{auth, Config, Service, StartupError};
    use crate::infra::Memory;

    fn config(secret: &str, cookie: &str) -> Config {
        Config {
            jwt_secret: SecretString::from(secret.to_owned()),
            cookie: auth::cookie::Config {
                name: cookie.to_owned(),
                secure: false,
            },
            routes: auth::gate::Routes::default(),
        }
    }

    #[test]
    fn refuses_to_start_misconfigured() {
        assert!(matches!(
            Service::new(config("", "token"), Memory::new()),
            Err(StartupError::MisconfiguredSecret(_)),
        ));
        assert!(matches!(
            Service::new(config("secret", " "), Memory::new()),
            Err(StartupError::MisconfiguredCookie),
        ));
        assert!(Service::new(config("secret", "token"), Memory::new()).is_ok());
    }
}
