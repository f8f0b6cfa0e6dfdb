//! [`Config`]-related definitions.

use std::{env, path::PathBuf};

use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use derive_more::{Debug, Display, Error};
use secrecy::SecretString;
use serde::Deserialize;
use service::auth::gate::Routes;
use smart_default::SmartDefault;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Application configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: Server,

    /// Service configuration.
    pub service: Service,

    /// Postgres configuration.
    pub postgres: Postgres,

    /// Log configuration.
    pub log: Log,
}

impl Config {
    /// Creates a new [`Config`] by:
    /// - loading it from the provided `path` (if any);
    /// - merging it with the `CONF.`-prefixed environment variables (if any);
    /// - overriding the session settings with the `JWT_SECRET` and
    ///   `COOKIE_NAME` environment variables (if any);
    /// - using default values for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ConfigError> {
        ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix("CONF").separator("."))
            .set_override_option(
                "service.jwt_secret",
                env::var("JWT_SECRET").ok(),
            )?
            .set_override_option(
                "service.cookie.name",
                env::var("COOKIE_NAME").ok(),
            )?
            .build()?
            .try_deserialize()
    }
}

/// Server configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Server {
    /// Host to bind the server to.
    #[default("0.0.0.0".to_owned())]
    pub host: String,

    /// Port to bind the server to.
    #[default(8080)]
    pub port: u16,

    /// Directory with the pages served behind the gate.
    #[default(PathBuf::from("public"))]
    pub pages: PathBuf,

    /// [CORS] configuration.
    ///
    /// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
    pub cors: Cors,
}

/// [CORS] configuration.
///
/// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Cors {
    /// List of allowed origins.
    #[default(vec!["*".to_owned()])]
    pub origins: Vec<String>,
}

impl Cors {
    /// Builds a [`CorsLayer`] allowing these [`Cors::origins`].
    ///
    /// A `*` origin allows any origin, but without credentials. Otherwise,
    /// only the listed origins are allowed, and may send cookies.
    ///
    /// # Errors
    ///
    /// With [`InvalidOrigin`] if any of the origins is not a valid header
    /// value.
    pub fn layer(&self) -> Result<CorsLayer, InvalidOrigin> {
        let cors = CorsLayer::new()
            .allow_methods([
                http::Method::GET,
                http::Method::OPTIONS,
                http::Method::POST,
                http::Method::PUT,
            ])
            .allow_headers([http::header::CONTENT_TYPE]);

        if self.origins.iter().any(|o| o == "*") {
            return Ok(cors.allow_origin(AllowOrigin::any()));
        }

        let origins = self
            .origins
            .iter()
            .map(|o| {
                o.parse::<http::HeaderValue>().map_err(|_| InvalidOrigin {
                    origin: o.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(cors
            .allow_origin(AllowOrigin::list(origins))
            .allow_credentials(true))
    }
}

/// Error of an unparsable [`Cors::origins`] entry.
#[derive(Clone, Debug, Display, Error)]
#[display("`{origin}` is not a valid CORS origin")]
pub struct InvalidOrigin {
    /// Rejected origin.
    #[error(not(source))]
    pub origin: String,
}

/// Service configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Service {
    /// Secret the session [JWT]s are signed with.
    ///
    /// Empty secret prevents the application from starting.
    ///
    /// [JWT]: https://wikipedia.org/wiki/JSON_Web_Token
    #[debug(skip)]
    pub jwt_secret: String,

    /// Session cookie configuration.
    pub cookie: Cookie,

    /// Routes the page gate classifies requests by and redirects to.
    pub routes: Routes,
}

impl From<Service> for service::Config {
    fn from(value: Service) -> Self {
        let Service {
            jwt_secret,
            cookie: Cookie { name, secure },
            routes,
        } = value;

        Self {
            jwt_secret: SecretString::from(jwt_secret),
            cookie: service::auth::cookie::Config { name, secure },
            routes,
        }
    }
}

/// Session cookie configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Cookie {
    /// Name of the session cookie.
    ///
    /// Empty name prevents the application from starting.
    pub name: String,

    /// Indicator whether the session cookie is sent over HTTPS only.
    #[default(true)]
    pub secure: bool,
}

/// Postgres configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Postgres {
    /// Host to connect to.
    #[default("127.0.0.1".to_owned())]
    pub host: String,

    /// Port to connect to.
    #[default(5432)]
    pub port: u16,

    /// User to connect as.
    #[default("postgres".to_owned())]
    pub user: String,

    /// Password to connect with.
    #[default("postgres".to_owned())]
    pub password: String,

    /// Database name to connect to.
    #[default("postgres".to_owned())]
    pub dbname: String,
}

impl From<Postgres> for service::infra::postgres::Config {
    fn from(value: Postgres) -> Self {
        let Postgres {
            host,
            port,
            user,
            password,
            dbname,
        } = value;

        Self {
            host: Some(host),
            port: Some(port),
            user: Some(user),
            password: Some(password),
            dbname: Some(dbname),
            ..Self::default()
        }
    }
}

/// Log configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Log {
    /// Log level.
    pub level: LogLevel,
}

/// Log level.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// Designates very low priority, often extremely verbose, information.
    Trace,

    /// Designates lower priority information.
    Debug,

    /// Designates useful information.
    #[default]
    Info,

    /// Designates hazardous situations.
    Warn,

    /// Designates very serious errors.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

#[cfg(test)]
mod spec {
    use axum::{body::Body, routing::get, Router};
    use tower::ServiceExt as _;

    use super::{Config, Cors};

    async fn cors_headers(
        cors: &Cors,
        origin: &str,
    ) -> (Option<String>, Option<String>) {
        let resp = Router::new()
            .route("/api/profile", get(|| async { "profile" }))
            .layer(cors.layer().unwrap())
            .oneshot(
                http::Request::get("/api/profile")
                    .header(http::header::ORIGIN, origin)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let header = |name: http::HeaderName| {
            resp.headers()
                .get(name)
                .map(|h: &http::HeaderValue| h.to_str().unwrap().to_owned())
        };
        (
            header(http::header::ACCESS_CONTROL_ALLOW_ORIGIN),
            header(http::header::ACCESS_CONTROL_ALLOW_CREDENTIALS),
        )
    }

    #[test]
    fn defaults_without_file() {
        let config = Config::new("surely-missing-config.toml").unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.pages.to_str(), Some("public"));
        assert!(config.service.cookie.secure);
        assert_eq!(config.service.routes.landing, "/home");
        assert_eq!(config.service.routes.sign_in, "/signin");
    }

    #[test]
    fn hides_secret_in_debug() {
        let mut config = Config::default();
        config.service.jwt_secret = "s3cr3t".to_owned();

        assert!(!format!("{config:?}").contains("s3cr3t"));
    }

    #[tokio::test]
    async fn allows_every_listed_origin_with_credentials() {
        let cors = Cors {
            origins: vec!["https://a.com".to_owned(), "https://b.com".to_owned()],
        };

        for origin in ["https://a.com", "https://b.com"] {
            let (allowed, credentials) = cors_headers(&cors, origin).await;

            assert_eq!(allowed.as_deref(), Some(origin));
            assert_eq!(credentials.as_deref(), Some("true"));
        }

        let (allowed, _) = cors_headers(&cors, "https://c.com").await;
        assert_eq!(allowed, None);
    }

    #[tokio::test]
    async fn allows_any_origin_without_credentials() {
        let (allowed, credentials) =
            cors_headers(&Cors::default(), "https://a.com").await;

        assert_eq!(allowed.as_deref(), Some("*"));
        assert_eq!(credentials, None);
    }

    #[test]
    fn rejects_invalid_origin() {
        let cors = Cors {
            origins: vec!["https://a.com\n".to_owned()],
        };

        assert_eq!(cors.layer().unwrap_err().origin, "https://a.com\n");
    }
}
