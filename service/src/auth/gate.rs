//! Per-request [`Gate`] deciding whether a page may be served.

use common::DateTime;
use serde::Deserialize;
use smart_default::SmartDefault;
use tracing as log;

use crate::domain::user::session::Token;

use super::{cookie, token::Codec};

/// Routes the [`Gate`] classifies requests by and redirects to.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Routes {
    /// Paths served to unauthenticated users only.
    #[default(vec!["/signin".to_owned(), "/register".to_owned()])]
    pub public: Vec<String>,

    /// Path authenticated users land on.
    #[default("/home".to_owned())]
    pub landing: String,

    /// Path of the sign-in page.
    #[default("/signin".to_owned())]
    pub sign_in: String,
}

/// Class of a request path.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PathClass {
    /// The root path `/`.
    Root,

    /// One of the [`Routes::public`] paths.
    Public,

    /// Any other path.
    Protected,
}

impl PathClass {
    /// Classifies the provided `path` according to the provided [`Routes`].
    #[must_use]
    pub fn of(path: &str, routes: &Routes) -> Self {
        if path == "/" {
            Self::Root
        } else if routes.public.iter().any(|p| p == path) {
            Self::Public
        } else {
            Self::Protected
        }
    }
}

/// State of the session presented by a request.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SessionState {
    /// No session cookie.
    Absent,

    /// Session cookie holding a token failing verification.
    Invalid,

    /// Session cookie holding a valid token.
    Valid,
}

/// Outcome of a [`Gate`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Decision<'r> {
    /// Serve the request.
    Allow,

    /// Redirect the request to the provided path.
    Redirect(&'r str),
}

/// Decides on a request of the provided [`PathClass`] presenting a session in
/// the provided [`SessionState`].
#[must_use]
pub fn decide(
    class: PathClass,
    session: SessionState,
    routes: &Routes,
) -> Decision<'_> {
    use Decision as D;
    use PathClass as P;
    use SessionState as S;

    match (class, session) {
        (P::Root | P::Public, S::Valid) => D::Redirect(&routes.landing),
        (P::Root | P::Protected, S::Absent | S::Invalid) => {
            D::Redirect(&routes.sign_in)
        }
        (P::Public, S::Absent | S::Invalid) | (P::Protected, S::Valid) => {
            D::Allow
        }
    }
}

/// Gate guarding page requests by their session cookie.
#[derive(Clone, Copy, Debug)]
pub struct Gate<'c> {
    /// [`Codec`] verifying session tokens.
    codec: &'c Codec,

    /// Session [`cookie::Config`].
    cookie: &'c cookie::Config,

    /// [`Routes`] to classify requests by.
    routes: &'c Routes,
}

impl<'c> Gate<'c> {
    /// Creates a new [`Gate`] out of the provided configuration.
    #[must_use]
    pub const fn new(
        codec: &'c Codec,
        cookie: &'c cookie::Config,
        routes: &'c Routes,
    ) -> Self {
        Self {
            codec,
            cookie,
            routes,
        }
    }

    /// Checks whether the request to the provided `path` has to pass this
    /// [`Gate`].
    ///
    /// API routes, framework internals and static files are not gated.
    #[must_use]
    pub fn covers(path: &str) -> bool {
        let is_static = path
            .rsplit('/')
            .next()
            .is_some_and(|segment| segment.contains('.'));

        !(path == "/api"
            || path.starts_with("/api/")
            || path.starts_with("/_next/")
            || is_static)
    }

    /// Decides on a request to the provided `path` presenting the provided
    /// cookies.
    #[must_use]
    pub fn decide(&self, path: &str, cookies: &impl cookie::Jar) -> Decision<'c> {
        self.decide_at(path, cookies, DateTime::now())
    }

    /// Decides on a request to the provided `path` presenting the provided
    /// cookies as if it happened at the provided [`DateTime`].
    #[must_use]
    pub fn decide_at(
        &self,
        path: &str,
        cookies: &impl cookie::Jar,
        now: DateTime,
    ) -> Decision<'c> {
        let class = PathClass::of(path, self.routes);
        let session = match cookies.get(&self.cookie.name) {
            None => SessionState::Absent,
            Some(token) => {
                let token = Token::from(token.to_owned());
                match self.codec.verify_at(&token, now) {
                    Ok(_) => SessionState::Valid,
                    Err(e) => {
                        log::debug!(
                            path,
                            kind = e.kind(),
                            "rejected session token: {e}",
                        );
                        SessionState::Invalid
                    }
                }
            }
        };

        decide(class, session, self.routes)
    }
}

#[cfg(test)]
mod spec {
    use std::{collections::HashMap, time::Duration};

    use common::DateTime;
    use secrecy::SecretString;

    use super::{
        decide, Decision, Gate, PathClass, Routes, SessionState,
    };
    use crate::{
        auth::{cookie, token::Codec},
        domain::user::{
            self,
            session::{Identity, Session},
        },
    };

    const COOKIE: &str = "token";

    fn codec() -> Codec {
        Codec::new(&SecretString::from("secret".to_owned())).unwrap()
    }

    fn cookie_config() -> cookie::Config {
        cookie::Config {
            name: COOKIE.to_owned(),
            secure: false,
        }
    }

    fn jar(token: Option<String>) -> HashMap<String, String> {
        token
            .into_iter()
            .map(|t| (COOKIE.to_owned(), t))
            .collect()
    }

    fn token_issued_at(codec: &Codec, at: DateTime) -> String {
        let identity = Identity {
            id: user::Id::new(),
            email: user::Email::new("user@email.com").unwrap(),
        };
        codec.issue_at(identity, at).unwrap().0.into_inner()
    }

    #[test]
    fn classifies_paths() {
        let routes = Routes::default();

        assert_eq!(PathClass::of("/", &routes), PathClass::Root);
        assert_eq!(PathClass::of("/signin", &routes), PathClass::Public);
        assert_eq!(PathClass::of("/register", &routes), PathClass::Public);
        assert_eq!(PathClass::of("/home", &routes), PathClass::Protected);
        assert_eq!(PathClass::of("/project", &routes), PathClass::Protected);
        assert_eq!(
            PathClass::of("/signin/extra", &routes),
            PathClass::Protected,
        );
    }

    #[test]
    fn decision_table() {
        use Decision as D;
        use PathClass as P;
        use SessionState as S;

        let routes = Routes::default();
        for (class, session, expected) in [
            (P::Root, S::Valid, D::Redirect("/home")),
            (P::Root, S::Absent, D::Redirect("/signin")),
            (P::Root, S::Invalid, D::Redirect("/signin")),
            (P::Public, S::Valid, D::Redirect("/home")),
            (P::Public, S::Absent, D::Allow),
            (P::Public, S::Invalid, D::Allow),
            (P::Protected, S::Absent, D::Redirect("/signin")),
            (P::Protected, S::Invalid, D::Redirect("/signin")),
            (P::Protected, S::Valid, D::Allow),
        ] {
            assert_eq!(
                decide(class, session, &routes),
                expected,
                "{class:?} with {session:?} session",
            );
        }
    }

    #[test]
    fn gates_requests_by_cookie() {
        let codec = codec();
        let cookie = cookie_config();
        let routes = Routes::default();
        let gate = Gate::new(&codec, &cookie, &routes);

        let valid = jar(Some(token_issued_at(&codec, DateTime::now())));
        let expired = jar(Some(token_issued_at(
            &codec,
            DateTime::now() - Session::LIFETIME - Duration::from_secs(1),
        )));
        let none = jar(None);

        assert_eq!(gate.decide("/", &none), Decision::Redirect("/signin"));
        assert_eq!(gate.decide("/", &valid), Decision::Redirect("/home"));
        assert_eq!(gate.decide("/signin", &valid), Decision::Redirect("/home"));
        assert_eq!(gate.decide("/signin", &none), Decision::Allow);
        assert_eq!(
            gate.decide("/project", &expired),
            Decision::Redirect("/signin"),
        );
        assert_eq!(gate.decide("/project", &valid), Decision::Allow);
    }

    #[test]
    fn treats_every_failure_as_invalid() {
        let codec = codec();
        let cookie = cookie_config();
        let routes = Routes::default();
        let gate = Gate::new(&codec, &cookie, &routes);

        let not_yet_valid = jar(Some(token_issued_at(
            &codec,
            DateTime::now() + Duration::from_secs(60),
        )));
        let foreign = jar(Some(token_issued_at(
            &Codec::new(&SecretString::from("other".to_owned())).unwrap(),
            DateTime::now(),
        )));
        let garbage = jar(Some("garbage".to_owned()));
        let empty = jar(Some(String::new()));

        for cookies in [&not_yet_valid, &foreign, &garbage, &empty] {
            assert_eq!(
                gate.decide("/project", cookies),
                Decision::Redirect("/signin"),
            );
            assert_eq!(gate.decide("/register", cookies), Decision::Allow);
            assert_eq!(
                gate.decide("/", cookies),
                Decision::Redirect("/signin"),
            );
        }
    }

    #[test]
    fn ignores_other_cookies() {
        let codec = codec();
        let cookie = cookie_config();
        let routes = Routes::default();
        let gate = Gate::new(&codec, &cookie, &routes);

        let cookies = HashMap::from([(
            "session".to_owned(),
            token_issued_at(&codec, DateTime::now()),
        )]);

        assert_eq!(
            gate.decide("/project", &cookies),
            Decision::Redirect("/signin"),
        );
    }

    #[test]
    fn covers_pages_only() {
        assert!(Gate::covers("/"));
        assert!(Gate::covers("/signin"));
        assert!(Gate::covers("/project/42"));

        assert!(!Gate::covers("/api"));
        assert!(!Gate::covers("/api/signin"));
        assert!(!Gate::covers("/_next/static/chunk.js"));
        assert!(!Gate::covers("/favicon.ico"));
        assert!(!Gate::covers("/images/logo.png"));
    }
}
