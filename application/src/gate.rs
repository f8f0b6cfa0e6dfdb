//! Middleware gating page requests by their session.

use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse as _, Redirect, Response},
    Extension,
};
use axum_extra::extract::CookieJar;
use service::auth::{gate::Decision, Gate};

use crate::{context::Cookies, Service};

/// Lets a page request through, or redirects it according to the [`Gate`] of
/// the [`Service`].
///
/// API routes, static files and `OPTIONS` requests are never redirected.
pub async fn gate(
    Extension(service): Extension<Service>,
    cookies: CookieJar,
    req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path();
    if req.method() == http::Method::OPTIONS || !Gate::covers(path) {
        return next.run(req).await;
    }

    let decision = service.gate().decide(path, &Cookies(&cookies));
    match decision {
        Decision::Allow => next.run(req).await,
        Decision::Redirect(to) => Redirect::temporary(to).into_response(),
    }
}

#[cfg(test)]
mod spec {
    use axum::{body::Body, middleware, Extension, Router};
    use service::domain::user::{self, session::Identity};
    use tower::ServiceExt as _;

    use super::gate;
    use crate::{test::service, Service};

    fn app(service: Service) -> Router {
        Router::new()
            .fallback(|| async { "page" })
            .layer(middleware::from_fn(gate))
            .layer(Extension(service))
    }

    async fn request(
        service: Service,
        path: &str,
        cookie: Option<&str>,
    ) -> http::Response<Body> {
        let mut req = http::Request::get(path);
        if let Some(token) = cookie {
            req = req.header(http::header::COOKIE, format!("token={token}"));
        }
        app(service)
            .oneshot(req.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    fn location(resp: &http::Response<Body>) -> &str {
        resp.headers()[http::header::LOCATION].to_str().unwrap()
    }

    fn token(service: &Service) -> String {
        service
            .codec()
            .issue(Identity {
                id: user::Id::new(),
                email: user::Email::new("jane@email.com").unwrap(),
            })
            .unwrap()
            .0
            .into_inner()
    }

    #[tokio::test]
    async fn redirects_anonymous_to_sign_in() {
        for path in ["/", "/project"] {
            let resp = request(service(), path, None).await;

            assert_eq!(resp.status(), http::StatusCode::TEMPORARY_REDIRECT);
            assert_eq!(location(&resp), "/signin");
        }
    }

    #[tokio::test]
    async fn redirects_invalid_session_to_sign_in() {
        let resp = request(service(), "/project", Some("garbage")).await;

        assert_eq!(resp.status(), http::StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&resp), "/signin");
    }

    #[tokio::test]
    async fn redirects_signed_in_to_landing() {
        let svc = service();
        let token = token(&svc);

        for path in ["/", "/signin", "/register"] {
            let resp = request(svc.clone(), path, Some(token.as_str())).await;

            assert_eq!(resp.status(), http::StatusCode::TEMPORARY_REDIRECT);
            assert_eq!(location(&resp), "/home");
        }
    }

    #[tokio::test]
    async fn serves_allowed_pages() {
        let svc = service();
        let token = token(&svc);

        let resp = request(svc.clone(), "/project", Some(token.as_str())).await;
        assert_eq!(resp.status(), http::StatusCode::OK);

        let resp = request(svc, "/signin", None).await;
        assert_eq!(resp.status(), http::StatusCode::OK);
    }

    #[tokio::test]
    async fn bypasses_api_and_static_files() {
        for path in ["/api/profile", "/logo.png", "/_next/static/app.js"] {
            let resp = request(service(), path, None).await;

            assert_eq!(resp.status(), http::StatusCode::OK, "{path}");
        }
    }

    #[tokio::test]
    async fn bypasses_preflight() {
        let resp = app(service())
            .oneshot(
                http::Request::builder()
                    .method(http::Method::OPTIONS)
                    .uri("/project")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), http::StatusCode::OK);
    }
}
