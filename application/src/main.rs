use std::{future::IntoFuture as _, io, sync::OnceLock, time::Duration};

use application::{api, config, gate::gate, Args, Config, Service};
use axum::{extract::MatchedPath, middleware, Extension, Router};
use axum_client_ip::InsecureClientIp;
use futures::TryFutureExt as _;
use service::infra::Postgres;
use tokio::net::TcpListener;
use tower_http::{
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing as log;
use tracing_subscriber::{
    filter::filter_fn,
    layer::{Layer as _, SubscriberExt as _},
    util::SubscriberInitExt as _,
};

/// Levels written to `stderr` rather than `stdout`.
const STDERR_LEVELS: &[log::Level] = &[log::Level::WARN, log::Level::ERROR];

/// Maximum level of the written events, set once the `Config` is loaded.
static LOG_LEVEL: OnceLock<log::Level> = OnceLock::new();

#[tokio::main]
async fn main() {
    init_logging();

    _ = start().await;
}

/// Installs `stdout` and `stderr` log layers split by [`STDERR_LEVELS`].
fn init_logging() {
    let enabled = |to_stderr: bool| {
        filter_fn(move |meta| {
            meta.is_span()
                || STDERR_LEVELS.contains(meta.level()) == to_stderr
                    && LOG_LEVEL.get().copied().unwrap_or(log::Level::INFO)
                        >= *meta.level()
        })
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(true)
                .with_thread_names(true)
                .with_writer(io::stdout)
                .with_filter(enabled(false)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(true)
                .with_thread_names(true)
                .with_writer(io::stderr)
                .with_filter(enabled(true)),
        )
        .init();
}

async fn start() -> Result<(), ()> {
    let Args { config } = Args::parse().map_err(|e| {
        log::error!("failed to parse command line arguments: {e}");
    })?;

    let Config {
        postgres,
        service,
        server,
        log,
    } = Config::new(config).map_err(|e| {
        log::error!("failed to load `Config`: {e}");
    })?;

    LOG_LEVEL
        .set(log.level.into())
        .unwrap_or_else(|_| unreachable!("first initialization"));

    let postgres = Postgres::new(&postgres.into()).map_err(|e| {
        log::error!("failed to initialize `Postgres` client: {e}");
    })?;
    let service = Service::new(service.into(), postgres).map_err(|e| {
        log::error!("refusing to start `Service`: {e}");
    })?;

    _ = service.database().migrate().await.map_err(|e| {
        log::error!("failed to run database migrations: {e}");
    })?;

    let app = router(service, &server)?;

    let listener = TcpListener::bind((server.host.clone(), server.port))
        .await
        .map_err(|e| {
            log::error!(
                "failed to listen on `{}:{}`: {e}",
                server.host,
                server.port,
            );
        })?;

    log::info!("listening on `{}:{}`", server.host, server.port);

    axum::serve(listener, app)
        .into_future()
        .map_err(|e| log::error!("webserver failed: {e}"))
        .await
}

/// Builds the [`Router`] serving the JSON API and the gated pages.
fn router(service: Service, server: &config::Server) -> Result<Router, ()> {
    let pages = ServeDir::new(&server.pages)
        .not_found_service(ServeFile::new(server.pages.join("index.html")));

    Ok(Router::new()
        .nest("/api", api::router())
        .fallback_service(pages)
        .layer(middleware::from_fn(gate))
        .layer(Extension(service))
        .layer(server.cors.layer().map_err(|e| {
            log::error!("failed to build CORS layer: {e}");
        })?)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|r: &http::Request<_>| {
                    log::info_span!(
                        "HTTP request",
                        http.client_ip = InsecureClientIp::from(
                            r.headers(),
                            r.extensions(),
                        )
                        .map(|ip| ip.0.to_string())
                        .ok(),
                        http.method = r.method().as_str(),
                        http.route = r
                            .extensions()
                            .get::<MatchedPath>()
                            .map(MatchedPath::as_str),
                        http.target = r
                            .uri()
                            .path_and_query()
                            .map(http::uri::PathAndQuery::as_str),
                        http.user_agent = r
                            .headers()
                            .get(http::header::USER_AGENT)
                            .and_then(|h| h.to_str().ok()),
                        http.status_code = log::field::Empty,
                    )
                })
                .on_response(
                    |r: &http::Response<_>,
                     dur: Duration,
                     span: &log::Span| {
                        _ = span.record(
                            "http.status_code",
                            log::field::display(r.status().as_u16()),
                        );

                        let duration = format!("{}ms", dur.as_millis());
                        if r.status().is_server_error() {
                            log::error!(duration = duration.as_str());
                        } else if r.status().is_client_error() {
                            log::warn!(duration = duration.as_str());
                        } else {
                            log::info!(duration = duration.as_str());
                        }
                    },
                ),
        ))
}
