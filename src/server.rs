use std::net::SocketAddr;

use anyhow::Context;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Redirect};
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;

pub const DEFAULT_PORT: u16 = 8080;

const INDEX_HTML: &str = include_str!("../static/index.html");
const BUNDLE_JS: &str = include_str!("../static/liscap.min.js");

pub fn router() -> Router {
    Router::new()
        .route("/", get(index))
        .route("/liscap.min.js", get(bundle))
        .fallback(redirect_to_root)
        .layer(CorsLayer::permissive())
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn bundle() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        BUNDLE_JS,
    )
}

async fn redirect_to_root() -> Redirect {
    Redirect::to("/")
}

pub fn port_from_env() -> anyhow::Result<u16> {
    parse_port(std::env::var("PORT").ok().as_deref())
}

// An unset or blank PORT falls back to the default instead of erroring.
pub(crate) fn parse_port(raw: Option<&str>) -> anyhow::Result<u16> {
    let value = match raw {
        Some(value) if !value.trim().is_empty() => value.trim(),
        _ => return Ok(DEFAULT_PORT),
    };
    value
        .parse()
        .with_context(|| format!("invalid PORT value {value:?}"))
}

pub async fn serve(port: u16) -> anyhow::Result<()> {
    let app = router();
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("liscap server listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
