//! Liveness endpoint for external uptime checks.

use std::net::SocketAddr;

use axum::{response::Html, routing::get, Router};
use tokio::net::TcpListener;
use tracing::{error, info};

const BODY: &str = "<h1> Bot is running </h1>";

pub fn router() -> Router {
    Router::new().route("/", get(|| async { Html(BODY) }))
}

/// Serve the liveness router until the process exits.
///
/// Bind or serve failures are logged; the bot keeps running without it.
pub async fn serve(addr: SocketAddr) {
    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!(%addr, "liveness server failed to bind: {e}");
            return;
        }
    };
    info!(%addr, "liveness server listening");
    if let Err(e) = axum::serve(listener, router()).await {
        error!("liveness server stopped: {e}");
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use super::*;

    #[tokio::test]
    async fn root_reports_running() {
        let resp = router()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = to_bytes(resp.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], BODY.as_bytes());
    }

    #[tokio::test]
    async fn other_paths_are_not_found() {
        let resp = router()
            .oneshot(Request::builder().uri("/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
