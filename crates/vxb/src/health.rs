//! Liveness endpoint for external uptime checks.

use std::net::SocketAddr;

use axum::Router;

pub const LIVENESS_BODY: &str = "Discord Bot is running!";

/// Every path and method answers 200 with a fixed body.
pub fn router() -> Router {
    Router::new().fallback(|| async { LIVENESS_BODY })
}

/// Serve the liveness endpoint; bind or serve errors are logged, never fatal.
pub async fn serve(port: u16) {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("health listener could not bind {addr}: {e}");
            return;
        }
    };

    tracing::info!("health check listening on http://{addr}");
    if let Err(e) = axum::serve(listener, router()).await {
        tracing::error!("health listener stopped: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
    };
    use tower::ServiceExt;

    async fn call(method: Method, uri: &str) -> (StatusCode, String) {
        let resp = router()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = resp.status();
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn answers_any_request() {
        for (method, uri) in [
            (Method::GET, "/"),
            (Method::GET, "/healthz"),
            (Method::POST, "/anything/else"),
        ] {
            let (status, body) = call(method, uri).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, LIVENESS_BODY);
        }
    }
}
