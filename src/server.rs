use std::net::SocketAddr;

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::error::{Error, Result};
use crate::metrics::SubkeyMetrics;

/// Builds the HTTP router exposing `GET /metrics`.
pub fn router(metrics: SubkeyMetrics) -> Router {
    Router::new()
        .route("/metrics", get(render_metrics))
        .with_state(metrics)
}

/// Serves the metrics endpoint on `addr` until the listener fails.
pub async fn serve(addr: SocketAddr, metrics: SubkeyMetrics) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| Error::Bind { addr, source })?;

    info!("Now listening on {addr}");
    axum::serve(listener, router(metrics))
        .await
        .map_err(Error::Serve)
}

async fn render_metrics(State(metrics): State<SubkeyMetrics>) -> Response {
    match metrics.render() {
        Ok(body) => ([(header::CONTENT_TYPE, metrics.content_type())], body).into_response(),
        Err(err) => {
            error!(error = %err, "failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::{self, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::types::ValidityCounts;

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let metrics = SubkeyMetrics::new().unwrap();
        metrics.publish(
            "alice.asc",
            &ValidityCounts {
                current: 1,
                one_week: 1,
                two_weeks: 0,
            },
        );

        let resp = router(metrics)
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let content_type = resp.headers()[header::CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("text/plain"));

        let body = body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("gpg_subkeys_current{name=\"alice.asc\"} 1"));
        assert!(text.contains("gpg_subkeys_future_2weeks{name=\"alice.asc\"} 0"));
    }

    #[tokio::test]
    async fn test_unknown_path() {
        let resp = router(SubkeyMetrics::new().unwrap())
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_post_not_allowed() {
        let resp = router(SubkeyMetrics::new().unwrap())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_bind_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let err = serve(addr, SubkeyMetrics::new().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Bind { .. }));
    }
}
