use axum::{
    http::{HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

/// 请求ID头部名称
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Requests slower than this are logged at warn level.
pub const SLOW_REQUEST_MS: u128 = 1000;

/// Request id stored in request extensions for handlers that want to log it.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// 为每个请求分配 ID, 记录方法、路径、状态码和耗时
pub async fn request_tracking_middleware<B>(mut request: Request<B>, next: Next<B>) -> Response {
    let start = Instant::now();
    let request_id = incoming_request_id(request.headers()).unwrap_or_else(|| Uuid::new_v4().to_string());
    request.extensions_mut().insert(RequestId(request_id.clone()));

    let method = request.method().clone();
    let uri = request.uri().path().to_string();
    let span = info_span!("request", request_id = %request_id, method = %method, uri = %uri);

    let mut response = next.run(request).instrument(span.clone()).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    let status = response.status();
    let duration_ms = start.elapsed().as_millis();
    let _guard = span.enter();
    if status.is_server_error() {
        warn!(status = status.as_u16(), duration_ms, "Request failed");
    } else if status.is_client_error() {
        info!(status = status.as_u16(), duration_ms, "Request rejected");
    } else {
        info!(status = status.as_u16(), duration_ms, "Request completed");
    }
    if duration_ms > SLOW_REQUEST_MS {
        warn!(duration_ms, "Slow request detected");
    }

    response
}

/// Reuses a caller-supplied id when it is non-empty and printable.
fn incoming_request_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty() && v.len() <= 128)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Extension, Router, body::Body, middleware::from_fn, routing::get};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route(
                "/echo",
                get(|Extension(id): Extension<RequestId>| async move { id.0 }),
            )
            .layer(from_fn(request_tracking_middleware))
    }

    #[tokio::test]
    async fn generates_an_id_when_missing() {
        let response = app()
            .oneshot(Request::builder().uri("/echo").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let id = response.headers().get(REQUEST_ID_HEADER).unwrap().to_str().unwrap();
        assert!(Uuid::parse_str(id).is_ok());
    }

    #[tokio::test]
    async fn propagates_caller_id() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/echo")
                    .header(REQUEST_ID_HEADER, "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers().get(REQUEST_ID_HEADER).unwrap(), "abc-123");
        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
        assert_eq!(&body[..], b"abc-123");
    }
}
