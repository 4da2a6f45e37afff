//! Request ID middleware for request tracing

use axum::{
    body::Body,
    extract::Request,
    http::{header::CONTENT_LENGTH, HeaderName},
    middleware::Next,
    response::Response,
};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

use crate::error::ErrorResponse;

/// Header name for request ID
pub const X_REQUEST_ID: &str = "x-request-id";

/// Creates a layered middleware that:
/// 1. Sets a request ID if not present (using UUID v4)
/// 2. Propagates the request ID to the response
pub fn request_id_layer() -> (SetRequestIdLayer<MakeRequestUuid>, PropagateRequestIdLayer) {
    let header_name = HeaderName::from_static(X_REQUEST_ID);

    (
        SetRequestIdLayer::new(header_name.clone(), MakeRequestUuid),
        PropagateRequestIdLayer::new(header_name),
    )
}

/// Extension trait for extracting request ID from headers
pub trait RequestIdExt {
    fn request_id(&self) -> Option<&str>;
}

impl RequestIdExt for axum::http::HeaderMap {
    fn request_id(&self) -> Option<&str> {
        self.get(X_REQUEST_ID)?.to_str().ok()
    }
}

/// Copies the request id into error bodies produced by [`crate::error::ApiError`].
///
/// Must run inside [`SetRequestIdLayer`] so the header is already present.
pub async fn attach_request_id(request: Request, next: Next) -> Response {
    let request_id = request.headers().request_id().map(str::to_owned);

    let mut response = next.run(request).await;
    let Some(body) = response.extensions_mut().remove::<ErrorResponse>() else {
        return response;
    };

    let body = ErrorResponse { request_id, ..body };
    let Ok(bytes) = serde_json::to_vec(&body) else {
        return response;
    };

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(bytes))
}
