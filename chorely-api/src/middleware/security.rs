/// Response hardening headers
///
/// Every response, including errors produced by inner layers, gets:
///
/// - `X-Content-Type-Options: nosniff`
/// - `X-Frame-Options: DENY`
/// - `Referrer-Policy: no-referrer`
/// - `Content-Security-Policy: default-src 'none'; frame-ancestors 'none'`
/// - `Cache-Control: no-store` (responses carry household data)
/// - `Strict-Transport-Security` in production only
///
/// # Example
///
/// ```no_run
/// use axum::Router;
/// use chorely_api::middleware::security::SecurityHeadersLayer;
///
/// let app: Router = Router::new().layer(SecurityHeadersLayer::new(true));
/// ```

use axum::{
    extract::Request,
    http::{header, HeaderName, HeaderValue},
    response::Response,
};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tower::{Layer, Service};

const BASE_HEADERS: [(HeaderName, &str); 5] = [
    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (header::X_FRAME_OPTIONS, "DENY"),
    (header::REFERRER_POLICY, "no-referrer"),
    (
        header::CONTENT_SECURITY_POLICY,
        "default-src 'none'; frame-ancestors 'none'",
    ),
    (header::CACHE_CONTROL, "no-store"),
];

const HSTS: &str = "max-age=31536000; includeSubDomains";

#[derive(Debug, Clone, Copy)]
pub struct SecurityHeadersLayer {
    production: bool,
}

impl SecurityHeadersLayer {
    /// `production` adds HSTS; leave it off when serving plain HTTP locally
    pub fn new(production: bool) -> Self {
        Self { production }
    }
}

impl<S> Layer<S> for SecurityHeadersLayer {
    type Service = SecurityHeaders<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SecurityHeaders {
            inner,
            production: self.production,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SecurityHeaders<S> {
    inner: S,
    production: bool,
}

fn apply_headers(response: &mut Response, production: bool) {
    let headers = response.headers_mut();

    for (name, value) in BASE_HEADERS {
        headers
            .entry(name)
            .or_insert(HeaderValue::from_static(value));
    }

    if production {
        headers.insert(header::STRICT_TRANSPORT_SECURITY, HeaderValue::from_static(HSTS));
    }
}

impl<S> Service<Request> for SecurityHeaders<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let future = self.inner.call(request);
        let production = self.production;

        Box::pin(async move {
            let mut response = future.await?;
            apply_headers(&mut response, production);
            Ok(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, routing::get, Router};
    use tower::ServiceExt;

    fn app(production: bool) -> Router {
        Router::new()
            .route("/households", get(|| async { "[]" }))
            .layer(SecurityHeadersLayer::new(production))
    }

    async fn call(app: Router, uri: &str) -> Response {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_base_headers_applied() {
        let response = call(app(false), "/households").await;
        let headers = response.headers();

        assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
        assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
        assert_eq!(headers.get("cache-control").unwrap(), "no-store");
        assert!(headers.get("content-security-policy").is_some());
        assert!(headers.get("strict-transport-security").is_none());
    }

    #[tokio::test]
    async fn test_hsts_only_in_production() {
        let response = call(app(true), "/households").await;
        assert!(response.headers().get("strict-transport-security").is_some());
    }

    #[tokio::test]
    async fn test_headers_on_fallback_responses() {
        let response = call(app(false), "/missing").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get("x-frame-options").unwrap(),
            "DENY"
        );
    }
}
