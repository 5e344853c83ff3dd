use crate::error::HttpError;
use http::header::{ACCEPT, HeaderName, USER_AGENT};
use http::{HeaderMap, HeaderValue, Request, Response};
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Tower layer that fills in default request headers.
///
/// Every configured header is inserted only when the outgoing request does not
/// already carry it, so per-request values always win.
#[derive(Clone, Debug)]
pub struct DefaultHeadersLayer {
    headers: Arc<HeaderMap>,
}

impl DefaultHeadersLayer {
    /// Layer sending `User-Agent: <user_agent>` and `Accept: application/json`.
    ///
    /// # Errors
    /// Returns `HttpError::InvalidHeaderValue` if the user agent string is not valid
    pub fn for_json_api(user_agent: impl AsRef<str>) -> Result<Self, HttpError> {
        let mut headers = HeaderMap::with_capacity(2);
        headers.insert(USER_AGENT, HeaderValue::from_str(user_agent.as_ref())?);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Ok(Self {
            headers: Arc::new(headers),
        })
    }

    /// Add another default header.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        Arc::make_mut(&mut self.headers).insert(name, value);
        self
    }
}

impl<S> Layer<S> for DefaultHeadersLayer {
    type Service = DefaultHeadersService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        DefaultHeadersService {
            inner,
            headers: Arc::clone(&self.headers),
        }
    }
}

/// Service that inserts missing default headers before forwarding the request.
#[derive(Clone, Debug)]
pub struct DefaultHeadersService<S> {
    inner: S,
    headers: Arc<HeaderMap>,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for DefaultHeadersService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        for (name, value) in self.headers.iter() {
            if !req.headers().contains_key(name) {
                req.headers_mut().insert(name.clone(), value.clone());
            }
        }
        self.inner.call(req)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{Method, StatusCode};
    use http_body_util::Full;
    use tower::ServiceExt;

    /// Echoes the request headers back as the response headers.
    #[derive(Clone)]
    struct EchoHeaders;

    impl Service<Request<Full<Bytes>>> for EchoHeaders {
        type Response = Response<Full<Bytes>>;
        type Error = Box<dyn std::error::Error + Send + Sync>;
        type Future = std::future::Ready<Result<Self::Response, Self::Error>>;

        fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: Request<Full<Bytes>>) -> Self::Future {
            let mut resp = Response::builder()
                .status(StatusCode::OK)
                .body(Full::new(Bytes::new()))
                .unwrap();
            *resp.headers_mut() = req.headers().clone();
            std::future::ready(Ok(resp))
        }
    }

    fn request(extra: Option<(HeaderName, &'static str)>) -> Request<Full<Bytes>> {
        let mut builder = Request::builder()
            .method(Method::GET)
            .uri("http://example.com/admin/users");
        if let Some((name, value)) = extra {
            builder = builder.header(name, value);
        }
        builder.body(Full::new(Bytes::new())).unwrap()
    }

    #[tokio::test]
    async fn test_defaults_added() {
        let layer = DefaultHeadersLayer::for_json_api("admin-console/1.0").unwrap();
        let resp = layer.layer(EchoHeaders).oneshot(request(None)).await.unwrap();

        assert_eq!(resp.headers()[USER_AGENT], "admin-console/1.0");
        assert_eq!(resp.headers()[ACCEPT], "application/json");
    }

    #[tokio::test]
    async fn test_caller_header_not_overwritten() {
        let layer = DefaultHeadersLayer::for_json_api("admin-console/1.0").unwrap();
        let resp = layer
            .layer(EchoHeaders)
            .oneshot(request(Some((ACCEPT, "text/csv"))))
            .await
            .unwrap();

        assert_eq!(resp.headers()[ACCEPT], "text/csv");
        assert_eq!(resp.headers()[USER_AGENT], "admin-console/1.0");
    }

    #[tokio::test]
    async fn test_extra_default_header() {
        let layer = DefaultHeadersLayer::for_json_api("admin-console/1.0")
            .unwrap()
            .with_header(
                HeaderName::from_static("x-client"),
                HeaderValue::from_static("cli"),
            );
        let resp = layer.layer(EchoHeaders).oneshot(request(None)).await.unwrap();

        assert_eq!(resp.headers()["x-client"], "cli");
    }

    #[test]
    fn test_invalid_user_agent_rejected() {
        let result = DefaultHeadersLayer::for_json_api("invalid\x00agent");
        assert!(matches!(result, Err(HttpError::InvalidHeaderValue(_))));
    }
}
