use crate::config::{HttpClientConfig, TransportSecurity};
use crate::connector::build_https_connector;
use crate::error::HttpError;
use crate::layers::DefaultHeadersLayer;
use crate::response::ResponseBody;
use bytes::Bytes;
use http::Response;
use http_body_util::{BodyExt, Full};
use hyper_util::client::legacy::Client;
use hyper_util::rt::{TokioExecutor, TokioTimer};
use std::time::Duration;
use tower::buffer::Buffer;
use tower::limit::ConcurrencyLimitLayer;
use tower::load_shed::LoadShedLayer;
use tower::timeout::TimeoutLayer;
use tower::util::BoxCloneService;
use tower::{ServiceBuilder, ServiceExt};
use tower_http::decompression::DecompressionLayer;

/// Type-erased service handed to an auth layer installed with
/// [`HttpClientBuilder::with_auth_layer`].
pub type InnerService =
    BoxCloneService<http::Request<Full<Bytes>>, http::Response<ResponseBody>, HttpError>;

type AuthWrap = Box<dyn FnOnce(InnerService) -> InnerService + Send>;

/// Builder for constructing an [`HttpClient`](crate::HttpClient) with a layered
/// tower middleware stack.
pub struct HttpClientBuilder {
    config: HttpClientConfig,
    auth_layer: Option<AuthWrap>,
}

impl HttpClientBuilder {
    /// Create a new builder with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create a builder with a specific configuration
    #[must_use]
    pub fn with_config(config: HttpClientConfig) -> Self {
        Self {
            config,
            auth_layer: None,
        }
    }

    /// Set the user agent string
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Allow plain HTTP connections.
    ///
    /// Only available in debug builds or with the `allow-insecure-http`
    /// feature, so release binaries cannot opt out of TLS by accident.
    #[must_use]
    #[cfg(any(debug_assertions, feature = "allow-insecure-http"))]
    pub fn allow_insecure_http(mut self) -> Self {
        self.config.transport = TransportSecurity::AllowInsecureHttp;
        self
    }

    /// Install an auth layer between the concurrency limit and the timeout.
    ///
    /// Stack position: `Buffer → LoadShed/Concurrency → **this layer** → Timeout → …`
    ///
    /// The layer runs once per request, so credentials are read at send
    /// time. A second call replaces the first.
    #[must_use]
    pub fn with_auth_layer(
        mut self,
        wrap: impl FnOnce(InnerService) -> InnerService + Send + 'static,
    ) -> Self {
        self.auth_layer = Some(Box::new(wrap));
        self
    }

    /// Build the HTTP client with all configured layers
    ///
    /// # Errors
    /// Returns an error if TLS initialization fails or the user agent is not a
    /// valid header value
    pub fn build(self) -> Result<crate::HttpClient, HttpError> {
        if self.config.transport == TransportSecurity::AllowInsecureHttp {
            tracing::warn!(
                "insecure HTTP enabled (TransportSecurity::AllowInsecureHttp); \
                 use only against local or mock servers"
            );
        }

        let timeout = self.config.request_timeout;
        let https = build_https_connector(self.config.transport)?;

        // pool_timer is required for pool_idle_timeout to take effect
        let mut client_builder = Client::builder(TokioExecutor::new());
        client_builder
            .pool_timer(TokioTimer::new())
            .pool_max_idle_per_host(self.config.pool_max_idle_per_host);
        if let Some(idle_timeout) = self.config.pool_idle_timeout {
            client_builder.pool_idle_timeout(idle_timeout);
        }
        let hyper_client = client_builder.build::<_, Full<Bytes>>(https);

        let default_headers = DefaultHeadersLayer::for_json_api(&self.config.user_agent)?;

        // Request flow (outer → inner):
        //   Buffer → LoadShed/Concurrency → [Auth?] → ErrorMapping →
        //   Timeout → DefaultHeaders → Decompression → hyper_client
        //
        // send() returns Ok for every HTTP status; non-2xx becomes an error
        // only when the body is read through HttpResponse.
        let service = ServiceBuilder::new()
            .layer(TimeoutLayer::new(timeout))
            .layer(default_headers)
            .layer(DecompressionLayer::new())
            .service(hyper_client)
            .map_response(map_decompression_response)
            .map_err(move |e: tower::BoxError| map_tower_error(e, timeout));

        let mut boxed_service = service.boxed_clone();

        if let Some(wrap) = self.auth_layer {
            boxed_service = wrap(boxed_service);
        }

        if let Some(rate_limit) = self.config.rate_limit {
            let limited = ServiceBuilder::new()
                .layer(LoadShedLayer::new())
                .layer(ConcurrencyLimitLayer::new(
                    rate_limit.max_concurrent_requests,
                ))
                .service(boxed_service)
                .map_err(map_load_shed_error);
            boxed_service = limited.boxed_clone();
        }

        // Buffer spawns a worker task; clones share it without locking.
        let buffered_service: crate::client::BufferedService =
            Buffer::new(boxed_service, self.config.buffer_capacity.max(1));

        Ok(crate::HttpClient {
            service: buffered_service,
            max_body_size: self.config.max_body_size,
            transport_security: self.config.transport,
        })
    }
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Map tower errors to `HttpError`, reporting the configured timeout.
///
/// Typed `HttpError`s boxed by middleware are unwrapped rather than
/// re-wrapped as `Transport`.
fn map_tower_error(err: tower::BoxError, timeout: Duration) -> HttpError {
    if err.is::<tower::timeout::error::Elapsed>() {
        return HttpError::Timeout(timeout);
    }

    match err.downcast::<HttpError>() {
        Ok(http_err) => *http_err,
        Err(other) => HttpError::Transport(other),
    }
}

fn map_load_shed_error(err: tower::BoxError) -> HttpError {
    if err.is::<tower::load_shed::error::Overloaded>() {
        HttpError::Overloaded
    } else {
        match err.downcast::<HttpError>() {
            Ok(http_err) => *http_err,
            Err(err) => HttpError::Transport(err),
        }
    }
}

/// Box the decompression body into [`ResponseBody`].
fn map_decompression_response<B>(response: Response<B>) -> Response<ResponseBody>
where
    B: hyper::body::Body<Data = Bytes> + Send + Sync + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let (parts, body) = response.into_parts();
    let boxed_body: ResponseBody = body.map_err(Into::into).boxed();
    Response::from_parts(parts, boxed_body)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::config::DEFAULT_USER_AGENT;

    #[test]
    fn test_builder_default() {
        let builder = HttpClientBuilder::new();
        assert_eq!(builder.config.request_timeout, Duration::from_secs(30));
        assert_eq!(builder.config.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(builder.config.buffer_capacity, 256);
        assert_eq!(builder.config.transport, TransportSecurity::TlsOnly);
    }

    #[test]
    fn test_builder_keeps_config_and_sets_user_agent() {
        let config = HttpClientConfig {
            request_timeout: Duration::from_secs(5),
            max_body_size: 2048,
            ..HttpClientConfig::for_testing()
        };
        let builder = HttpClientBuilder::with_config(config).user_agent("admin-console/0.1");
        assert_eq!(builder.config.request_timeout, Duration::from_secs(5));
        assert_eq!(builder.config.user_agent, "admin-console/0.1");
        assert_eq!(builder.config.max_body_size, 2048);
        assert!(builder.config.rate_limit.is_none());
        assert_eq!(builder.config.transport, TransportSecurity::AllowInsecureHttp);
    }

    #[tokio::test]
    async fn test_builder_buffer_capacity_zero_in_config_clamped() {
        let config = HttpClientConfig {
            buffer_capacity: 0,
            ..Default::default()
        };
        assert!(HttpClientBuilder::with_config(config).build().is_ok());
    }

    #[tokio::test]
    async fn test_builder_build() {
        assert!(HttpClientBuilder::new().build().is_ok());
        assert!(HttpClientBuilder::new().allow_insecure_http().build().is_ok());
    }

    #[tokio::test]
    async fn test_builder_with_auth_layer() {
        let client = HttpClientBuilder::new()
            .allow_insecure_http()
            .with_auth_layer(|svc| svc)
            .build();
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_builder_build_invalid_user_agent() {
        let client = HttpClientBuilder::new()
            .user_agent("invalid\x00agent")
            .build();
        assert!(matches!(client, Err(HttpError::InvalidHeaderValue(_))));
    }

    #[tokio::test]
    async fn test_auth_layer_error_reaches_caller() {
        use tower::service_fn;

        let client = HttpClientBuilder::new()
            .allow_insecure_http()
            .with_auth_layer(|_inner| {
                service_fn(|_req: http::Request<Full<Bytes>>| async {
                    Err::<Response<ResponseBody>, _>(HttpError::MissingCredentials)
                })
                .boxed_clone()
            })
            .build()
            .unwrap();

        let err = client
            .get("http://127.0.0.1:9/never")
            .send()
            .await
            .unwrap_err();
        assert!(matches!(err, HttpError::MissingCredentials));
    }

    #[tokio::test]
    async fn test_load_shedding_returns_overloaded_error() {
        use http::Request;
        use std::future::Future;
        use std::pin::Pin;
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::task::{Context, Poll};
        use tower::Service;

        #[derive(Clone)]
        struct SlotHoldingService {
            active: Arc<AtomicUsize>,
        }

        impl Service<Request<Full<Bytes>>> for SlotHoldingService {
            type Response = Response<Full<Bytes>>;
            type Error = HttpError;
            type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

            fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
                Poll::Ready(Ok(()))
            }

            fn call(&mut self, _: Request<Full<Bytes>>) -> Self::Future {
                self.active.fetch_add(1, Ordering::SeqCst);
                Box::pin(std::future::pending())
            }
        }

        let active = Arc::new(AtomicUsize::new(0));
        let service = ServiceBuilder::new()
            .layer(LoadShedLayer::new())
            .layer(ConcurrencyLimitLayer::new(1))
            .service(SlotHoldingService {
                active: active.clone(),
            })
            .map_err(map_load_shed_error);

        let req = || {
            Request::builder()
                .uri("http://test")
                .body(Full::new(Bytes::new()))
                .unwrap()
        };

        let mut first = service.clone();
        let _pending = first.ready().await.unwrap().call(req());
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(active.load(Ordering::SeqCst), 1);

        let mut second = service.clone();
        let result = tokio::time::timeout(Duration::from_millis(100), async {
            match second.ready().await {
                Ok(svc) => svc.call(req()).await,
                Err(e) => Err(e),
            }
        })
        .await;

        let err = result.expect("must not hang").unwrap_err();
        assert!(matches!(err, HttpError::Overloaded), "got: {err:?}");
    }

    #[test]
    fn test_map_tower_error_preserves_typed_errors() {
        let boxed: tower::BoxError = Box::new(HttpError::MissingCredentials);
        assert!(matches!(
            map_tower_error(boxed, Duration::from_secs(30)),
            HttpError::MissingCredentials
        ));

        let boxed: tower::BoxError = Box::new(HttpError::Timeout(Duration::from_secs(5)));
        match map_tower_error(boxed, Duration::from_secs(30)) {
            HttpError::Timeout(d) => assert_eq!(d, Duration::from_secs(5)),
            other => panic!("expected Timeout, got: {other:?}"),
        }
    }

    #[test]
    fn test_map_tower_error_wraps_unknown_as_transport() {
        let other: tower::BoxError = Box::new(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        ));
        assert!(matches!(
            map_tower_error(other, Duration::from_secs(30)),
            HttpError::Transport(_)
        ));
    }
}
