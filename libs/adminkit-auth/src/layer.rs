use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use adminkit_http::HttpError;
use http::header::AUTHORIZATION;
use http::{HeaderValue, Request, Response};
use tower::{Layer, Service};

use crate::token::TokenSource;

/// Tower layer that injects `Authorization: Bearer <token>` into every
/// outbound request.
///
/// The token is looked up per request. When the source has no token the
/// request fails with [`HttpError::MissingCredentials`] and never reaches the
/// inner service.
#[derive(Clone)]
pub struct BearerAuthLayer {
    source: Arc<dyn TokenSource>,
}

impl BearerAuthLayer {
    #[must_use]
    pub fn new(source: Arc<dyn TokenSource>) -> Self {
        Self { source }
    }
}

impl std::fmt::Debug for BearerAuthLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerAuthLayer").finish_non_exhaustive()
    }
}

impl<S> Layer<S> for BearerAuthLayer {
    type Service = BearerAuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BearerAuthService {
            inner,
            source: Arc::clone(&self.source),
        }
    }
}

/// Service produced by [`BearerAuthLayer`].
#[derive(Clone)]
pub struct BearerAuthService<S> {
    inner: S,
    source: Arc<dyn TokenSource>,
}

impl<S, B, ResBody> Service<Request<B>> for BearerAuthService<S>
where
    S: Service<Request<B>, Response = Response<ResBody>, Error = HttpError>
        + Clone
        + Send
        + 'static,
    S::Future: Send,
    B: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = HttpError;
    type Future = Pin<Box<dyn Future<Output = Result<Response<ResBody>, HttpError>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        let Some(secret) = self.source.bearer_token().filter(|t| !t.is_blank()) else {
            tracing::debug!(uri = %req.uri(), "no bearer token; request not sent");
            return Box::pin(async { Err(HttpError::MissingCredentials) });
        };

        let raw = zeroize::Zeroizing::new(format!("Bearer {}", secret.expose()));
        let mut bearer_value = match HeaderValue::from_str(&raw) {
            Ok(v) => v,
            Err(e) => return Box::pin(async { Err(HttpError::InvalidHeaderValue(e)) }),
        };
        bearer_value.set_sensitive(true);
        req.headers_mut().insert(AUTHORIZATION, bearer_value);

        // Clone-swap: the ready service is the one that must handle the call.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move { inner.call(req).await })
    }
}
