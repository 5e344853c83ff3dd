use std::sync::Arc;

use tower::ServiceExt;

use crate::layer::BearerAuthLayer;
use crate::token::TokenSource;

/// Extension trait adding bearer auth to [`adminkit_http::HttpClientBuilder`].
///
/// ```ignore
/// use adminkit_auth::{HttpClientBuilderExt, StoredToken};
///
/// let client = HttpClientBuilder::new()
///     .with_bearer_auth(Arc::new(StoredToken::new(storage)))
///     .build()?;
/// ```
pub trait HttpClientBuilderExt {
    /// Add `Authorization: Bearer <token>` injection to the HTTP client.
    #[must_use]
    fn with_bearer_auth(self, source: Arc<dyn TokenSource>) -> Self;
}

impl HttpClientBuilderExt for adminkit_http::HttpClientBuilder {
    fn with_bearer_auth(self, source: Arc<dyn TokenSource>) -> Self {
        let layer = BearerAuthLayer::new(source);
        self.with_auth_layer(move |svc| {
            tower::ServiceBuilder::new()
                .layer(layer)
                .service(svc)
                .boxed_clone()
        })
    }
}
