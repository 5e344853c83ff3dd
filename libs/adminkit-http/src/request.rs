use crate::client::{BufferedService, map_buffer_error, try_acquire_buffer_slot};
use crate::config::TransportSecurity;
use crate::error::{HttpError, InvalidUriKind};
use crate::response::{HttpResponse, ResponseBody};
use bytes::Bytes;
use http::{Request, Response};
use http_body_util::Full;
use serde::Serialize;
use tower::Service;

/// HTTP request builder with fluent API
///
/// Created by [`HttpClient::get`], [`HttpClient::post`] and
/// [`HttpClient::put`]. Errors raised while building (bad header, query that
/// fails to encode) are deferred and returned by [`send()`](RequestBuilder::send).
///
/// # Example
///
/// ```ignore
/// #[derive(Serialize)]
/// struct LedgerQuery { page: u32, limit: u32, #[serde(skip_serializing_if = "Option::is_none")] user_id: Option<String> }
///
/// let resp = client
///     .get("https://api.example.com/ledger")
///     .query(&LedgerQuery { page: 1, limit: 20, user_id: None })
///     .send()
///     .await?;
///
/// let resp = client
///     .post("https://api.example.com/ledger/credit")
///     .json(&credit)?
///     .send()
///     .await?;
/// ```
///
/// [`HttpClient::get`]: crate::HttpClient::get
/// [`HttpClient::post`]: crate::HttpClient::post
/// [`HttpClient::put`]: crate::HttpClient::put
#[must_use = "RequestBuilder does nothing until .send() is called"]
pub struct RequestBuilder {
    service: BufferedService,
    max_body_size: usize,
    method: http::Method,
    url: String,
    headers: Vec<(http::header::HeaderName, http::header::HeaderValue)>,
    /// Serialized JSON body, if any
    body: Option<Bytes>,
    /// Error captured during building (deferred to `send()`)
    error: Option<HttpError>,
    transport_security: TransportSecurity,
}

impl RequestBuilder {
    pub(crate) fn new(
        service: BufferedService,
        max_body_size: usize,
        method: http::Method,
        url: String,
        transport_security: TransportSecurity,
    ) -> Self {
        Self {
            service,
            max_body_size,
            method,
            url,
            headers: Vec::new(),
            body: None,
            error: None,
            transport_security,
        }
    }

    /// Add a single header to the request
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if self.error.is_some() {
            return self;
        }

        match (
            http::header::HeaderName::try_from(name),
            http::header::HeaderValue::try_from(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.push((name, value));
            }
            (Err(e), _) => {
                self.error = Some(HttpError::InvalidHeaderName(e));
            }
            (_, Err(e)) => {
                self.error = Some(HttpError::InvalidHeaderValue(e));
            }
        }
        self
    }

    /// Append URL-encoded query parameters to the request URL.
    ///
    /// Accepts any value `serde_urlencoded` can encode: structs, maps or
    /// slices of pairs. Fields that serialize to nothing (`None` options)
    /// produce no pair, so unset filters never reach the server. Calling
    /// `query` more than once appends to the existing query string.
    pub fn query<T: Serialize + ?Sized>(mut self, query: &T) -> Self {
        if self.error.is_some() {
            return self;
        }

        match serde_urlencoded::to_string(query) {
            Ok(encoded) if encoded.is_empty() => {}
            Ok(encoded) => {
                let separator = if self.url.contains('?') { '&' } else { '?' };
                self.url.push(separator);
                self.url.push_str(&encoded);
            }
            Err(e) => self.error = Some(HttpError::UrlEncode(e)),
        }
        self
    }

    /// Set request body as JSON
    ///
    /// Sets `Content-Type: application/json` unless a Content-Type header was
    /// already provided.
    ///
    /// # Errors
    ///
    /// Returns a deferred builder error, or `HttpError::Json` if serialization fails.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, HttpError> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }

        self.body = Some(Bytes::from(serde_json::to_vec(body)?));
        Ok(self)
    }

    /// The URL this request will be sent to, including any query string.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Validate URL and scheme against the transport security configuration.
    fn validate_url(&self) -> Result<http::Uri, HttpError> {
        let uri: http::Uri =
            self.url
                .parse()
                .map_err(|e: http::uri::InvalidUri| HttpError::InvalidUri {
                    url: self.url.clone(),
                    kind: InvalidUriKind::ParseError,
                    reason: e.to_string(),
                })?;

        if uri.authority().is_none() {
            return Err(HttpError::InvalidUri {
                url: self.url.clone(),
                kind: InvalidUriKind::MissingAuthority,
                reason: "missing host/authority".to_owned(),
            });
        }

        match uri.scheme_str() {
            Some("https") => Ok(uri),
            Some("http") => match self.transport_security {
                TransportSecurity::AllowInsecureHttp => Ok(uri),
                TransportSecurity::TlsOnly => Err(HttpError::InvalidScheme {
                    scheme: "http".to_owned(),
                    reason: "HTTPS required (transport security is TlsOnly)".to_owned(),
                }),
            },
            Some(scheme) => Err(HttpError::InvalidScheme {
                scheme: scheme.to_owned(),
                reason: "only http:// and https:// schemes are supported".to_owned(),
            }),
            None => Err(HttpError::InvalidUri {
                url: self.url.clone(),
                kind: InvalidUriKind::MissingScheme,
                reason: "missing scheme".to_owned(),
            }),
        }
    }

    /// Send the request and return the response
    ///
    /// Returns `Ok` for every HTTP status; use [`HttpResponse::json`] or
    /// [`HttpResponse::checked_bytes`] to turn non-2xx into an error.
    ///
    /// # Errors
    ///
    /// Returns `HttpError` if:
    /// - Request building failed (invalid headers, query, URL, etc.)
    /// - URL scheme is invalid for the transport security mode
    /// - An auth layer rejected the request (`MissingCredentials`)
    /// - Network/transport error or timeout
    /// - Concurrency limit reached (`Overloaded`)
    pub async fn send(mut self) -> Result<HttpResponse, HttpError> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }

        let uri = self.validate_url()?;
        let mut builder = Request::builder().method(self.method).uri(uri);

        let has_content_type = self
            .headers
            .iter()
            .any(|(name, _)| name == http::header::CONTENT_TYPE);
        if self.body.is_some() && !has_content_type {
            builder = builder.header(http::header::CONTENT_TYPE, "application/json");
        }

        for (name, value) in self.headers {
            builder = builder.header(name, value);
        }

        let request = builder.body(Full::new(self.body.unwrap_or_default()))?;

        try_acquire_buffer_slot(&mut self.service).await?;

        let inner: Response<ResponseBody> =
            self.service.call(request).await.map_err(map_buffer_error)?;

        Ok(HttpResponse {
            inner,
            max_body_size: self.max_body_size,
        })
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use crate::HttpClient;
    use crate::config::HttpClientConfig;
    use crate::error::{HttpError, InvalidUriKind};
    use serde::Serialize;

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Filters {
        page: u32,
        limit: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        kyc_level: Option<u8>,
        #[serde(skip_serializing_if = "Option::is_none")]
        is_disabled: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        search: Option<String>,
    }

    fn client() -> HttpClient {
        crate::HttpClientBuilder::with_config(HttpClientConfig::for_testing())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_query_omits_unset_filters() {
        let req = client().get("http://localhost/admin/users").query(&Filters {
            page: 1,
            limit: 10,
            kyc_level: Some(2),
            is_disabled: Some(false),
            search: None,
        });
        assert_eq!(
            req.url(),
            "http://localhost/admin/users?page=1&limit=10&kycLevel=2&isDisabled=false"
        );
    }

    #[tokio::test]
    async fn test_query_appends_to_existing_query() {
        let req = client()
            .get("http://localhost/x?a=1")
            .query(&[("search", "jane doe")]);
        assert_eq!(req.url(), "http://localhost/x?a=1&search=jane+doe");
    }

    #[tokio::test]
    async fn test_empty_query_leaves_url_untouched() {
        let empty: [(&str, &str); 0] = [];
        let req = client().get("http://localhost/system-config").query(&empty);
        assert_eq!(req.url(), "http://localhost/system-config");
    }

    #[tokio::test]
    async fn test_query_encode_error_deferred_to_send() {
        // Nested values cannot be URL-encoded
        let nested = [("outer", [("inner", 1)])];
        let err = client()
            .get("http://localhost/x")
            .query(&nested)
            .send()
            .await
            .unwrap_err();
        assert!(matches!(err, HttpError::UrlEncode(_)));
    }

    #[tokio::test]
    async fn test_invalid_header_deferred_to_json() {
        let result = client()
            .post("http://localhost/x")
            .header("bad header", "v")
            .json(&serde_json::json!({}));
        assert!(matches!(result, Err(HttpError::InvalidHeaderName(_))));
    }

    #[tokio::test]
    async fn test_relative_url_rejected() {
        let err = client().get("/admin/users").send().await.unwrap_err();
        assert!(matches!(
            err,
            HttpError::InvalidUri {
                kind: InvalidUriKind::MissingAuthority,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_http_rejected_when_tls_only() {
        let client = crate::HttpClientBuilder::new().build().unwrap();
        let err = client.get("http://localhost/x").send().await.unwrap_err();
        assert!(matches!(err, HttpError::InvalidScheme { .. }));
    }
}
