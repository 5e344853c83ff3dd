use std::sync::Arc;

use adminkit_auth::{HttpClientBuilderExt, TokenSource};
use adminkit_http::{HttpClient, HttpClientBuilder, HttpClientConfig};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// Query for endpoints that take no parameters.
pub(crate) const NO_QUERY: &[(&str, &str)] = &[];

/// `{}` request body for action endpoints. A unit struct would serialize as `null`.
#[allow(clippy::empty_structs_with_brackets)]
#[derive(Debug, Clone, Copy, Serialize)]
pub(crate) struct EmptyBody {}

/// REST client bound to the admin API base URL.
///
/// Holds two transports: an anonymous one used only for login, and one that
/// runs every request through the bearer-auth layer. Cheap to clone.
#[derive(Clone)]
pub struct ApiClient {
    base_url: Arc<str>,
    public: HttpClient,
    authed: HttpClient,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Build a client for `base_url` (e.g. `https://api.example.com/v1`).
    ///
    /// # Errors
    /// Returns [`ApiError::Validation`] for a base URL that is not absolute
    /// `http(s)`, and [`ApiError::Transport`] if the HTTP stack cannot be built.
    pub fn new(
        base_url: &str,
        http_config: &HttpClientConfig,
        tokens: Arc<dyn TokenSource>,
    ) -> Result<Self, ApiError> {
        let parsed = url::Url::parse(base_url)
            .map_err(|e| ApiError::validation(format!("Invalid API base URL '{base_url}': {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.cannot_be_a_base() {
            return Err(ApiError::validation(format!(
                "Invalid API base URL '{base_url}': expected http(s)://host[/path]"
            )));
        }

        let public = HttpClientBuilder::with_config(http_config.clone())
            .build()
            .map_err(|e| ApiError::from_http(e, "Failed to initialise HTTP client"))?;
        let authed = HttpClientBuilder::with_config(http_config.clone())
            .with_bearer_auth(tokens)
            .build()
            .map_err(|e| ApiError::from_http(e, "Failed to initialise HTTP client"))?;

        Ok(Self {
            base_url: Arc::from(base_url.trim_end_matches('/')),
            public,
            authed,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path such as `/admin/users`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Authenticated `GET` decoding a JSON body.
    ///
    /// # Errors
    /// See [`ApiError::from_http`]; `fallback` is used when the server sends no message.
    pub async fn get<T, Q>(&self, path: &str, query: &Q, fallback: &str) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let url = self.url(path);
        tracing::debug!(%url, "GET");
        self.authed
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| ApiError::from_http(e, fallback))?
            .json()
            .await
            .map_err(|e| ApiError::from_http(e, fallback))
    }

    /// Authenticated `POST` with a JSON body; the response body is ignored.
    ///
    /// # Errors
    /// See [`ApiError::from_http`].
    pub async fn post<B>(&self, path: &str, body: &B, fallback: &str) -> Result<(), ApiError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(path);
        tracing::debug!(%url, "POST");
        let request = self
            .authed
            .post(&url)
            .json(body)
            .map_err(|e| ApiError::from_http(e, fallback))?;
        request
            .send()
            .await
            .map_err(|e| ApiError::from_http(e, fallback))?
            .checked_bytes()
            .await
            .map_err(|e| ApiError::from_http(e, fallback))?;
        Ok(())
    }

    /// Authenticated `PUT` with a JSON body; the response body is ignored.
    ///
    /// # Errors
    /// See [`ApiError::from_http`].
    pub async fn put<B>(&self, path: &str, body: &B, fallback: &str) -> Result<(), ApiError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(path);
        tracing::debug!(%url, "PUT");
        let request = self
            .authed
            .put(&url)
            .json(body)
            .map_err(|e| ApiError::from_http(e, fallback))?;
        request
            .send()
            .await
            .map_err(|e| ApiError::from_http(e, fallback))?
            .checked_bytes()
            .await
            .map_err(|e| ApiError::from_http(e, fallback))?;
        Ok(())
    }

    /// Anonymous `POST` decoding a JSON body. Only login goes through here.
    ///
    /// # Errors
    /// See [`ApiError::from_http`].
    pub async fn post_anonymous<B, T>(
        &self,
        path: &str,
        body: &B,
        fallback: &str,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        tracing::debug!(%url, "POST (anonymous)");
        let request = self
            .public
            .post(&url)
            .json(body)
            .map_err(|e| ApiError::from_http(e, fallback))?;
        request
            .send()
            .await
            .map_err(|e| ApiError::from_http(e, fallback))?
            .json()
            .await
            .map_err(|e| ApiError::from_http(e, fallback))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use adminkit_auth::{MemoryStorage, SessionStorage, StoredToken, TOKEN_KEY};
    use httpmock::prelude::*;
    use serde_json::json;

    fn client(base: &str, storage: Arc<MemoryStorage>) -> ApiClient {
        ApiClient::new(
            base,
            &HttpClientConfig::for_testing(),
            Arc::new(StoredToken::new(storage)),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn url_joins_without_double_slash() {
        let api = client("http://localhost:3000/api/", Arc::new(MemoryStorage::new()));
        assert_eq!(api.base_url(), "http://localhost:3000/api");
        assert_eq!(api.url("/ledger"), "http://localhost:3000/api/ledger");
        assert_eq!(api.url("ledger"), "http://localhost:3000/api/ledger");
    }

    #[tokio::test]
    async fn rejects_bad_base_url() {
        for bad in ["localhost:3000", "ftp://files.example.com", "not a url"] {
            let result = ApiClient::new(
                bad,
                &HttpClientConfig::for_testing(),
                Arc::new(StoredToken::new(Arc::new(MemoryStorage::new()))),
            );
            assert!(matches!(result, Err(ApiError::Validation(_))), "{bad}");
        }
    }

    #[tokio::test]
    async fn get_sends_bearer_and_decodes() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/analytics/users/trend")
                .query_param("days", "90")
                .header("authorization", "Bearer tok");
            then.status(200).json_body(json!([{"date": "2025-03-01", "count": 7}]));
        });

        let storage = Arc::new(MemoryStorage::new());
        storage.set(TOKEN_KEY, "tok").unwrap();
        let api = client(&server.base_url(), storage);

        let value: serde_json::Value = api
            .get("/analytics/users/trend", &[("days", 90)], "Failed to load user trends")
            .await
            .unwrap();
        mock.assert();
        assert_eq!(value[0]["count"], 7);
    }

    #[tokio::test]
    async fn post_error_uses_server_message() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/ledger/credit");
            then.status(400)
                .json_body(json!({"message": ["amount must be a positive number"]}));
        });

        let storage = Arc::new(MemoryStorage::new());
        storage.set(TOKEN_KEY, "tok").unwrap();
        let api = client(&server.base_url(), storage);

        let err = api
            .post("/ledger/credit", &json!({"amount": -1}), "Failed to credit ledger")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "amount must be a positive number");
        assert_eq!(err.status(), Some(http::StatusCode::BAD_REQUEST));
    }

    #[tokio::test]
    async fn authed_call_without_token_is_never_sent() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.any_request();
            then.status(200).json_body(json!([]));
        });

        let api = client(&server.base_url(), Arc::new(MemoryStorage::new()));
        let err = api
            .put("/system-config", &json!({"configs": []}), "Update failed")
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::NoCredentials));
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn anonymous_post_has_no_authorization_header() {
        let server = MockServer::start();
        let with_auth = server.mock(|when, then| {
            when.method(POST).path("/admin/auth/login").header_exists("authorization");
            then.status(500);
        });
        let anonymous = server.mock(|when, then| {
            when.method(POST).path("/admin/auth/login");
            then.status(200).json_body(json!({"ok": true}));
        });

        let storage = Arc::new(MemoryStorage::new());
        storage.set(TOKEN_KEY, "stale").unwrap();
        let api = client(&server.base_url(), storage);

        let value: serde_json::Value = api
            .post_anonymous("/admin/auth/login", &json!({"email": "a@b.c"}), "Login failed")
            .await
            .unwrap();
        assert_eq!(value["ok"], true);
        assert_eq!(with_auth.calls(), 0);
        assert_eq!(anonymous.calls(), 1);
    }

    #[tokio::test]
    async fn undecodable_body_is_transport_with_fallback() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/analytics/dashboard");
            then.status(200).body("not json");
        });

        let storage = Arc::new(MemoryStorage::new());
        storage.set(TOKEN_KEY, "tok").unwrap();
        let api = client(&server.base_url(), storage);

        let err = api
            .get::<serde_json::Value, _>("/analytics/dashboard", NO_QUERY, "Failed to load dashboard")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Transport { .. }));
        assert_eq!(err.to_string(), "Failed to load dashboard");
    }
}
