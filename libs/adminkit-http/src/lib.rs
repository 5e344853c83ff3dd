#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! HTTP client infrastructure for the admin console
//!
//! This crate provides a hyper-based HTTP client with:
//! - Automatic TLS via rustls (HTTPS only by default)
//! - Connection pooling
//! - Per-request timeouts
//! - Default `User-Agent` / `Accept` header injection
//! - Concurrency limiting with fail-fast load shedding
//! - Transparent response decompression (gzip, brotli, deflate)
//! - A pluggable auth layer slot (see [`HttpClientBuilder::with_auth_layer`])
//!
//! Query strings are composed from any `Serialize` value with
//! [`RequestBuilder::query`]; `None` fields are left out of the URL.
//!
//! # Example
//!
//! ```ignore
//! use adminkit_http::{HttpClientBuilder, HttpClientConfig};
//! use std::time::Duration;
//!
//! let config = HttpClientConfig {
//!     request_timeout: Duration::from_secs(10),
//!     ..HttpClientConfig::default()
//! };
//! let client = HttpClientBuilder::with_config(config)
//!     .user_agent("admin-console/0.1")
//!     .build()?;
//!
//! let page: UsersPage = client
//!     .get("https://api.example.com/admin/users")
//!     .query(&[("page", "1"), ("limit", "10")])
//!     .send()
//!     .await?
//!     .json()
//!     .await?;
//! ```

mod builder;
mod client;
mod config;
mod connector;
mod error;
mod layers;
mod request;
mod response;

pub use builder::{HttpClientBuilder, InnerService};
pub use client::HttpClient;
pub use config::{DEFAULT_USER_AGENT, HttpClientConfig, RateLimitConfig, TransportSecurity};
pub use error::{HttpError, InvalidUriKind};
pub use layers::{DefaultHeadersLayer, DefaultHeadersService};
pub use request::RequestBuilder;
pub use response::{ERROR_BODY_PREVIEW_LIMIT, HttpResponse, ResponseBody};
