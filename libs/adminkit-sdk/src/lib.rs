#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! # `adminkit-sdk` - client-side state for the admin console
//!
//! - [`AuthSession`] - login, logout, password change; identity and token
//!   persisted through [`adminkit_auth::SessionStorage`]
//! - [`ApiClient`] - REST calls with bearer auth and uniform [`ApiError`]s
//! - [`ResourceStore`] - one remote resource slice with loading/error state,
//!   last-request-wins ordering and refetch-after-mutate
//! - [`resources`] - the dashboard, transactions, users, ledger,
//!   notifications and system-config stores
//! - [`AdminConsole`] - all of the above wired together
//!
//! ## Example
//!
//! ```rust,ignore
//! use adminkit_auth::FileStorage;
//! use adminkit_http::HttpClientConfig;
//! use adminkit_sdk::AdminConsole;
//!
//! let storage = Arc::new(FileStorage::new(path));
//! let console = AdminConsole::connect("https://api.example.com", &HttpClientConfig::default(), storage)?;
//! console.session().login("ops@example.com", "secret").await?;
//!
//! console.ledger().mount().await;
//! console.ledger().credit("goodwill", Decimal::from(500)).await?;
//! let entries = console.ledger().entries().snapshot();
//! ```

pub mod api;
pub mod console;
pub mod error;
pub mod identity;
mod lenient;
pub mod page;
pub mod pager;
pub mod resources;
pub mod session;
pub mod store;

pub use api::ApiClient;
pub use console::AdminConsole;
pub use error::ApiError;
pub use identity::Identity;
pub use page::Page;
pub use pager::PagesPager;
pub use session::{AuthSession, AuthState, MIN_PASSWORD_LEN};
pub use store::{Phase, ResourceState, ResourceStore};
