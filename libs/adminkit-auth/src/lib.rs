#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Session persistence and bearer-token injection for the admin console.
//!
//! The session identity and token live in a [`SessionStorage`]. Outbound
//! requests read the token through a [`TokenSource`] on every call and fail
//! with `HttpError::MissingCredentials` when there is none, so an
//! authenticated endpoint is never hit anonymously.

pub mod builder_ext;
pub mod error;
pub mod layer;
pub mod secret;
pub mod storage;
pub mod token;

pub use builder_ext::HttpClientBuilderExt;
pub use error::StorageError;
pub use layer::{BearerAuthLayer, BearerAuthService};
pub use secret::SecretString;
pub use storage::{FileStorage, IDENTITY_KEY, MemoryStorage, SessionStorage, TOKEN_KEY};
pub use token::{StoredToken, TokenSource};
