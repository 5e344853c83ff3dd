//! Tower layers for HTTP client middleware
//!
//! - [`DefaultHeadersLayer`] - Adds `User-Agent`/`Accept` headers unless the caller set them

mod default_headers;

pub use default_headers::{DefaultHeadersLayer, DefaultHeadersService};
