use std::sync::Arc;

use crate::secret::SecretString;
use crate::storage::{SessionStorage, TOKEN_KEY};

/// Supplies the bearer token for an outbound request.
///
/// Implementations are queried once per request, so a rotated token takes
/// effect on the next call.
pub trait TokenSource: Send + Sync {
    /// Current token, or `None` when there is no usable credential.
    fn bearer_token(&self) -> Option<SecretString>;
}

/// Token read straight from [`SessionStorage`] on every call.
#[derive(Clone)]
pub struct StoredToken {
    storage: Arc<dyn SessionStorage>,
}

impl StoredToken {
    #[must_use]
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self { storage }
    }
}

impl std::fmt::Debug for StoredToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredToken").finish_non_exhaustive()
    }
}

impl TokenSource for StoredToken {
    fn bearer_token(&self) -> Option<SecretString> {
        match self.storage.get(TOKEN_KEY) {
            Ok(Some(raw)) => {
                let token = SecretString::from(raw);
                (!token.is_blank()).then_some(token)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read bearer token from session storage");
                None
            }
        }
    }
}
