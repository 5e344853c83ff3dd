use std::sync::Arc;

use adminkit_auth::{SessionStorage, StoredToken};
use adminkit_http::HttpClientConfig;

use crate::api::ApiClient;
use crate::error::ApiError;
use crate::resources::dashboard::DashboardStore;
use crate::resources::ledger::LedgerStore;
use crate::resources::notifications::NotificationsStore;
use crate::resources::system_config::SystemConfigStore;
use crate::resources::transactions::TransactionsStore;
use crate::resources::users::UsersStore;
use crate::session::AuthSession;

/// Every store of the admin console, wired to one API client and one session.
#[derive(Debug)]
pub struct AdminConsole {
    api: ApiClient,
    session: AuthSession,
    dashboard: DashboardStore,
    transactions: TransactionsStore,
    users: UsersStore,
    ledger: LedgerStore,
    notifications: NotificationsStore,
    system_config: SystemConfigStore,
}

impl AdminConsole {
    /// Build the stores and restore any persisted session from `storage`.
    #[must_use]
    pub fn new(api: ApiClient, storage: Arc<dyn SessionStorage>) -> Self {
        let session = AuthSession::new(api.clone(), storage);
        session.init();
        Self {
            dashboard: DashboardStore::new(api.clone()),
            transactions: TransactionsStore::new(&api),
            users: UsersStore::new(api.clone()),
            ledger: LedgerStore::new(api.clone(), session.clone()),
            notifications: NotificationsStore::new(api.clone()),
            system_config: SystemConfigStore::new(api.clone()),
            session,
            api,
        }
    }

    /// Build the API client for `base_url` (token read from `storage`) and
    /// the stores on top of it.
    ///
    /// # Errors
    /// See [`ApiClient::new`].
    pub fn connect(
        base_url: &str,
        http_config: &HttpClientConfig,
        storage: Arc<dyn SessionStorage>,
    ) -> Result<Self, ApiError> {
        let tokens = Arc::new(StoredToken::new(Arc::clone(&storage)));
        let api = ApiClient::new(base_url, http_config, tokens)?;
        Ok(Self::new(api, storage))
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    #[must_use]
    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    #[must_use]
    pub fn dashboard(&self) -> &DashboardStore {
        &self.dashboard
    }

    #[must_use]
    pub fn transactions(&self) -> &TransactionsStore {
        &self.transactions
    }

    #[must_use]
    pub fn users(&self) -> &UsersStore {
        &self.users
    }

    #[must_use]
    pub fn ledger(&self) -> &LedgerStore {
        &self.ledger
    }

    #[must_use]
    pub fn notifications(&self) -> &NotificationsStore {
        &self.notifications
    }

    #[must_use]
    pub fn system_config(&self) -> &SystemConfigStore {
        &self.system_config
    }

    /// Initial fetch of every slice of every page, concurrently.
    pub async fn mount(&self) {
        tokio::join!(
            self.dashboard.mount(),
            self.transactions.mount(),
            self.users.mount(),
            self.ledger.mount(),
            self.notifications.mount(),
            self.system_config.mount(),
        );
    }

    /// Cancel in-flight fetches on every store.
    pub fn close(&self) {
        self.dashboard.close();
        self.transactions.close();
        self.users.close();
        self.ledger.close();
        self.notifications.close();
        self.system_config.close();
    }
}
