use futures_core::Stream;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::api::ApiClient;
use crate::error::ApiError;
use crate::page::Page;
use crate::pager::PagesPager;
use crate::session::AuthSession;
use crate::store::ResourceStore;

string_enum! {
    /// Ledger entry side.
    pub enum EntryType: "entry type" {
        Credit => "CR",
        Debit => "DR",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    #[serde(deserialize_with = "crate::lenient::id")]
    pub id: String,
    #[serde(default, deserialize_with = "crate::lenient::opt_text")]
    pub user_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: EntryType,
    #[serde(default)]
    pub description: String,
    pub amount: Decimal,
    #[serde(default)]
    pub balance: Option<Decimal>,
    pub created_at: String,
}

/// Filters for the ledger. Unset filters are left out of the URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerQuery {
    pub page: u32,
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<EntryType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

impl Default for LedgerQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 20,
            user_id: None,
            kind: None,
            start_date: None,
            end_date: None,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreditRequest<'a> {
    admin_id: &'a str,
    description: &'a str,
    #[serde(serialize_with = "crate::lenient::decimal_as_number")]
    amount: Decimal,
}

/// `GET /ledger`
///
/// # Errors
/// See [`ApiError`]; fallback "Failed to load ledger".
pub async fn list_entries(api: &ApiClient, query: &LedgerQuery) -> Result<Page<LedgerEntry>, ApiError> {
    api.get("/ledger", query, "Failed to load ledger").await
}

/// Ledger page state. Credits are attributed to the signed-in admin.
#[derive(Debug, Clone)]
pub struct LedgerStore {
    api: ApiClient,
    session: AuthSession,
    entries: ResourceStore<Page<LedgerEntry>, LedgerQuery>,
}

impl LedgerStore {
    #[must_use]
    pub fn new(api: ApiClient, session: AuthSession) -> Self {
        let entries_api = api.clone();
        Self {
            entries: ResourceStore::new("ledger.entries", LedgerQuery::default(), move |query: LedgerQuery| {
                let api = entries_api.clone();
                async move { list_entries(&api, &query).await }
            }),
            api,
            session,
        }
    }

    #[must_use]
    pub fn entries(&self) -> &ResourceStore<Page<LedgerEntry>, LedgerQuery> {
        &self.entries
    }

    /// Post a manual credit, then refetch the entries.
    ///
    /// # Errors
    /// - [`ApiError::Validation`] for a blank description or an amount that is
    ///   not positive (nothing is sent);
    /// - [`ApiError::NoCredentials`] when no admin is signed in;
    /// - otherwise the server's message or "Failed to credit ledger".
    pub async fn credit(&self, description: &str, amount: Decimal) -> Result<(), ApiError> {
        let description = description.trim();
        if description.is_empty() {
            return Err(ApiError::validation("All fields are required"));
        }
        if amount <= Decimal::ZERO {
            return Err(ApiError::validation("Amount must be greater than zero"));
        }
        let admin = self.session.identity().ok_or(ApiError::NoCredentials)?;

        let body = CreditRequest {
            admin_id: &admin.id,
            description,
            amount: amount.normalize(),
        };
        self.entries
            .mutate(|| self.api.post("/ledger/credit", &body, "Failed to credit ledger"))
            .await
    }

    /// Stream every page of entries matching `query`.
    pub fn pages(
        &self,
        query: LedgerQuery,
    ) -> impl Stream<Item = Result<Page<LedgerEntry>, ApiError>> + Send + use<> {
        let api = self.api.clone();
        PagesPager::new(query.page, move |page| {
            let api = api.clone();
            let query = LedgerQuery { page, ..query.clone() };
            async move { list_entries(&api, &query).await }
        })
    }

    pub async fn mount(&self) {
        self.entries.fetch(LedgerQuery::default()).await;
    }

    pub fn close(&self) {
        self.entries.close();
    }
}
