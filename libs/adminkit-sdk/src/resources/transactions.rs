use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::api::{ApiClient, NO_QUERY};
use crate::error::ApiError;
use crate::page::Page;
use crate::store::ResourceStore;

string_enum! {
    pub enum TransactionStatus: "transaction status" {
        Pending => "PENDING",
        Processing => "PROCESSING",
        Successful => "SUCCESSFUL",
        Failed => "FAILED",
        Cancelled => "CANCELLED",
    }
}

string_enum! {
    /// Swap direction.
    pub enum TransactionType: "transaction type" {
        CryptoToCash => "CRYPTO_TO_CASH",
        CashToCrypto => "CASH_TO_CRYPTO",
    }
}

/// A swap as listed in the transaction log.
///
/// Status and type are kept as received so an unexpected value does not fail
/// the whole page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub email: String,
    pub asset: String,
    #[serde(default)]
    pub network: Option<String>,
    pub amount: Decimal,
    #[serde(default)]
    pub exchange_rate: Option<Decimal>,
    #[serde(default)]
    pub converted_amount: Option<Decimal>,
    pub status: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "created_at")]
    pub created_at: String,
    #[serde(rename = "meta_data", default)]
    pub meta_data: Option<serde_json::Value>,
}

/// Filters for the transaction log. Unset filters are left out of the URL.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionQuery {
    pub page: u32,
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TransactionStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<TransactionType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

impl Default for TransactionQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            status: None,
            asset: None,
            kind: None,
            start_date: None,
            end_date: None,
        }
    }
}

/// Headline counts by status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionCards {
    #[serde(default, deserialize_with = "crate::lenient::count")]
    pub total: u64,
    #[serde(default, deserialize_with = "crate::lenient::count")]
    pub successful: u64,
    #[serde(default, deserialize_with = "crate::lenient::count")]
    pub pending: u64,
    #[serde(default, deserialize_with = "crate::lenient::count")]
    pub failed: u64,
    #[serde(default, deserialize_with = "crate::lenient::count")]
    pub cancelled: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetSummary {
    pub asset: String,
    #[serde(default, deserialize_with = "crate::lenient::count")]
    pub count: u64,
    #[serde(default)]
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetNetwork {
    pub name: String,
    pub value: String,
}

/// An asset the platform trades, with its price bands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportedAsset {
    pub code: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub networks: Vec<AssetNetwork>,
    #[serde(default)]
    pub usd_buy_price: Option<Decimal>,
    #[serde(default)]
    pub usd_sell_price: Option<Decimal>,
    #[serde(default)]
    pub ngn_buy_price: Option<Decimal>,
    #[serde(default)]
    pub ngn_sell_price: Option<Decimal>,
    #[serde(default)]
    pub min_buy_value: Option<Decimal>,
    #[serde(default)]
    pub max_buy_value: Option<Decimal>,
    #[serde(default)]
    pub min_sell_value: Option<Decimal>,
    #[serde(default)]
    pub max_sell_value: Option<Decimal>,
}

/// One day of the per-asset series; `values` maps asset code to volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetDailyPoint {
    pub date: String,
    #[serde(flatten)]
    pub values: BTreeMap<String, Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetDailySeries {
    #[serde(default)]
    pub assets: Vec<String>,
    #[serde(default)]
    pub days: Vec<String>,
    #[serde(default)]
    pub dataset: Vec<AssetDailyPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AssetDailyQuery {
    pub days: u32,
    #[serde(rename = "type")]
    pub kind: TransactionType,
}

impl Default for AssetDailyQuery {
    fn default() -> Self {
        Self {
            days: 7,
            kind: TransactionType::CryptoToCash,
        }
    }
}

/// `GET /admin/analytics/transactions/transactions/logs`
///
/// # Errors
/// See [`ApiError`]; fallback "Failed to load transactions".
pub async fn list_transactions(
    api: &ApiClient,
    query: &TransactionQuery,
) -> Result<Page<Transaction>, ApiError> {
    api.get(
        "/admin/analytics/transactions/transactions/logs",
        query,
        "Failed to load transactions",
    )
    .await
}

/// `GET /admin/analytics/transactions/dashboard`
///
/// # Errors
/// See [`ApiError`].
pub async fn transaction_cards(api: &ApiClient) -> Result<TransactionCards, ApiError> {
    api.get(
        "/admin/analytics/transactions/dashboard",
        NO_QUERY,
        "Failed to load transaction cards",
    )
    .await
}

/// `GET /admin/analytics/transactions/transactions/summary-by-asset`
///
/// # Errors
/// See [`ApiError`].
pub async fn asset_summary(api: &ApiClient) -> Result<Vec<AssetSummary>, ApiError> {
    api.get(
        "/admin/analytics/transactions/transactions/summary-by-asset",
        NO_QUERY,
        "Failed to load asset summary",
    )
    .await
}

/// `GET /analytics/assets`
///
/// # Errors
/// See [`ApiError`].
pub async fn supported_assets(api: &ApiClient) -> Result<Vec<SupportedAsset>, ApiError> {
    api.get("/analytics/assets", NO_QUERY, "Failed to load supported assets")
        .await
}

/// `GET /analytics/transactions/by-asset-days`
///
/// # Errors
/// See [`ApiError`].
pub async fn asset_daily(
    api: &ApiClient,
    query: &AssetDailyQuery,
) -> Result<AssetDailySeries, ApiError> {
    api.get(
        "/analytics/transactions/by-asset-days",
        query,
        "Failed to load daily asset data",
    )
    .await
}

/// Transactions page state, one slice per panel.
#[derive(Debug, Clone)]
pub struct TransactionsStore {
    recent: ResourceStore<Page<Transaction>, TransactionQuery>,
    cards: ResourceStore<TransactionCards, ()>,
    asset_summary: ResourceStore<Vec<AssetSummary>, ()>,
    supported_assets: ResourceStore<Vec<SupportedAsset>, ()>,
    asset_daily: ResourceStore<AssetDailySeries, AssetDailyQuery>,
}

impl TransactionsStore {
    #[must_use]
    pub fn new(api: &ApiClient) -> Self {
        let recent_api = api.clone();
        let cards_api = api.clone();
        let summary_api = api.clone();
        let assets_api = api.clone();
        let daily_api = api.clone();
        Self {
            recent: ResourceStore::new(
                "transactions.recent",
                TransactionQuery::default(),
                move |query: TransactionQuery| {
                    let api = recent_api.clone();
                    async move { list_transactions(&api, &query).await }
                },
            ),
            cards: ResourceStore::new("transactions.cards", (), move |()| {
                let api = cards_api.clone();
                async move { transaction_cards(&api).await }
            }),
            asset_summary: ResourceStore::new("transactions.asset_summary", (), move |()| {
                let api = summary_api.clone();
                async move { asset_summary(&api).await }
            }),
            supported_assets: ResourceStore::new("transactions.supported_assets", (), move |()| {
                let api = assets_api.clone();
                async move { supported_assets(&api).await }
            }),
            asset_daily: ResourceStore::new(
                "transactions.asset_daily",
                AssetDailyQuery::default(),
                move |query: AssetDailyQuery| {
                    let api = daily_api.clone();
                    async move { asset_daily(&api, &query).await }
                },
            ),
        }
    }

    #[must_use]
    pub fn recent(&self) -> &ResourceStore<Page<Transaction>, TransactionQuery> {
        &self.recent
    }

    #[must_use]
    pub fn cards(&self) -> &ResourceStore<TransactionCards, ()> {
        &self.cards
    }

    #[must_use]
    pub fn asset_summary(&self) -> &ResourceStore<Vec<AssetSummary>, ()> {
        &self.asset_summary
    }

    #[must_use]
    pub fn supported_assets(&self) -> &ResourceStore<Vec<SupportedAsset>, ()> {
        &self.supported_assets
    }

    #[must_use]
    pub fn asset_daily(&self) -> &ResourceStore<AssetDailySeries, AssetDailyQuery> {
        &self.asset_daily
    }

    /// Initial fetch of every slice, concurrently.
    pub async fn mount(&self) {
        tokio::join!(
            self.recent.fetch(TransactionQuery::default()),
            self.cards.fetch(()),
            self.asset_summary.fetch(()),
            self.supported_assets.fetch(()),
            self.asset_daily.fetch(AssetDailyQuery::default()),
        );
    }

    pub fn close(&self) {
        self.recent.close();
        self.cards.close();
        self.asset_summary.close();
        self.supported_assets.close();
        self.asset_daily.close();
    }
}
