use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::api::{ApiClient, NO_QUERY};
use crate::error::ApiError;
use crate::store::ResourceStore;

string_enum! {
    /// Direction of a period-over-period change.
    pub enum TrendDirection: "trend direction" {
        Up => "up",
        Down => "down",
        Neutral => "neutral",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub value: Decimal,
    pub direction: TrendDirection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardChanges {
    #[serde(default)]
    pub registered_today: Option<Trend>,
    #[serde(default)]
    pub registered_this_month: Option<Trend>,
    #[serde(default)]
    pub registered_this_year: Option<Trend>,
    #[serde(default)]
    pub total_users: Option<Trend>,
    #[serde(default)]
    pub active_users: Option<Trend>,
}

/// User-base headline numbers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    #[serde(default, deserialize_with = "crate::lenient::count")]
    pub total_users: u64,
    #[serde(default, deserialize_with = "crate::lenient::count")]
    pub active_users: u64,
    #[serde(default, deserialize_with = "crate::lenient::count")]
    pub deleted_accounts: u64,
    #[serde(default, deserialize_with = "crate::lenient::count")]
    pub registered_today: u64,
    #[serde(default, deserialize_with = "crate::lenient::count")]
    pub registered_this_month: u64,
    #[serde(default, deserialize_with = "crate::lenient::count")]
    pub registered_this_year: u64,
    #[serde(default)]
    pub changes: DashboardChanges,
}

#[derive(Deserialize)]
struct SummaryEnvelope {
    summary: DashboardSummary,
}

/// `GET /analytics/dashboard`
///
/// # Errors
/// See [`ApiError`]; fallback message "Failed to load dashboard".
pub async fn fetch_summary(api: &ApiClient) -> Result<DashboardSummary, ApiError> {
    let envelope: SummaryEnvelope = api
        .get("/analytics/dashboard", NO_QUERY, "Failed to load dashboard")
        .await?;
    Ok(envelope.summary)
}

/// Dashboard page state: a single summary slice.
#[derive(Debug, Clone)]
pub struct DashboardStore {
    summary: ResourceStore<DashboardSummary, ()>,
}

impl DashboardStore {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self {
            summary: ResourceStore::new("dashboard.summary", (), move |()| {
                let api = api.clone();
                async move { fetch_summary(&api).await }
            }),
        }
    }

    #[must_use]
    pub fn summary(&self) -> &ResourceStore<DashboardSummary, ()> {
        &self.summary
    }

    pub async fn mount(&self) {
        self.summary.fetch(()).await;
    }

    pub fn close(&self) {
        self.summary.close();
    }
}
