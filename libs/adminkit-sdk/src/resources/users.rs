use futures_core::Stream;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::SortOrder;
use crate::api::{ApiClient, EmptyBody, NO_QUERY};
use crate::error::ApiError;
use crate::page::Page;
use crate::pager::PagesPager;
use crate::store::ResourceStore;

string_enum! {
    pub enum UserSort: "sort field" {
        CreatedAt => "createdAt",
        LastLoginAt => "lastLoginAt",
    }
}

string_enum! {
    pub enum BvnStatus: "BVN status" {
        Pending => "pending",
        Verified => "verified",
        Failed => "failed",
    }
}

/// Highest KYC tier a user can reach.
pub const MAX_KYC_LEVEL: u8 = 2;

/// A platform user. Nested collections are passed through untyped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(deserialize_with = "crate::lenient::id")]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub reward_point: Option<Decimal>,
    #[serde(default)]
    pub kyc_level: u8,
    #[serde(default)]
    pub is_disabled: bool,
    #[serde(default)]
    pub date_created: Option<String>,
    #[serde(default)]
    pub wallets: Vec<serde_json::Value>,
    #[serde(default)]
    pub bank_accounts: Vec<serde_json::Value>,
    #[serde(default)]
    pub transactions: Vec<serde_json::Value>,
    #[serde(default)]
    pub login_logs: Vec<serde_json::Value>,
}

/// Filters for the user list. Unset filters are left out of the URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    pub page: u32,
    pub limit: u32,
    pub sort: UserSort,
    pub order: SortOrder,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kyc_level: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_disabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_deleted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bvn_status: Option<BvnStatus>,
}

impl Default for UserQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            sort: UserSort::CreatedAt,
            order: SortOrder::Desc,
            search: None,
            kyc_level: None,
            is_disabled: None,
            is_deleted: None,
            bvn_status: None,
        }
    }
}

impl UserQuery {
    fn validate(&self) -> Result<(), ApiError> {
        match self.kyc_level {
            Some(level) if level > MAX_KYC_LEVEL => Err(ApiError::validation(format!(
                "KYC level must be between 0 and {MAX_KYC_LEVEL}"
            ))),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: String,
    #[serde(default, deserialize_with = "crate::lenient::count")]
    pub count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrendQuery {
    pub days: u32,
}

impl Default for TrendQuery {
    fn default() -> Self {
        Self { days: 90 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopActiveUser {
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default, deserialize_with = "crate::lenient::count")]
    pub transaction_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopVolumeUser {
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub total_amount: Decimal,
}

/// Leaderboards by transaction count and by volume.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopUsers {
    pub active: Vec<TopActiveUser>,
    pub volume: Vec<TopVolumeUser>,
}

/// `GET /admin/users`
///
/// # Errors
/// [`ApiError::Validation`] for an out-of-range KYC level, otherwise see
/// [`ApiError`]; fallback "Failed to load users".
pub async fn list_users(api: &ApiClient, query: &UserQuery) -> Result<Page<User>, ApiError> {
    query.validate()?;
    api.get("/admin/users", query, "Failed to load users").await
}

/// `GET /analytics/users/trend`
///
/// # Errors
/// See [`ApiError`].
pub async fn user_trend(api: &ApiClient, query: &TrendQuery) -> Result<Vec<TrendPoint>, ApiError> {
    api.get("/analytics/users/trend", query, "Failed to load user trends")
        .await
}

/// Both leaderboards, requested concurrently. Either failing fails the pair.
///
/// # Errors
/// See [`ApiError`]; fallback "Failed to load top users".
pub async fn top_users(api: &ApiClient) -> Result<TopUsers, ApiError> {
    let (active, volume) = futures::try_join!(
        api.get("/analytics/users/top-active", NO_QUERY, "Failed to load top users"),
        api.get("/analytics/users/top-volume", NO_QUERY, "Failed to load top users"),
    )?;
    Ok(TopUsers { active, volume })
}

/// `POST /admin/users/{id}/enable|disable`
///
/// # Errors
/// See [`ApiError`]; fallback "Failed to update user status".
pub async fn set_user_enabled(api: &ApiClient, id: &str, enabled: bool) -> Result<(), ApiError> {
    let id = id.trim();
    if id.is_empty() || id.contains('/') {
        return Err(ApiError::validation(format!("Invalid user id '{id}'")));
    }
    let action = if enabled { "enable" } else { "disable" };
    api.post(
        &format!("/admin/users/{id}/{action}"),
        &EmptyBody {},
        "Failed to update user status",
    )
    .await
}

/// Users page state: the list plus two analytics slices.
#[derive(Debug, Clone)]
pub struct UsersStore {
    api: ApiClient,
    list: ResourceStore<Page<User>, UserQuery>,
    trend: ResourceStore<Vec<TrendPoint>, TrendQuery>,
    top: ResourceStore<TopUsers, ()>,
}

impl UsersStore {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        let list_api = api.clone();
        let trend_api = api.clone();
        let top_api = api.clone();
        Self {
            list: ResourceStore::new("users.list", UserQuery::default(), move |query: UserQuery| {
                let api = list_api.clone();
                async move { list_users(&api, &query).await }
            }),
            trend: ResourceStore::new("users.trend", TrendQuery::default(), move |query: TrendQuery| {
                let api = trend_api.clone();
                async move { user_trend(&api, &query).await }
            }),
            top: ResourceStore::new("users.top", (), move |()| {
                let api = top_api.clone();
                async move { top_users(&api).await }
            }),
            api,
        }
    }

    #[must_use]
    pub fn list(&self) -> &ResourceStore<Page<User>, UserQuery> {
        &self.list
    }

    #[must_use]
    pub fn trend(&self) -> &ResourceStore<Vec<TrendPoint>, TrendQuery> {
        &self.trend
    }

    #[must_use]
    pub fn top(&self) -> &ResourceStore<TopUsers, ()> {
        &self.top
    }

    /// Enable or disable a user, then refetch the list.
    ///
    /// # Errors
    /// See [`set_user_enabled`].
    pub async fn set_enabled(&self, id: &str, enabled: bool) -> Result<(), ApiError> {
        self.list
            .mutate(|| set_user_enabled(&self.api, id, enabled))
            .await
    }

    /// Stream every page of the list matching `query`, starting at `query.page`.
    pub fn pages(
        &self,
        query: UserQuery,
    ) -> impl Stream<Item = Result<Page<User>, ApiError>> + Send + use<> {
        let api = self.api.clone();
        PagesPager::new(query.page, move |page| {
            let api = api.clone();
            let query = UserQuery { page, ..query.clone() };
            async move { list_users(&api, &query).await }
        })
    }

    pub async fn mount(&self) {
        tokio::join!(
            self.list.fetch(UserQuery::default()),
            self.trend.fetch(TrendQuery::default()),
            self.top.fetch(()),
        );
    }

    pub fn close(&self) {
        self.list.close();
        self.trend.close();
        self.top.close();
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::test_support::authed_api;
    use futures_util::StreamExt;
    use httpmock::prelude::*;
    use serde_json::json;

    fn user(id: u32) -> serde_json::Value {
        json!({
            "id": format!("u{id}"),
            "email": format!("user{id}@example.com"),
            "fullName": format!("User {id}"),
            "rewardPoint": "10.5",
            "kycLevel": 2,
            "isDisabled": false,
            "wallets": [{"asset": "BTC"}]
        })
    }

    #[test]
    fn default_query_serializes_defaults_only() {
        let value = serde_json::to_value(UserQuery::default()).unwrap();
        assert_eq!(
            value,
            json!({"page": 1, "limit": 10, "sort": "createdAt", "order": "DESC"})
        );
    }

    #[tokio::test]
    async fn out_of_range_kyc_level_is_rejected_locally() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.any_request();
            then.status(200);
        });
        let api = authed_api(&server.base_url());

        let query = UserQuery {
            kyc_level: Some(3),
            ..UserQuery::default()
        };
        let err = list_users(&api, &query).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn top_users_fetches_both_boards() {
        let server = MockServer::start();
        let active = server.mock(|when, then| {
            when.method(GET).path("/analytics/users/top-active");
            then.status(200)
                .json_body(json!([{"user": "a@x.com", "transactionCount": "12"}, {"user": null, "transactionCount": 3}]));
        });
        let volume = server.mock(|when, then| {
            when.method(GET).path("/analytics/users/top-volume");
            then.status(200).json_body(json!([{"user": "b@x.com", "totalAmount": "99000.50"}]));
        });

        let store = UsersStore::new(authed_api(&server.base_url()));
        store.top().fetch(()).await;

        active.assert();
        volume.assert();
        let top = store.top().snapshot().data.unwrap();
        assert_eq!(top.active[0].transaction_count, 12);
        assert_eq!(top.active[1].user, None);
        assert_eq!(top.volume[0].user.as_deref(), Some("b@x.com"));
    }

    #[tokio::test]
    async fn one_failing_board_fails_the_slice() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.path("/analytics/users/top-active");
            then.status(200).json_body(json!([]));
        });
        server.mock(|when, then| {
            when.path("/analytics/users/top-volume");
            then.status(503).body("");
        });

        let store = UsersStore::new(authed_api(&server.base_url()));
        store.top().fetch(()).await;
        assert_eq!(store.top().snapshot().error.as_deref(), Some("Failed to load top users"));
    }

    #[tokio::test]
    async fn trend_uses_ninety_days_by_default() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.path("/analytics/users/trend").query_param("days", "90");
            then.status(200).json_body(json!([{"date": "2025-03-01", "count": "4"}]));
        });

        let store = UsersStore::new(authed_api(&server.base_url()));
        store.trend().fetch(TrendQuery::default()).await;

        mock.assert();
        assert_eq!(store.trend().snapshot().data.unwrap()[0].count, 4);
    }

    #[tokio::test]
    async fn disable_posts_action_and_refetches_list() {
        let server = MockServer::start();
        let list = server.mock(|when, then| {
            when.method(GET).path("/admin/users").query_param("search", "user1");
            then.status(200)
                .json_body(json!({"total": 1, "page": 1, "limit": 10, "totalPages": 1, "data": [user(1)]}));
        });
        let disable = server.mock(|when, then| {
            when.method(POST).path("/admin/users/u1/disable").json_body(json!({}));
            then.status(201).json_body(json!({"success": true}));
        });

        let store = UsersStore::new(authed_api(&server.base_url()));
        store
            .list()
            .fetch(UserQuery {
                search: Some("user1".to_owned()),
                ..UserQuery::default()
            })
            .await;
        store.set_enabled("u1", false).await.unwrap();

        disable.assert();
        assert_eq!(list.calls(), 2);
    }

    #[tokio::test]
    async fn failed_status_change_keeps_list() {
        let server = MockServer::start();
        let list = server.mock(|when, then| {
            when.method(GET).path("/admin/users");
            then.status(200)
                .json_body(json!({"total": 1, "page": 1, "limit": 10, "totalPages": 1, "data": [user(1)]}));
        });
        server.mock(|when, then| {
            when.method(POST).path("/admin/users/u1/enable");
            then.status(404).json_body(json!({"message": "User not found"}));
        });

        let store = UsersStore::new(authed_api(&server.base_url()));
        store.list().fetch(UserQuery::default()).await;
        let before = store.list().snapshot();

        let err = store.set_enabled("u1", true).await.unwrap_err();
        assert_eq!(err.to_string(), "User not found");
        assert_eq!(list.calls(), 1);
        assert_eq!(store.list().snapshot(), before);
    }

    #[tokio::test]
    async fn pages_streams_whole_listing() {
        let server = MockServer::start();
        let first = server.mock(|when, then| {
            when.path("/admin/users").query_param("page", "1").query_param("limit", "2");
            then.status(200).json_body(
                json!({"total": 3, "page": "1", "limit": "2", "totalPages": 2, "data": [user(1), user(2)]}),
            );
        });
        let second = server.mock(|when, then| {
            when.path("/admin/users").query_param("page", "2").query_param("limit", "2");
            then.status(200)
                .json_body(json!({"total": 3, "page": "2", "limit": "2", "totalPages": 2, "data": [user(3)]}));
        });

        let store = UsersStore::new(authed_api(&server.base_url()));
        let pages: Vec<_> = store
            .pages(UserQuery {
                limit: 2,
                ..UserQuery::default()
            })
            .collect()
            .await;

        first.assert();
        second.assert();
        let emails: Vec<String> = pages
            .into_iter()
            .flat_map(|p| p.unwrap().items)
            .map(|u| u.email)
            .collect();
        assert_eq!(emails.len(), 3);
        assert_eq!(emails[2], "user3@example.com");
    }
}
