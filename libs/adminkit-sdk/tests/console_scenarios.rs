#![allow(clippy::unwrap_used, clippy::expect_used, clippy::use_debug)]

//! End-to-end scenarios for the console against a mocked admin API.

use std::sync::Arc;

use adminkit_auth::{FileStorage, MemoryStorage, SessionStorage, TOKEN_KEY};
use adminkit_http::HttpClientConfig;
use adminkit_sdk::resources::ledger::{EntryType, LedgerQuery};
use adminkit_sdk::resources::notifications::NotificationDraft;
use adminkit_sdk::resources::system_config::ConfigStatus;
use adminkit_sdk::resources::users::UserQuery;
use adminkit_sdk::{AdminConsole, Phase};
use httpmock::prelude::*;
use rust_decimal::Decimal;
use serde_json::{Value, json};

fn connect(server: &MockServer, storage: Arc<dyn SessionStorage>) -> AdminConsole {
    AdminConsole::connect(&server.base_url(), &HttpClientConfig::for_testing(), storage).unwrap()
}

fn mock_login(server: &MockServer) {
    server.mock(|when, then| {
        when.method(POST)
            .path("/admin/auth/login")
            .json_body(json!({"email": "ops@example.com", "password": "correct-horse"}));
        then.status(200).json_body(json!({
            "admin": {"id": "a1", "email": "ops@example.com", "name": "Ops", "role": "ADMIN"},
            "token": "tok-1"
        }));
    });
}

async fn logged_in_console(server: &MockServer) -> AdminConsole {
    mock_login(server);
    let console = connect(server, Arc::new(MemoryStorage::new()));
    console
        .session()
        .login("ops@example.com", "correct-horse")
        .await
        .unwrap();
    console
}

/// 25 users; the ones with index divisible by 4 are KYC 2 and enabled (6 of them).
fn user_fixture() -> Vec<Value> {
    (0..25)
        .map(|i| {
            let matches = i % 4 == 0 && i > 0;
            json!({
                "id": format!("u{i}"),
                "email": format!("user{i}@example.com"),
                "kycLevel": if matches { 2 } else { 1 },
                "isDisabled": false
            })
        })
        .collect()
}

#[tokio::test]
async fn filtered_user_list_is_coerced_and_bounded() {
    let server = MockServer::start();
    let console = logged_in_console(&server).await;

    let matching: Vec<Value> = user_fixture()
        .into_iter()
        .filter(|u| u["kycLevel"] == 2 && u["isDisabled"] == false)
        .collect();
    assert_eq!(matching.len(), 6);

    let list = server.mock(|when, then| {
        when.method(GET)
            .path("/admin/users")
            .header("authorization", "Bearer tok-1")
            .query_param("page", "1")
            .query_param("limit", "10")
            .query_param("kycLevel", "2")
            .query_param("isDisabled", "false");
        then.status(200).json_body(json!({
            "page": "1",
            "limit": "10",
            "total": 6,
            "totalPages": 1,
            "data": matching
        }));
    });

    let query = UserQuery {
        kyc_level: Some(2),
        is_disabled: Some(false),
        ..UserQuery::default()
    };
    console.users().list().fetch(query.clone()).await;

    list.assert();
    let page = console.users().list().snapshot().data.unwrap();
    assert_eq!(page.items.len(), 6);
    assert!(page.items.len() <= usize::try_from(query.limit).unwrap());
    assert_eq!(page.page, query.page);
    assert_eq!(page.total, 6);
    assert_eq!(page.total_pages, 1);
}

#[tokio::test]
async fn credit_refetches_and_shows_new_entry() {
    let server = MockServer::start();
    let console = logged_in_console(&server).await;

    let mut before = server.mock(|when, then| {
        when.method(GET).path("/ledger");
        then.status(200)
            .json_body(json!({"total": 0, "page": "1", "limit": "20", "data": []}));
    });
    console.ledger().mount().await;
    assert!(console.ledger().entries().snapshot().data.unwrap().is_empty());
    before.delete();

    let credit = server.mock(|when, then| {
        when.method(POST)
            .path("/ledger/credit")
            .header("authorization", "Bearer tok-1")
            .json_body(json!({"adminId": "a1", "description": "adj", "amount": 500}));
        then.status(201).json_body(json!({"ok": true}));
    });
    let after = server.mock(|when, then| {
        when.method(GET)
            .path("/ledger")
            .query_param("page", "1")
            .query_param("limit", "20");
        then.status(200).json_body(json!({
            "total": 1, "page": "1", "limit": "20",
            "data": [{
                "id": "l1", "user_id": null, "type": "CR", "description": "adj",
                "amount": "500.00", "balance": "500.00", "created_at": "2025-03-01T10:00:00Z"
            }]
        }));
    });

    console.ledger().credit("adj", Decimal::from(500)).await.unwrap();

    credit.assert();
    assert_eq!(after.calls(), 1);
    let entries = console.ledger().entries().snapshot().data.unwrap();
    assert_eq!(entries.items.len(), 1);
    assert_eq!(entries.items[0].kind, EntryType::Credit);
    assert_eq!(entries.items[0].description, "adj");
}

#[tokio::test]
async fn failed_credit_does_not_refetch_or_touch_data() {
    let server = MockServer::start();
    let console = logged_in_console(&server).await;

    let list = server.mock(|when, then| {
        when.method(GET).path("/ledger");
        then.status(200).json_body(json!({
            "total": 1, "page": 1, "limit": 20,
            "data": [{"id": "l0", "type": "DR", "description": "fee", "amount": "1",
                      "balance": "99", "created_at": "2025-02-01T00:00:00Z"}]
        }));
    });
    server.mock(|when, then| {
        when.method(POST).path("/ledger/credit");
        then.status(403).json_body(json!({"message": "Forbidden resource"}));
    });

    console.ledger().mount().await;
    let before = console.ledger().entries().snapshot();

    let err = console
        .ledger()
        .credit("adj", Decimal::from(500))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Forbidden resource");
    assert_eq!(list.calls(), 1);
    assert_eq!(console.ledger().entries().snapshot(), before);
}

#[tokio::test]
async fn bad_login_leaves_session_unauthenticated() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/admin/auth/login");
        then.status(401)
            .json_body(json!({"statusCode": 401, "message": "Invalid credentials"}));
    });

    let storage = Arc::new(MemoryStorage::new());
    let console = connect(&server, storage.clone());
    let err = console.session().login("bad@x.com", "wrong").await.unwrap_err();

    assert_eq!(err.to_string(), "Invalid credentials");
    assert!(!console.session().is_authenticated());
    assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
}

#[tokio::test]
async fn empty_notification_is_rejected_client_side() {
    let server = MockServer::start();
    let console = logged_in_console(&server).await;
    let any = server.mock(|when, then| {
        when.path("/admin/notifications/send");
        then.status(201);
    });

    let draft = NotificationDraft {
        title: String::new(),
        message: String::new(),
        channel: String::new(),
    };
    let err = console.notifications().send(&draft).await.unwrap_err();

    assert_eq!(err.to_string(), "Please fill all fields");
    assert_eq!(any.calls(), 0);
}

#[tokio::test]
async fn without_token_nothing_is_sent_and_store_fails() {
    let server = MockServer::start();
    let any = server.mock(|when, then| {
        when.any_request();
        then.status(200).json_body(json!([]));
    });

    let console = connect(&server, Arc::new(MemoryStorage::new()));
    console.system_config().mount().await;
    console.users().list().fetch(UserQuery::default()).await;

    assert_eq!(any.calls(), 0);
    let configs = console.system_config().configs().snapshot();
    assert_eq!(configs.phase(), Phase::Failed);
    assert_eq!(configs.data, None);
    assert_eq!(console.users().list().snapshot().phase(), Phase::Failed);
}

#[tokio::test]
async fn identical_fetches_give_equal_state() {
    let server = MockServer::start();
    let console = logged_in_console(&server).await;
    server.mock(|when, then| {
        when.method(GET).path("/ledger");
        then.status(200).json_body(json!({
            "total": 1, "page": 1, "limit": 20,
            "data": [{"id": "l0", "type": "CR", "description": "x", "amount": 5,
                      "balance": 5, "created_at": "2025-02-01T00:00:00Z"}]
        }));
    });

    let entries = console.ledger().entries();
    entries.fetch(LedgerQuery::default()).await;
    let first = entries.snapshot();
    entries.fetch(LedgerQuery::default()).await;
    assert_eq!(entries.snapshot(), first);
}

#[tokio::test]
async fn disabling_login_round_trip_leaves_draft_clean() {
    let server = MockServer::start();
    let console = logged_in_console(&server).await;

    let mut enabled = server.mock(|when, then| {
        when.method(GET).path("/system-config");
        then.status(200).json_body(json!([
            {"id": "c-login", "setting": "LOGIN", "ngnValue": null, "usdValue": null,
             "status": "ENABLED", "description": "User login"}
        ]));
    });
    console.system_config().mount().await;
    let mut draft = console.system_config().draft("LOGIN").unwrap();
    draft.set_enabled(false);
    assert!(draft.requires_login_confirmation());
    enabled.delete();

    let put = server.mock(|when, then| {
        when.method(PUT)
            .path("/system-config")
            .json_body(json!({"configs": [{"id": "c-login", "status": "DISABLED"}]}));
        then.status(200).json_body(json!({}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/system-config");
        then.status(200).json_body(json!([
            {"id": "c-login", "setting": "LOGIN", "ngnValue": null, "usdValue": null,
             "status": "DISABLED", "description": "User login"}
        ]));
    });

    console.system_config().save(&mut draft).await.unwrap();

    put.assert();
    assert!(!draft.is_dirty());
    assert_eq!(draft.status, ConfigStatus::Disabled);
}

#[tokio::test]
async fn session_survives_restart_through_file_storage() {
    let server = MockServer::start();
    mock_login(&server);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    let first = connect(&server, Arc::new(FileStorage::new(&path)));
    first
        .session()
        .login("ops@example.com", "correct-horse")
        .await
        .unwrap();
    drop(first);

    let restarted = connect(&server, Arc::new(FileStorage::new(&path)));
    let identity = restarted.session().identity().unwrap();
    assert_eq!(identity.id, "a1");
    assert_eq!(identity.role.as_deref(), Some("ADMIN"));

    let dashboard = server.mock(|when, then| {
        when.method(GET)
            .path("/analytics/dashboard")
            .header("authorization", "Bearer tok-1");
        then.status(200).json_body(json!({"summary": {"totalUsers": 3}}));
    });
    restarted.dashboard().mount().await;
    dashboard.assert();

    restarted.session().logout().await;
    let after_logout = connect(&server, Arc::new(FileStorage::new(&path)));
    assert!(!after_logout.session().is_authenticated());
}
