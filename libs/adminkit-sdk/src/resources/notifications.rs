use serde::{Deserialize, Serialize};

use crate::api::ApiClient;
use crate::error::ApiError;
use crate::page::Page;
use crate::store::ResourceStore;

string_enum! {
    /// Delivery channel for a broadcast.
    pub enum Channel: "channel" {
        InApp => "IN_APP",
        Push => "PUSH",
        Email => "EMAIL",
        All => "ALL",
    }
}

/// A canned broadcast message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NotificationTemplate {
    pub id: u32,
    pub title: &'static str,
    pub body: &'static str,
}

impl NotificationTemplate {
    /// Draft prefilled from this template, sent on every channel.
    #[must_use]
    pub fn to_draft(&self) -> NotificationDraft {
        NotificationDraft {
            title: self.title.to_owned(),
            message: self.body.to_owned(),
            channel: Channel::All.as_str().to_owned(),
        }
    }
}

static TEMPLATES: [NotificationTemplate; 9] = [
    NotificationTemplate {
        id: 1,
        title: "\u{1f514}SOL/NGN Now Live!",
        body: "SOL now live! Swap SOL \u{2194} NGN instantly. Tap to trade.",
    },
    NotificationTemplate {
        id: 2,
        title: "\u{2699}\u{fe0f}System Maintenance",
        body: "Scheduled maintenance: 2:00\u{2013}2:30 AM WAT. Trading paused.",
    },
    NotificationTemplate {
        id: 3,
        title: "\u{1f4b1}NGN Rates Updated",
        body: "New NGN rates live! BTC @ \u{20a6}95M, USDT @ \u{20a6}1,650.",
    },
    NotificationTemplate {
        id: 4,
        title: "\u{1f389}ZERO Fees Weekend",
        body: "ZERO fees this weekend! Swap any crypto \u{2194} NGN free.",
    },
    NotificationTemplate {
        id: 5,
        title: "\u{1f4b8}\u{20a6}500 Cashout Bonus",
        body: "Get \u{20a6}500 bonus when you cash out \u{20a6}50,000+ today!",
    },
    NotificationTemplate {
        id: 6,
        title: "\u{1f465}Invite & Earn",
        body: "Invite 3 friends, get \u{20a6}2,000 each!",
    },
    NotificationTemplate {
        id: 7,
        title: "\u{1f3e6}NGN Transfer Delay",
        body: "Bank transfers delayed (CBN). Expect 1\u{2013}2 hr delay.",
    },
    NotificationTemplate {
        id: 8,
        title: "\u{1f4e2}CBN Update",
        body: "CBN Update: All NGN swaps now require BVN.",
    },
    NotificationTemplate {
        id: 9,
        title: "\u{1f4ca}Tax Season Reminder",
        body: "2025 Tax Season: Download your swap history.",
    },
];

/// Built-in broadcast templates.
#[must_use]
pub fn templates() -> &'static [NotificationTemplate] {
    &TEMPLATES
}

/// Broadcast as typed by the admin. `channel` is validated on send.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationDraft {
    pub title: String,
    pub message: String,
    pub channel: String,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    title: &'a str,
    message: &'a str,
    channel: Channel,
}

impl NotificationDraft {
    fn to_request(&self) -> Result<SendRequest<'_>, ApiError> {
        let title = self.title.trim();
        let message = self.message.trim();
        if title.is_empty() || message.is_empty() || self.channel.trim().is_empty() {
            return Err(ApiError::validation("Please fill all fields"));
        }
        Ok(SendRequest {
            title,
            message,
            channel: self.channel.parse()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentNotification {
    #[serde(deserialize_with = "crate::lenient::id")]
    pub id: String,
    pub title: String,
    pub message: String,
    #[serde(default, deserialize_with = "crate::lenient::count")]
    pub total_recipients: u64,
    pub channel: String,
    pub created_at: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SentQuery {
    pub page: u32,
    pub limit: u32,
}

impl Default for SentQuery {
    fn default() -> Self {
        Self { page: 1, limit: 10 }
    }
}

/// `GET /admin/notifications/sent`
///
/// # Errors
/// See [`ApiError`]; fallback "Failed to load sent notifications".
pub async fn list_sent(api: &ApiClient, query: &SentQuery) -> Result<Page<SentNotification>, ApiError> {
    api.get(
        "/admin/notifications/sent",
        query,
        "Failed to load sent notifications",
    )
    .await
}

/// Notifications page state: sent history plus the template picker.
#[derive(Debug)]
pub struct NotificationsStore {
    api: ApiClient,
    sent: ResourceStore<Page<SentNotification>, SentQuery>,
    selected: parking_lot::Mutex<Option<NotificationTemplate>>,
}

impl NotificationsStore {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        let sent_api = api.clone();
        Self {
            sent: ResourceStore::new("notifications.sent", SentQuery::default(), move |query: SentQuery| {
                let api = sent_api.clone();
                async move { list_sent(&api, &query).await }
            }),
            api,
            selected: parking_lot::Mutex::new(None),
        }
    }

    #[must_use]
    pub fn sent(&self) -> &ResourceStore<Page<SentNotification>, SentQuery> {
        &self.sent
    }

    /// Select a template and return the draft it prefills. Unknown ids leave
    /// the selection unchanged.
    #[must_use]
    pub fn select_template(&self, id: u32) -> Option<NotificationDraft> {
        let template = *templates().iter().find(|t| t.id == id)?;
        *self.selected.lock() = Some(template);
        Some(template.to_draft())
    }

    #[must_use]
    pub fn selected(&self) -> Option<NotificationTemplate> {
        *self.selected.lock()
    }

    pub fn clear_selection(&self) {
        *self.selected.lock() = None;
    }

    /// Broadcast `draft`, then refetch the sent list and clear the selection.
    ///
    /// # Errors
    /// "Please fill all fields" or an invalid-channel message (nothing is
    /// sent), otherwise the server's message or "Failed to send notification".
    pub async fn send(&self, draft: &NotificationDraft) -> Result<(), ApiError> {
        let request = draft.to_request()?;
        self.sent
            .mutate(|| {
                self.api
                    .post("/admin/notifications/send", &request, "Failed to send notification")
            })
            .await?;
        self.clear_selection();
        Ok(())
    }

    pub async fn mount(&self) {
        self.sent.fetch(SentQuery::default()).await;
    }

    pub fn close(&self) {
        self.sent.close();
    }
}
