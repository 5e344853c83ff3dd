use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::api::{ApiClient, NO_QUERY};
use crate::error::ApiError;
use crate::store::ResourceStore;

string_enum! {
    /// Kind of platform setting; decides which value fields apply.
    pub enum ConfigSetting: "setting" {
        Fees => "FEES",
        Login => "LOGIN",
        Margin => "MARGIN",
        Rate => "RATE",
    }
}

string_enum! {
    pub enum ConfigStatus: "status" {
        Enabled => "ENABLED",
        Disabled => "DISABLED",
    }
}

impl ConfigSetting {
    /// Whether the setting carries a USD value (FEES, MARGIN).
    #[must_use]
    pub const fn has_usd_value(self) -> bool {
        matches!(self, Self::Fees | Self::Margin)
    }

    /// Whether the setting carries an NGN value (MARGIN, RATE).
    #[must_use]
    pub const fn has_ngn_value(self) -> bool {
        matches!(self, Self::Margin | Self::Rate)
    }
}

/// A platform setting row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemConfig {
    #[serde(deserialize_with = "crate::lenient::id")]
    pub id: String,
    pub setting: ConfigSetting,
    #[serde(default, deserialize_with = "crate::lenient::opt_text")]
    pub ngn_value: Option<String>,
    #[serde(default, deserialize_with = "crate::lenient::opt_text")]
    pub usd_value: Option<String>,
    pub status: ConfigStatus,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "created_at", default)]
    pub created_at: Option<String>,
    #[serde(rename = "updated_at", default)]
    pub updated_at: Option<String>,
}

/// Partial update for one setting. `None` fields are not sent; `Some(None)`
/// clears the value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigPatch {
    pub id: String,
    pub status: ConfigStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usd_value: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ngn_value: Option<Option<String>>,
}

#[derive(Serialize)]
struct UpdateRequest<'a> {
    configs: &'a [ConfigPatch],
}

/// Local edit buffer for one setting.
///
/// Values are held as text, the way they are typed; an empty value is the
/// same as `null` on the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDraft {
    id: String,
    setting: ConfigSetting,
    pub status: ConfigStatus,
    pub usd_value: String,
    pub ngn_value: String,
    canonical: (ConfigStatus, String, String),
}

impl ConfigDraft {
    #[must_use]
    pub fn from_config(config: &SystemConfig) -> Self {
        let usd = config.usd_value.clone().unwrap_or_default();
        let ngn = config.ngn_value.clone().unwrap_or_default();
        Self {
            id: config.id.clone(),
            setting: config.setting,
            status: config.status,
            usd_value: usd.clone(),
            ngn_value: ngn.clone(),
            canonical: (config.status, usd, ngn),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn setting(&self) -> ConfigSetting {
        self.setting
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.status = if enabled {
            ConfigStatus::Enabled
        } else {
            ConfigStatus::Disabled
        };
    }

    /// Whether any field differs from the last saved row.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        let (status, usd, ngn) = &self.canonical;
        self.status != *status || self.usd_value != *usd || self.ngn_value != *ngn
    }

    /// Saving this draft would switch login off.
    #[must_use]
    pub fn requires_login_confirmation(&self) -> bool {
        self.setting == ConfigSetting::Login && self.status == ConfigStatus::Disabled && self.is_dirty()
    }

    /// Warning shown on the LOGIN card; `None` for other settings.
    #[must_use]
    pub fn warning(&self) -> Option<&'static str> {
        if self.setting != ConfigSetting::Login {
            return None;
        }
        Some(if self.status == ConfigStatus::Disabled {
            "Warning: Login will be DISABLED"
        } else {
            "Disabling login will prevent all users from accessing the app"
        })
    }

    #[must_use]
    pub fn submit_label(&self) -> &'static str {
        if self.requires_login_confirmation() {
            "Confirm & Disable Login"
        } else {
            "Update Config"
        }
    }

    /// Check that the value fields this setting uses are numbers.
    ///
    /// # Errors
    /// [`ApiError::Validation`] naming the offending field.
    pub fn validate(&self) -> Result<(), ApiError> {
        let fields = [
            (self.setting.has_usd_value(), "USD value", &self.usd_value),
            (self.setting.has_ngn_value(), "NGN value", &self.ngn_value),
        ];
        for (applies, label, value) in fields {
            let value = value.trim();
            if applies && !value.is_empty() && value.parse::<Decimal>().is_err() {
                return Err(ApiError::validation(format!("{label} must be a number")));
            }
        }
        Ok(())
    }

    /// The partial update for this draft: status always, plus the value
    /// fields the setting kind uses.
    #[must_use]
    pub fn to_patch(&self) -> ConfigPatch {
        let value = |raw: &str| {
            let raw = raw.trim();
            (!raw.is_empty()).then(|| raw.to_owned())
        };
        ConfigPatch {
            id: self.id.clone(),
            status: self.status,
            usd_value: self.setting.has_usd_value().then(|| value(&self.usd_value)),
            ngn_value: self.setting.has_ngn_value().then(|| value(&self.ngn_value)),
        }
    }

    /// Reset both the baseline and the edits to `config`.
    pub fn rebase(&mut self, config: &SystemConfig) {
        *self = Self::from_config(config);
    }
}

/// `GET /system-config`
///
/// # Errors
/// See [`ApiError`]; fallback "Failed to load configs".
pub async fn list_configs(api: &ApiClient) -> Result<Vec<SystemConfig>, ApiError> {
    api.get("/system-config", NO_QUERY, "Failed to load configs").await
}

/// System configuration page state.
#[derive(Debug, Clone)]
pub struct SystemConfigStore {
    api: ApiClient,
    configs: ResourceStore<Vec<SystemConfig>, ()>,
}

impl SystemConfigStore {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        let configs_api = api.clone();
        Self {
            configs: ResourceStore::new("system_config.configs", (), move |()| {
                let api = configs_api.clone();
                async move { list_configs(&api).await }
            }),
            api,
        }
    }

    #[must_use]
    pub fn configs(&self) -> &ResourceStore<Vec<SystemConfig>, ()> {
        &self.configs
    }

    /// Draft for the row with `id` (or with that setting name, e.g. `LOGIN`)
    /// from the last fetched list.
    #[must_use]
    pub fn draft(&self, id_or_setting: &str) -> Option<ConfigDraft> {
        let state = self.configs.snapshot();
        let configs = state.data?;
        configs
            .iter()
            .find(|c| c.id == id_or_setting || c.setting.as_str().eq_ignore_ascii_case(id_or_setting))
            .map(ConfigDraft::from_config)
    }

    /// `PUT /system-config` with a single patch, then refetch.
    ///
    /// # Errors
    /// The server's message or "Update failed".
    pub async fn update(&self, patch: ConfigPatch) -> Result<(), ApiError> {
        let patches = [patch];
        let body = UpdateRequest { configs: &patches };
        self.configs
            .mutate(|| self.api.put("/system-config", &body, "Update failed"))
            .await
    }

    /// Submit `draft` and rebase it on the refetched row, so it is clean
    /// afterwards. If the refetch fails the draft keeps its own values.
    ///
    /// # Errors
    /// "No changes to save" for a clean draft, a validation message for a
    /// non-numeric value, otherwise see [`update`](Self::update).
    pub async fn save(&self, draft: &mut ConfigDraft) -> Result<(), ApiError> {
        if !draft.is_dirty() {
            return Err(ApiError::validation("No changes to save"));
        }
        draft.validate()?;
        self.update(draft.to_patch()).await?;

        // A failed refetch leaves the pre-save rows in place; they must not
        // overwrite what was just saved.
        let state = self.configs.snapshot();
        let refreshed = state
            .error
            .is_none()
            .then_some(state.data)
            .flatten()
            .and_then(|rows| rows.into_iter().find(|c| c.id == draft.id));
        if let Some(row) = refreshed {
            draft.rebase(&row);
        } else {
            draft.canonical = (draft.status, draft.usd_value.clone(), draft.ngn_value.clone());
        }
        Ok(())
    }

    pub async fn mount(&self) {
        self.configs.fetch(()).await;
    }

    pub fn close(&self) {
        self.configs.close();
    }
}
