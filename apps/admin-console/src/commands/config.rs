use adminkit_sdk::AdminConsole;
use adminkit_sdk::resources::system_config::{ConfigDraft, SystemConfig};
use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use crate::output::{self, Format, Table, or_dash};

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show every setting card
    List,
    /// Change one setting, addressed by id or name (FEES, LOGIN, MARGIN, RATE)
    Set(SetArgs),
}

#[derive(Args)]
pub struct SetArgs {
    /// Row id or setting name
    target: String,
    #[arg(long, conflicts_with = "disable")]
    enable: bool,
    #[arg(long)]
    disable: bool,
    /// USD value; pass an empty string to clear it
    #[arg(long)]
    usd: Option<String>,
    /// NGN value; pass an empty string to clear it
    #[arg(long)]
    ngn: Option<String>,
    /// Required to switch LOGIN off
    #[arg(long)]
    confirm: bool,
}

impl SetArgs {
    /// Apply the flags to `draft`.
    fn edit(&self, draft: &mut ConfigDraft) -> Result<()> {
        let setting = draft.setting();
        if self.enable || self.disable {
            draft.set_enabled(self.enable);
        }
        if let Some(usd) = &self.usd {
            if !setting.has_usd_value() {
                anyhow::bail!("{setting} has no USD value");
            }
            draft.usd_value.clone_from(usd);
        }
        if let Some(ngn) = &self.ngn {
            if !setting.has_ngn_value() {
                anyhow::bail!("{setting} has no NGN value");
            }
            draft.ngn_value.clone_from(ngn);
        }
        if draft.requires_login_confirmation() && !self.confirm {
            let warning = draft.warning().unwrap_or_default();
            anyhow::bail!(
                "{warning}. Pass --confirm to {}",
                draft.submit_label().to_lowercase()
            );
        }
        Ok(())
    }

    async fn run(&self, console: &AdminConsole, format: Format) -> Result<()> {
        let store = console.system_config();
        store.configs().fetch(()).await;
        output::settled(store.configs().snapshot())?;

        let mut draft = store
            .draft(&self.target)
            .with_context(|| format!("No config setting '{}'", self.target))?;
        self.edit(&mut draft)?;
        store.save(&mut draft).await?;
        tracing::info!(setting = %draft.setting(), status = %draft.status, "config updated");

        let rows = output::settled(store.configs().snapshot())?;
        let row = rows
            .into_iter()
            .find(|c| c.id == draft.id())
            .context("updated setting missing from refreshed list")?;
        output::emit(format, &row, |c| render(std::slice::from_ref(c)))
    }
}

impl ConfigCommand {
    pub async fn run(self, console: &AdminConsole, format: Format) -> Result<()> {
        match self {
            Self::List => {
                let store = console.system_config();
                store.configs().fetch(()).await;
                let configs = output::settled(store.configs().snapshot())?;
                output::emit(format, configs.as_slice(), render)
            }
            Self::Set(args) => args.run(console, format).await,
        }
    }
}

fn render(configs: &[SystemConfig]) -> String {
    let mut table = Table::new(["ID", "SETTING", "STATUS", "USD", "NGN", "DESCRIPTION"]);
    let mut notes = Vec::new();
    for config in configs {
        table.row([
            config.id.clone(),
            config.setting.to_string(),
            config.status.to_string(),
            or_dash(config.usd_value.as_deref()),
            or_dash(config.ngn_value.as_deref()),
            config.description.clone(),
        ]);
        if let Some(warning) = ConfigDraft::from_config(config).warning() {
            notes.push(format!("{}: {warning}", config.setting));
        }
    }
    let mut out = table.to_string();
    for note in notes {
        out.push_str(&note);
        out.push('\n');
    }
    out
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use adminkit_sdk::resources::system_config::{ConfigSetting, ConfigStatus};

    fn row(setting: ConfigSetting, status: ConfigStatus) -> SystemConfig {
        SystemConfig {
            id: "cfg-1".to_owned(),
            setting,
            ngn_value: Some("1500".to_owned()),
            usd_value: Some("1".to_owned()),
            status,
            description: String::new(),
            created_at: None,
            updated_at: None,
        }
    }

    fn args(enable: bool, disable: bool, confirm: bool) -> SetArgs {
        SetArgs {
            target: "LOGIN".to_owned(),
            enable,
            disable,
            usd: None,
            ngn: None,
            confirm,
        }
    }

    #[test]
    fn disabling_login_needs_confirm() {
        let mut draft = ConfigDraft::from_config(&row(ConfigSetting::Login, ConfigStatus::Enabled));
        let err = args(false, true, false).edit(&mut draft).unwrap_err();
        assert!(err.to_string().contains("--confirm"), "{err}");

        let mut draft = ConfigDraft::from_config(&row(ConfigSetting::Login, ConfigStatus::Enabled));
        args(false, true, true).edit(&mut draft).unwrap();
        assert_eq!(draft.status, ConfigStatus::Disabled);
    }

    #[test]
    fn enabling_login_needs_no_confirm() {
        let mut draft = ConfigDraft::from_config(&row(ConfigSetting::Login, ConfigStatus::Disabled));
        args(true, false, false).edit(&mut draft).unwrap();
        assert_eq!(draft.status, ConfigStatus::Enabled);
        assert!(draft.is_dirty());
    }

    #[test]
    fn value_flags_respect_setting_kind() {
        let mut draft = ConfigDraft::from_config(&row(ConfigSetting::Login, ConfigStatus::Enabled));
        let mut set = args(false, false, false);
        set.usd = Some("2".to_owned());
        assert!(set.edit(&mut draft).is_err());

        let mut draft = ConfigDraft::from_config(&row(ConfigSetting::Rate, ConfigStatus::Enabled));
        assert!(set.edit(&mut draft).is_err());

        let mut draft = ConfigDraft::from_config(&row(ConfigSetting::Margin, ConfigStatus::Enabled));
        set.ngn = Some("1600".to_owned());
        set.edit(&mut draft).unwrap();
        assert_eq!(draft.usd_value, "2");
        assert_eq!(draft.ngn_value, "1600");
    }
}
