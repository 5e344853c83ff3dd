use adminkit_sdk::{AdminConsole, Identity};
use anyhow::{Context, Result};
use clap::Args;

use crate::output::{self, Format};

#[derive(Args)]
pub struct LoginArgs {
    #[arg(long)]
    email: String,
    #[arg(long, env = "ADMIN_CONSOLE_PASSWORD", hide_env_values = true)]
    password: String,
}

impl LoginArgs {
    pub async fn run(&self, console: &AdminConsole, format: Format) -> Result<()> {
        let identity = console.session().login(&self.email, &self.password).await?;
        output::emit(format, &identity, |i| format!("Logged in as {}", describe(i)))
    }
}

#[derive(Args)]
pub struct ChangePasswordArgs {
    #[arg(long, env = "ADMIN_CONSOLE_PASSWORD", hide_env_values = true)]
    current: String,
    #[arg(long)]
    new: String,
    /// Repeat of the new password; checked before anything is sent
    #[arg(long)]
    confirm: Option<String>,
}

impl ChangePasswordArgs {
    pub async fn run(&self, console: &AdminConsole) -> Result<()> {
        let session = console.session();
        match &self.confirm {
            Some(confirm) => {
                session
                    .change_password_confirmed(&self.current, &self.new, confirm)
                    .await?;
            }
            None => session.change_password(&self.current, &self.new).await?,
        }
        println!("Password changed");
        Ok(())
    }
}

pub async fn logout(console: &AdminConsole) {
    console.session().logout().await;
    println!("Logged out");
}

pub fn whoami(console: &AdminConsole, format: Format) -> Result<()> {
    let identity = console
        .session()
        .identity()
        .context("Not logged in (run `admin-console login`)")?;
    output::emit(format, &identity, describe)
}

fn describe(identity: &Identity) -> String {
    let mut line = format!("{} <{}>", identity.display_name(), identity.email);
    if let Some(role) = &identity.role {
        line.push_str(" [");
        line.push_str(role);
        line.push(']');
    }
    line
}
