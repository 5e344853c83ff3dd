use adminkit_sdk::AdminConsole;
use anyhow::Result;
use clap::Subcommand;

use crate::output::Format;

pub mod auth;
pub mod config;
pub mod dashboard;
pub mod ledger;
pub mod notifications;
pub mod transactions;
pub mod users;

#[derive(Subcommand)]
pub enum Command {
    /// Sign in and persist the session
    Login(auth::LoginArgs),
    /// Sign out and clear the persisted session
    Logout,
    /// Show the signed-in admin
    Whoami,
    /// Change the signed-in admin's password
    ChangePassword(auth::ChangePasswordArgs),
    /// Headline user counters with trends
    Dashboard,
    /// Transaction log and per-asset analytics
    #[command(subcommand)]
    Transactions(transactions::TransactionsCommand),
    /// Customer accounts and user analytics
    #[command(subcommand)]
    Users(users::UsersCommand),
    /// Admin ledger entries and credits
    #[command(subcommand)]
    Ledger(ledger::LedgerCommand),
    /// Broadcast notifications
    #[command(subcommand)]
    Notifications(notifications::NotificationsCommand),
    /// System configuration cards (fees, rate, margin, login)
    #[command(subcommand)]
    Config(config::ConfigCommand),
}

impl Command {
    pub async fn run(self, console: &AdminConsole, format: Format) -> Result<()> {
        match self {
            Self::Login(args) => args.run(console, format).await,
            Self::Logout => {
                auth::logout(console).await;
                Ok(())
            }
            Self::Whoami => auth::whoami(console, format),
            Self::ChangePassword(args) => args.run(console).await,
            Self::Dashboard => dashboard::run(console, format).await,
            Self::Transactions(cmd) => cmd.run(console, format).await,
            Self::Users(cmd) => cmd.run(console, format).await,
            Self::Ledger(cmd) => cmd.run(console, format).await,
            Self::Notifications(cmd) => cmd.run(console, format).await,
            Self::Config(cmd) => cmd.run(console, format).await,
        }
    }
}
