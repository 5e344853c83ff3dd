use adminkit_sdk::resources::SortOrder;
use adminkit_sdk::resources::users::{
    BvnStatus, TopUsers, TrendPoint, TrendQuery, User, UserQuery, UserSort,
};
use adminkit_sdk::{AdminConsole, Page};
use anyhow::Result;
use clap::{Args, Subcommand};
use futures_util::TryStreamExt;

use crate::output::{self, Format, Table, or_dash};

#[derive(Subcommand)]
pub enum UsersCommand {
    /// List customer accounts
    List(ListArgs),
    /// Daily sign-up counts
    Trend {
        #[arg(long, default_value_t = 90)]
        days: u32,
    },
    /// Most active users by transaction count and by volume
    Top,
    /// Re-enable a disabled account
    Enable { id: String },
    /// Disable an account
    Disable { id: String },
}

#[derive(Args)]
pub struct ListArgs {
    #[arg(long, default_value_t = 1)]
    page: u32,
    #[arg(long, default_value_t = 10)]
    limit: u32,
    #[arg(long, default_value_t = UserSort::CreatedAt)]
    sort: UserSort,
    #[arg(long, default_value_t = SortOrder::Desc)]
    order: SortOrder,
    /// Match on name, email or phone number
    #[arg(long)]
    search: Option<String>,
    /// KYC level (0-2)
    #[arg(long)]
    kyc: Option<u8>,
    #[arg(long)]
    disabled: Option<bool>,
    #[arg(long)]
    deleted: Option<bool>,
    #[arg(long)]
    bvn: Option<BvnStatus>,
    /// Fetch every page from `--page` onwards
    #[arg(long)]
    all: bool,
}

impl ListArgs {
    fn query(&self) -> UserQuery {
        UserQuery {
            page: self.page,
            limit: self.limit,
            sort: self.sort,
            order: self.order,
            search: self.search.clone(),
            kyc_level: self.kyc,
            is_disabled: self.disabled,
            is_deleted: self.deleted,
            bvn_status: self.bvn,
        }
    }

    async fn run(&self, console: &AdminConsole, format: Format) -> Result<()> {
        let store = console.users();
        if self.all {
            let pages: Vec<Page<User>> = store.pages(self.query()).try_collect().await?;
            let users: Vec<User> = pages.into_iter().flat_map(|p| p.items).collect();
            tracing::info!(count = users.len(), "exported users");
            return output::emit(format, users.as_slice(), |u| user_table(u).to_string());
        }

        store.list().fetch(self.query()).await;
        let page = output::settled(store.list().snapshot())?;
        output::emit(format, &page, |p| {
            format!(
                "{}{}",
                user_table(&p.items),
                output::page_footer(p.page, p.total_pages, p.total)
            )
        })
    }
}

impl UsersCommand {
    pub async fn run(self, console: &AdminConsole, format: Format) -> Result<()> {
        let store = console.users();
        match self {
            Self::List(args) => args.run(console, format).await,
            Self::Trend { days } => {
                store.trend().fetch(TrendQuery { days }).await;
                let points = output::settled(store.trend().snapshot())?;
                output::emit(format, points.as_slice(), render_trend)
            }
            Self::Top => {
                store.top().fetch(()).await;
                let top = output::settled(store.top().snapshot())?;
                output::emit(format, &top, render_top)
            }
            Self::Enable { id } => {
                store.set_enabled(&id, true).await?;
                println!("User {id} enabled");
                Ok(())
            }
            Self::Disable { id } => {
                store.set_enabled(&id, false).await?;
                println!("User {id} disabled");
                Ok(())
            }
        }
    }
}

fn user_table(users: &[User]) -> Table {
    let mut table = Table::new(["ID", "EMAIL", "NAME", "PHONE", "KYC", "STATUS", "JOINED"]);
    for user in users {
        table.row([
            user.id.clone(),
            user.email.clone(),
            or_dash(user.full_name.as_deref()),
            or_dash(user.phone_number.as_deref()),
            user.kyc_level.to_string(),
            if user.is_disabled { "disabled" } else { "active" }.to_owned(),
            or_dash(user.date_created.as_deref()),
        ]);
    }
    table
}

fn render_trend(points: &[TrendPoint]) -> String {
    let mut table = Table::new(["DATE", "SIGN-UPS"]);
    for point in points {
        table.row([point.date.clone(), point.count.to_string()]);
    }
    table.to_string()
}

fn render_top(top: &TopUsers) -> String {
    let mut active = Table::new(["USER", "TRANSACTIONS"]);
    for entry in &top.active {
        active.row([or_dash(entry.user.as_deref()), entry.transaction_count.to_string()]);
    }
    let mut volume = Table::new(["USER", "TOTAL AMOUNT"]);
    for entry in &top.volume {
        volume.row([or_dash(entry.user.as_deref()), entry.total_amount.to_string()]);
    }
    format!("Most active\n{active}\nHighest volume\n{volume}")
}
