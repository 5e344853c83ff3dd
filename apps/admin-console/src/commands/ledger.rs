use adminkit_sdk::resources::ledger::{EntryType, LedgerEntry, LedgerQuery};
use adminkit_sdk::{AdminConsole, Page};
use anyhow::Result;
use clap::{Args, Subcommand};
use futures_util::TryStreamExt;
use rust_decimal::Decimal;

use crate::output::{self, Format, Table, or_dash};

#[derive(Subcommand)]
pub enum LedgerCommand {
    /// List ledger entries, newest first
    List(ListArgs),
    /// Post a manual credit attributed to the signed-in admin
    Credit(CreditArgs),
}

#[derive(Args)]
pub struct ListArgs {
    #[arg(long, default_value_t = 1)]
    page: u32,
    #[arg(long, default_value_t = 20)]
    limit: u32,
    #[arg(long)]
    user: Option<String>,
    /// CR or DR
    #[arg(long = "type")]
    kind: Option<EntryType>,
    #[arg(long)]
    from: Option<String>,
    #[arg(long)]
    to: Option<String>,
    /// Fetch every page from `--page` onwards
    #[arg(long)]
    all: bool,
}

impl ListArgs {
    fn query(&self) -> LedgerQuery {
        LedgerQuery {
            page: self.page,
            limit: self.limit,
            user_id: self.user.clone(),
            kind: self.kind,
            start_date: self.from.clone(),
            end_date: self.to.clone(),
        }
    }
}

#[derive(Args)]
pub struct CreditArgs {
    #[arg(long)]
    description: String,
    #[arg(long, allow_negative_numbers = true)]
    amount: Decimal,
}

impl LedgerCommand {
    pub async fn run(self, console: &AdminConsole, format: Format) -> Result<()> {
        let ledger = console.ledger();
        match self {
            Self::List(args) if args.all => {
                let pages: Vec<Page<LedgerEntry>> =
                    ledger.pages(args.query()).try_collect().await?;
                let entries: Vec<LedgerEntry> = pages.into_iter().flat_map(|p| p.items).collect();
                output::emit(format, entries.as_slice(), |e| entry_table(e).to_string())
            }
            Self::List(args) => {
                ledger.entries().fetch(args.query()).await;
                let page = output::settled(ledger.entries().snapshot())?;
                output::emit(format, &page, |p| {
                    format!(
                        "{}{}",
                        entry_table(&p.items),
                        output::page_footer(p.page, p.total_pages, p.total)
                    )
                })
            }
            Self::Credit(args) => {
                ledger.credit(&args.description, args.amount).await?;
                println!("Credited {}", args.amount.normalize());
                Ok(())
            }
        }
    }
}

fn entry_table(entries: &[LedgerEntry]) -> Table {
    let mut table = Table::new(["ID", "USER", "TYPE", "AMOUNT", "BALANCE", "DESCRIPTION", "CREATED"]);
    for entry in entries {
        table.row([
            entry.id.clone(),
            or_dash(entry.user_id.as_deref()),
            entry.kind.to_string(),
            entry.amount.to_string(),
            or_dash(entry.balance),
            entry.description.clone(),
            entry.created_at.clone(),
        ]);
    }
    table
}
