use adminkit_sdk::resources::transactions::{
    AssetDailyQuery, AssetDailySeries, AssetSummary, SupportedAsset, Transaction, TransactionCards,
    TransactionQuery, TransactionStatus, TransactionType,
};
use adminkit_sdk::{AdminConsole, Page};
use anyhow::Result;
use clap::{Args, Subcommand};

use crate::output::{self, Format, Table, or_dash};

#[derive(Subcommand)]
pub enum TransactionsCommand {
    /// Recent transactions, newest first
    Recent(RecentArgs),
    /// Transaction counts by status
    Cards,
    /// Volume per asset
    Assets,
    /// Tradable assets with prices and networks
    Supported,
    /// Daily volume per asset
    Daily(DailyArgs),
}

#[derive(Args)]
pub struct RecentArgs {
    #[arg(long, default_value_t = 1)]
    page: u32,
    #[arg(long, default_value_t = 10)]
    limit: u32,
    #[arg(long)]
    status: Option<TransactionStatus>,
    /// Asset code, e.g. USDT
    #[arg(long)]
    asset: Option<String>,
    #[arg(long = "type")]
    kind: Option<TransactionType>,
    /// Inclusive start date (YYYY-MM-DD)
    #[arg(long)]
    from: Option<String>,
    /// Inclusive end date (YYYY-MM-DD)
    #[arg(long)]
    to: Option<String>,
}

impl RecentArgs {
    fn query(&self) -> TransactionQuery {
        TransactionQuery {
            page: self.page,
            limit: self.limit,
            status: self.status,
            asset: self.asset.clone(),
            kind: self.kind,
            start_date: self.from.clone(),
            end_date: self.to.clone(),
        }
    }
}

#[derive(Args)]
pub struct DailyArgs {
    #[arg(long, default_value_t = 7)]
    days: u32,
    #[arg(long = "type", default_value_t = TransactionType::CryptoToCash)]
    kind: TransactionType,
}

impl TransactionsCommand {
    pub async fn run(self, console: &AdminConsole, format: Format) -> Result<()> {
        let store = console.transactions();
        match self {
            Self::Recent(args) => {
                store.recent().fetch(args.query()).await;
                let page = output::settled(store.recent().snapshot())?;
                output::emit(format, &page, render_recent)
            }
            Self::Cards => {
                store.cards().fetch(()).await;
                let cards = output::settled(store.cards().snapshot())?;
                output::emit(format, &cards, render_cards)
            }
            Self::Assets => {
                store.asset_summary().fetch(()).await;
                let assets = output::settled(store.asset_summary().snapshot())?;
                output::emit(format, assets.as_slice(), render_assets)
            }
            Self::Supported => {
                store.supported_assets().fetch(()).await;
                let assets = output::settled(store.supported_assets().snapshot())?;
                output::emit(format, assets.as_slice(), render_supported)
            }
            Self::Daily(args) => {
                let query = AssetDailyQuery {
                    days: args.days,
                    kind: args.kind,
                };
                store.asset_daily().fetch(query).await;
                let series = output::settled(store.asset_daily().snapshot())?;
                output::emit(format, &series, render_daily)
            }
        }
    }
}

fn render_recent(page: &Page<Transaction>) -> String {
    let mut table = Table::new(["ID", "EMAIL", "TYPE", "ASSET", "AMOUNT", "STATUS", "CREATED"]);
    for tx in &page.items {
        table.row([
            or_dash(tx.id.as_deref()),
            tx.email.clone(),
            tx.kind.clone(),
            tx.asset.clone(),
            tx.amount.to_string(),
            tx.status.clone(),
            tx.created_at.clone(),
        ]);
    }
    format!(
        "{table}{}",
        output::page_footer(page.page, page.total_pages, page.total)
    )
}

fn render_cards(cards: &TransactionCards) -> String {
    let mut table = Table::new(["STATUS", "COUNT"]);
    table
        .row(["Total".to_owned(), cards.total.to_string()])
        .row(["Successful".to_owned(), cards.successful.to_string()])
        .row(["Pending".to_owned(), cards.pending.to_string()])
        .row(["Failed".to_owned(), cards.failed.to_string()])
        .row(["Cancelled".to_owned(), cards.cancelled.to_string()]);
    table.to_string()
}

fn render_assets(assets: &[AssetSummary]) -> String {
    let mut table = Table::new(["ASSET", "COUNT", "TOTAL AMOUNT"]);
    for asset in assets {
        table.row([
            asset.asset.clone(),
            asset.count.to_string(),
            asset.total_amount.to_string(),
        ]);
    }
    table.to_string()
}

fn render_supported(assets: &[SupportedAsset]) -> String {
    let mut table = Table::new(["CODE", "NETWORKS", "USD BUY", "USD SELL", "NGN BUY", "NGN SELL"]);
    for asset in assets {
        let networks: Vec<&str> = asset.networks.iter().map(|n| n.name.as_str()).collect();
        table.row([
            asset.code.clone(),
            networks.join(", "),
            or_dash(asset.usd_buy_price),
            or_dash(asset.usd_sell_price),
            or_dash(asset.ngn_buy_price),
            or_dash(asset.ngn_sell_price),
        ]);
    }
    table.to_string()
}

fn render_daily(series: &AssetDailySeries) -> String {
    let mut headers = vec!["DATE".to_owned()];
    headers.extend(series.assets.iter().cloned());
    let mut table = Table::new(headers);
    for point in &series.dataset {
        let mut cells = vec![point.date.clone()];
        cells.extend(
            series
                .assets
                .iter()
                .map(|asset| or_dash(point.values.get(asset))),
        );
        table.row(cells);
    }
    table.to_string()
}
