use adminkit_sdk::AdminConsole;
use adminkit_sdk::resources::dashboard::{DashboardSummary, Trend};
use anyhow::Result;

use crate::output::{self, Format, Table};

pub async fn run(console: &AdminConsole, format: Format) -> Result<()> {
    let summary = console.dashboard().summary();
    summary.fetch(()).await;
    let data = output::settled(summary.snapshot())?;
    output::emit(format, &data, render)
}

fn trend(trend: Option<&Trend>) -> String {
    trend.map_or_else(String::new, |t| format!("{}% {}", t.value, t.direction))
}

fn render(summary: &DashboardSummary) -> String {
    let changes = &summary.changes;
    let mut table = Table::new(["METRIC", "VALUE", "CHANGE"]);
    table
        .row([
            "Total users".to_owned(),
            summary.total_users.to_string(),
            trend(changes.total_users.as_ref()),
        ])
        .row([
            "Active users".to_owned(),
            summary.active_users.to_string(),
            trend(changes.active_users.as_ref()),
        ])
        .row([
            "Deleted accounts".to_owned(),
            summary.deleted_accounts.to_string(),
            String::new(),
        ])
        .row([
            "Registered today".to_owned(),
            summary.registered_today.to_string(),
            trend(changes.registered_today.as_ref()),
        ])
        .row([
            "Registered this month".to_owned(),
            summary.registered_this_month.to_string(),
            trend(changes.registered_this_month.as_ref()),
        ])
        .row([
            "Registered this year".to_owned(),
            summary.registered_this_year.to_string(),
            trend(changes.registered_this_year.as_ref()),
        ]);
    table.to_string()
}
