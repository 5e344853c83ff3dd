use adminkit_sdk::resources::notifications::{
    Channel, NotificationDraft, NotificationTemplate, SentNotification, SentQuery, templates,
};
use adminkit_sdk::{AdminConsole, Page};
use anyhow::Result;
use clap::{Args, Subcommand};

use crate::output::{self, Format, Table};

#[derive(Subcommand)]
pub enum NotificationsCommand {
    /// Previously sent broadcasts
    Sent {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
    /// Broadcast a notification, optionally starting from a template
    Send(SendArgs),
    /// Built-in message templates
    Templates,
}

#[derive(Args)]
pub struct SendArgs {
    /// Prefill title and message from this template id
    #[arg(long)]
    template: Option<u32>,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    message: Option<String>,
    /// IN_APP, PUSH, EMAIL or ALL
    #[arg(long)]
    channel: Option<String>,
}

impl SendArgs {
    /// Template prefill (if any) with explicit fields layered on top.
    fn draft(&self, console: &AdminConsole) -> Result<NotificationDraft> {
        let notifications = console.notifications();
        let mut draft = match self.template {
            Some(id) => notifications
                .select_template(id)
                .ok_or_else(|| anyhow::anyhow!("Unknown template {id}"))?,
            None => NotificationDraft {
                channel: Channel::All.to_string(),
                ..NotificationDraft::default()
            },
        };
        if let Some(title) = &self.title {
            draft.title.clone_from(title);
        }
        if let Some(message) = &self.message {
            draft.message.clone_from(message);
        }
        if let Some(channel) = &self.channel {
            draft.channel.clone_from(channel);
        }
        Ok(draft)
    }
}

impl NotificationsCommand {
    pub async fn run(self, console: &AdminConsole, format: Format) -> Result<()> {
        let notifications = console.notifications();
        match self {
            Self::Sent { page, limit } => {
                notifications.sent().fetch(SentQuery { page, limit }).await;
                let sent = output::settled(notifications.sent().snapshot())?;
                output::emit(format, &sent, render_sent)
            }
            Self::Send(args) => {
                let draft = args.draft(console)?;
                notifications.send(&draft).await?;
                println!("Notification \"{}\" sent to {}", draft.title.trim(), draft.channel);
                Ok(())
            }
            Self::Templates => output::emit(format, templates(), render_templates),
        }
    }
}

fn render_sent(page: &Page<SentNotification>) -> String {
    let mut table = Table::new(["ID", "TITLE", "CHANNEL", "RECIPIENTS", "SENT"]);
    for sent in &page.items {
        table.row([
            sent.id.clone(),
            sent.title.clone(),
            sent.channel.clone(),
            sent.total_recipients.to_string(),
            sent.created_at.clone(),
        ]);
    }
    format!(
        "{table}{}",
        output::page_footer(page.page, page.total_pages, page.total)
    )
}

fn render_templates(templates: &[NotificationTemplate]) -> String {
    let mut table = Table::new(["ID", "TITLE", "MESSAGE"]);
    for template in templates {
        table.row([template.id.to_string(), template.title.to_owned(), template.body.to_owned()]);
    }
    table.to_string()
}
