//! Update loop connecting Telegram to the report conversation.

use std::sync::Arc;

use grammers_client::update::Update;
use grammers_client::{Client, SenderPool, UpdatesConfiguration};
use grammers_session::storages::SqliteSession;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::client::to_input_message;
use super::{ReportNotifier, TelegramBot, TelegramError};
use crate::config::{BotSettings, TelegramConfig};
use crate::conversation::{Action, Incoming, OutgoingMessage, ReportFlow};
use crate::reports::Report;

/// Shared pieces every update handler needs.
struct Context {
    bot: Arc<TelegramBot>,
    flow: Arc<ReportFlow>,
    notifier: Arc<ReportNotifier<TelegramBot>>,
}

/// Connects to Telegram and handles updates until `shutdown` flips to true.
pub async fn run(
    config: &TelegramConfig,
    settings: &BotSettings,
    flow: Arc<ReportFlow>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), TelegramError> {
    info!("Connecting to Telegram...");

    let session = Arc::new(
        SqliteSession::open(&config.session_path)
            .await
            .map_err(|e| TelegramError::Session(e.to_string()))?,
    );

    let SenderPool {
        runner,
        updates,
        handle,
    } = SenderPool::new(Arc::clone(&session), config.api_id);

    let client = Client::new(handle.clone());

    // Spawn the sender pool runner
    let pool_task = tokio::spawn(async move {
        runner.run().await;
    });

    let bot = Arc::new(
        TelegramBot::sign_in(client, handle.thin, Arc::clone(&session), pool_task, config).await?,
    );

    if let Err(e) = bot.set_commands().await {
        warn!("Failed to publish the command menu: {}", e);
    }

    let has_channel = match &settings.report_channel {
        Some(channel) => bot.configure_channel(channel).await,
        None => false,
    };

    if settings.admin_ids.is_empty() {
        warn!("ADMIN_IDS is empty, nobody can review reports");
    }

    let ctx = Arc::new(Context {
        notifier: Arc::new(ReportNotifier::new(
            Arc::clone(&bot),
            has_channel,
            settings.admin_ids.clone(),
        )),
        bot: Arc::clone(&bot),
        flow,
    });

    let mut stream = bot
        .inner()
        .stream_updates(
            updates,
            UpdatesConfiguration {
                catch_up: false,
                ..Default::default()
            },
        )
        .await;

    info!("Bot is running. Use Ctrl+C to stop.");

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                info!("Update loop shutting down");
                break;
            }
            update = stream.next() => {
                match update {
                    Ok(update) => {
                        let ctx = Arc::clone(&ctx);
                        tokio::spawn(async move {
                            handle_update(&ctx, update).await;
                        });
                    }
                    Err(e) => {
                        error!("Failed to receive update: {}", e);
                        break;
                    }
                }
            }
        }
    }

    stream.sync_update_state().await;
    bot.disconnect();
    Ok(())
}

/// What to do with the actions produced for one update.
#[derive(Debug, Default, PartialEq, Eq)]
struct Plan {
    /// New messages for the user.
    replies: Vec<OutgoingMessage>,

    /// New content for the message whose button was pressed.
    edit: Option<OutgoingMessage>,

    /// Popup text for the callback answer.
    toast: Option<String>,

    /// Reports to deliver to the channel and the admins.
    broadcasts: Vec<Report>,
}

impl Plan {
    /// Plans the response to a text message, which has no button to edit or answer.
    fn for_message(actions: Vec<Action>) -> Self {
        let mut plan = Self::default();
        for action in actions {
            match action {
                Action::Reply(message) => plan.replies.push(message),
                Action::Broadcast(report) => plan.broadcasts.push(report),
                Action::Edit(_) | Action::Toast(_) => {
                    debug!("Dropping callback-only action for a text message");
                }
            }
        }
        plan
    }

    /// Plans the response to a button press. The last edit and toast win.
    fn for_callback(actions: Vec<Action>) -> Self {
        let mut plan = Self::default();
        for action in actions {
            match action {
                Action::Reply(message) => plan.replies.push(message),
                Action::Edit(message) => plan.edit = Some(message),
                Action::Toast(text) => plan.toast = Some(text),
                Action::Broadcast(report) => plan.broadcasts.push(report),
            }
        }
        plan
    }
}

/// Handles a single update.
async fn handle_update(ctx: &Context, update: Update) {
    match update {
        Update::NewMessage(message) if !message.outgoing() => {
            let Some(sender) = ctx.bot.remember_sender(message.sender()).await else {
                return;
            };
            let Some(incoming) = Incoming::from_text(message.text(), ctx.bot.username()) else {
                return;
            };

            let plan = Plan::for_message(ctx.flow.handle(&sender, incoming).await);
            for report in plan.broadcasts {
                broadcast(ctx, report);
            }
            for reply in plan.replies {
                if let Err(e) = message.respond(to_input_message(&reply)).await {
                    warn!("Failed to reply to user {}: {}", sender.id, e);
                }
            }
        }
        Update::CallbackQuery(query) => {
            let Some(sender) = ctx.bot.remember_sender(query.sender()).await else {
                if let Err(e) = query.answer().send().await {
                    debug!("Failed to answer callback: {}", e);
                }
                return;
            };
            let incoming = Incoming::from_callback(query.data());

            let plan = Plan::for_callback(ctx.flow.handle(&sender, incoming).await);
            for report in plan.broadcasts {
                broadcast(ctx, report);
            }

            let mut answer = query.answer();
            if let Some(text) = plan.toast {
                answer = answer.text(text);
            }
            let answered = match plan.edit {
                Some(message) => answer.edit(to_input_message(&message)).await,
                None => answer.send().await,
            };
            if let Err(e) = answered {
                warn!("Failed to answer callback from user {}: {}", sender.id, e);
            }

            for reply in plan.replies {
                if let Err(e) = ctx.bot.send_to_user(sender.id, &reply).await {
                    warn!("Failed to message user {}: {}", sender.id, e);
                }
            }
        }
        _ => {}
    }
}

/// Delivers a report in the background so the reporter is not kept waiting.
fn broadcast(ctx: &Context, report: Report) {
    let notifier = Arc::clone(&ctx.notifier);
    tokio::spawn(async move {
        notifier.deliver(&report).await;
    });
}
