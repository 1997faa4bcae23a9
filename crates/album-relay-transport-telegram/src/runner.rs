use crate::bot::ingest::{drain_backlog, handle_update};
use crate::bot::{Ingest, RecentHistory, TelegramPlatform};
use crate::config::BotSettings;
use album_relay_core::platform::ChatPlatform;
use album_relay_core::relay::Relay;
use anyhow::Context;
use std::sync::Arc;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use tokio::sync::{mpsc, Mutex};
use tracing::{error, info, warn};

/// Messages queued between the update intake and the relay.
const UPDATE_QUEUE_CAPACITY: usize = 256;

/// Run the Telegram relay until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the bot token is rejected or the relay cannot be
/// configured. Failures after startup are logged, never returned.
pub async fn run_relay(settings: Arc<BotSettings>) -> anyhow::Result<()> {
    let relay_settings = settings.relay.as_ref();
    log_banner(&settings);

    let bot = Bot::new(settings.telegram.telegram_token.clone());
    let history = Arc::new(Mutex::new(RecentHistory::new(
        settings.telegram.history_capacity,
    )));
    let platform = Arc::new(TelegramPlatform::new(
        bot.clone(),
        relay_settings.source_chat_id,
        history.clone(),
        relay_settings.download_dir(),
    ));

    let account = platform
        .connect()
        .await
        .context("Telegram authorization failed")?;
    info!(
        account_id = account.id,
        account = %account.display_name,
        "Connected to Telegram"
    );

    let (tx, rx) = mpsc::channel(UPDATE_QUEUE_CAPACITY);
    let ingest = Arc::new(Ingest::new(
        relay_settings.source_chat_id,
        account.id,
        history,
        tx,
    ));

    if let Err(e) = drain_backlog(&bot, &ingest).await {
        warn!("Failed to read pending updates: {}", e);
    }

    let mut relay = Relay::new(platform, relay_settings).context("Invalid relay settings")?;

    if relay_settings.probe_on_startup {
        info!(limit = relay_settings.probe_scan_limit, "Forwarding latest message");
        match relay.probe().await {
            Ok(Some(outcome)) => info!(?outcome, "Startup forward complete"),
            Ok(None) => {}
            Err(e) => error!(error = %e, "Startup forward failed"),
        }
    }

    let relay_task = tokio::spawn(relay.run(rx));

    info!("Waiting for new messages...");

    Dispatcher::builder(bot, setup_handler())
        .dependencies(dptree::deps![ingest])
        .default_handler(|_| async {})
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    relay_task.await.context("Relay task panicked")?;
    info!("Relay stopped");
    Ok(())
}

fn log_banner(settings: &BotSettings) {
    let relay = settings.relay.as_ref();
    info!(
        source = relay.source_chat_id,
        target = relay.target_chat_id,
        handle = relay.handle.trim_start_matches('@'),
        replacement = %relay.replacement,
        "Album relay starting"
    );
}

fn setup_handler() -> UpdateHandler<teloxide::RequestError> {
    dptree::entry()
        .branch(Update::filter_message().endpoint(handle_update))
        .branch(Update::filter_channel_post().endpoint(handle_update))
}
