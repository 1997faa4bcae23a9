//! Intake of Telegram updates for the source chat.
//!
//! Every source-chat message is recorded into the recent history and queued
//! for the relay. Recording happens here, not in the relay, so album siblings
//! become visible to a scan while the relay is still busy.

use super::convert::to_relay_message;
use super::history::RecentHistory;
use album_relay_core::message::{ChatId, Message};
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{Message as TgMessage, UpdateKind};
use teloxide::RequestError;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

/// Updates fetched per backlog request.
const BACKLOG_BATCH: u8 = 100;

/// Shared state of the update intake.
pub struct Ingest {
    source: ChatId,
    own_id: i64,
    history: Arc<Mutex<RecentHistory>>,
    updates: mpsc::Sender<Message>,
}

impl Ingest {
    /// Creates the intake for `source`, queueing messages on `updates`.
    #[must_use]
    pub fn new(
        source: ChatId,
        own_id: i64,
        history: Arc<Mutex<RecentHistory>>,
        updates: mpsc::Sender<Message>,
    ) -> Self {
        Self {
            source,
            own_id,
            history,
            updates,
        }
    }

    /// Records a source-chat message into the history without queueing it.
    ///
    /// Returns the converted message, or `None` for other chats.
    pub async fn record(&self, msg: &TgMessage) -> Option<Message> {
        if msg.chat.id.0 != self.source {
            return None;
        }
        let converted = to_relay_message(msg, self.own_id);
        self.history.lock().await.record(converted.clone());
        Some(converted)
    }

    /// Records a source-chat message and queues it for the relay.
    pub async fn accept(&self, msg: &TgMessage) {
        let Some(converted) = self.record(msg).await else {
            debug!(chat_id = msg.chat.id.0, "Ignoring message from another chat");
            return;
        };
        let message_id = converted.id;
        if self.updates.send(converted).await.is_err() {
            warn!(%message_id, "Relay stopped, message dropped");
        }
    }
}

/// Reads pending updates once, records the source-chat messages into the
/// history and acknowledges them so they are not delivered again.
///
/// # Errors
///
/// Returns a `RequestError` if a `getUpdates` call fails.
pub async fn drain_backlog(bot: &Bot, ingest: &Ingest) -> Result<usize, RequestError> {
    bot.delete_webhook().await?;

    let mut offset: Option<i32> = None;
    let mut recorded = 0;

    loop {
        let mut request = bot.get_updates().timeout(0).limit(BACKLOG_BATCH);
        if let Some(offset) = offset {
            request = request.offset(offset);
        }
        let updates = request.await?;
        let Some(last) = updates.last() else {
            break;
        };
        offset = i32::try_from(last.id.0).ok().map(|id| id + 1);

        for update in &updates {
            if let UpdateKind::Message(msg) | UpdateKind::ChannelPost(msg) = &update.kind {
                if ingest.record(msg).await.is_some() {
                    recorded += 1;
                }
            }
        }

        if offset.is_none() {
            break;
        }
    }

    info!(recorded, "Backlog drained");
    Ok(recorded)
}

/// Dispatcher endpoint for messages and channel posts.
pub async fn handle_update(msg: TgMessage, ingest: Arc<Ingest>) -> Result<(), RequestError> {
    ingest.accept(&msg).await;
    respond(())
}
