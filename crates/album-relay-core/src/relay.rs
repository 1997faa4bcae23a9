//! Forwarding relay: album reconciliation and single-message forwarding.
//!
//! Messages are handled one at a time. Each external call is isolated and
//! degrades to a fallback or a skip; the individual-send fallback after a
//! failed album batch is the only second attempt ever made.

use crate::album::Album;
use crate::config::{RelaySettings, SettingsError};
use crate::dedup::ProcessedIds;
use crate::message::{ChatId, GroupId, Message, MessageId};
use crate::platform::{discard_all, Artifact, ChatPlatform, PlatformError};
use crate::rewrite::HandleRewriter;
use crate::utils::preview;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// A message that could not be delivered by any path.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Reading recent history failed
    #[error("history scan failed: {0}")]
    Scan(#[source] PlatformError),
    /// The text (or text fallback) could not be sent
    #[error("failed to send text for message {message_id}: {source}")]
    SendText {
        /// Message being forwarded
        message_id: MessageId,
        /// Platform failure
        #[source]
        source: PlatformError,
    },
    /// The media could not be forwarded and there was no text to fall back to
    #[error("failed to forward media of message {message_id}: {source}")]
    SendMedia {
        /// Message being forwarded
        message_id: MessageId,
        /// Platform failure
        #[source]
        source: PlatformError,
    },
    /// Nothing of the album reached the target chat
    #[error("album {group_id} undelivered ({photos} photos)")]
    AlbumUndelivered {
        /// Media group
        group_id: GroupId,
        /// Photos assembled
        photos: usize,
    },
}

/// Why a message was not handled at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Sent by the relay's own account
    Outbound,
    /// Already forwarded in this run
    AlreadyProcessed,
    /// No text and no media
    Empty,
}

/// What happened to a handled message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForwardOutcome {
    /// Nothing was sent
    Skipped(SkipReason),
    /// Text message forwarded
    Text,
    /// Media forwarded with its caption
    Media,
    /// Media failed, its text was sent instead
    TextFallback,
    /// No photo of the group was found
    EmptyAlbum,
    /// Album forwarded in one batch
    Album {
        /// Photos sent
        photos: usize,
    },
    /// Batch failed, photos were sent one by one
    AlbumIndividually {
        /// Photos delivered
        sent: usize,
        /// Photos that failed
        failed: usize,
    },
    /// No photo downloaded, the album caption was sent alone
    AlbumCaptionOnly,
}

/// Result of sending artifacts one at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct IndividualReport {
    sent: usize,
    failed: usize,
}

/// Forwards messages from the source chat to the target chat.
pub struct Relay {
    platform: Arc<dyn ChatPlatform>,
    rewriter: HandleRewriter,
    source: ChatId,
    target: ChatId,
    album_scan_limit: usize,
    probe_scan_limit: usize,
    album_settle: Duration,
    send_delay: Duration,
    processed: ProcessedIds,
}

impl Relay {
    /// Creates a relay over `platform`.
    ///
    /// # Errors
    ///
    /// Returns a `SettingsError` if the settings are invalid.
    pub fn new(
        platform: Arc<dyn ChatPlatform>,
        settings: &RelaySettings,
    ) -> Result<Self, SettingsError> {
        settings.validate()?;
        let rewriter = settings.rewriter()?;
        if rewriter.is_self_referential() {
            warn!(
                token = rewriter.token(),
                replacement = rewriter.replacement(),
                "Replacement contains the replaced mention; rewriting is not idempotent"
            );
        }

        Ok(Self {
            platform,
            rewriter,
            source: settings.source_chat_id,
            target: settings.target_chat_id,
            album_scan_limit: settings.album_scan_limit,
            probe_scan_limit: settings.probe_scan_limit,
            album_settle: settings.album_settle(),
            send_delay: settings.individual_send_delay(),
            processed: ProcessedIds::new(settings.dedup_capacity),
        })
    }

    /// Identifiers handled so far.
    #[must_use]
    pub const fn processed(&self) -> &ProcessedIds {
        &self.processed
    }

    /// Forwards the most recent inbound message of the source chat once.
    ///
    /// Returns `Ok(None)` when the scanned window holds no inbound message.
    ///
    /// # Errors
    ///
    /// Returns a `RelayError` if the scan fails or the message cannot be
    /// delivered.
    pub async fn probe(&mut self) -> Result<Option<ForwardOutcome>, RelayError> {
        let recent = self
            .platform
            .fetch_recent(self.source, self.probe_scan_limit)
            .await
            .map_err(RelayError::Scan)?;

        let Some(latest) = recent.into_iter().find(|m| !m.outbound) else {
            warn!(chat_id = self.source, "No recent message found to forward");
            return Ok(None);
        };

        info!(message_id = %latest.id, "Forwarding latest message");
        self.handle(latest).await.map(Some)
    }

    /// Handles one message from the source chat.
    ///
    /// # Errors
    ///
    /// Returns a `RelayError` when every delivery path for the message failed.
    pub async fn handle(&mut self, msg: Message) -> Result<ForwardOutcome, RelayError> {
        if msg.outbound {
            return Ok(ForwardOutcome::Skipped(SkipReason::Outbound));
        }
        if self.processed.contains(msg.id) {
            debug!(message_id = %msg.id, "Already processed");
            return Ok(ForwardOutcome::Skipped(SkipReason::AlreadyProcessed));
        }

        let result = match msg.group_id.clone() {
            Some(group_id) => {
                info!(message_id = %msg.id, %group_id, "Grouped photo detected");
                self.forward_album(&msg, group_id).await
            }
            None => {
                info!(message_id = %msg.id, "New message detected");
                self.forward_single(&msg).await
            }
        };

        self.processed.insert(msg.id);
        result
    }

    /// Consumes `updates` until the channel closes.
    pub async fn run(mut self, mut updates: mpsc::Receiver<Message>) {
        while let Some(msg) = updates.recv().await {
            let message_id = msg.id;
            match self.handle(msg).await {
                Ok(outcome) => debug!(%message_id, ?outcome, "Message handled"),
                Err(e) => error!(%message_id, error = %e, "Message left unforwarded"),
            }
        }
        info!("Update stream closed, relay stopped");
    }

    async fn forward_album(
        &mut self,
        trigger: &Message,
        group_id: GroupId,
    ) -> Result<ForwardOutcome, RelayError> {
        if !self.album_settle.is_zero() {
            tokio::time::sleep(self.album_settle).await;
        }

        let scanned = match self
            .platform
            .fetch_recent(self.source, self.album_scan_limit)
            .await
        {
            Ok(messages) => messages,
            Err(e) => {
                warn!(%group_id, error = %e, "History scan failed, using trigger only");
                Vec::new()
            }
        };

        let album = Album::assemble(trigger, group_id, scanned, &mut self.processed);
        info!(group_id = %album.group_id(), count = album.len(), "Album assembled");

        if album.is_empty() {
            warn!(group_id = %album.group_id(), "No photos found in album");
            return Ok(ForwardOutcome::EmptyAlbum);
        }

        let original = album.caption();
        let caption = self.rewriter.rewrite(original).into_owned();
        if !original.is_empty() {
            info!(caption = preview(original), "Album caption");
            if caption != original {
                info!(caption = preview(&caption), "Album caption rewritten");
            }
        }

        let artifacts = self.download_members(&album).await;

        if artifacts.is_empty() {
            if caption.is_empty() {
                return Err(RelayError::AlbumUndelivered {
                    group_id: album.group_id().clone(),
                    photos: album.len(),
                });
            }
            warn!(group_id = %album.group_id(), "No photos downloaded, sending caption only");
            return self
                .platform
                .send_text(self.target, caption)
                .await
                .map(|()| ForwardOutcome::AlbumCaptionOnly)
                .map_err(|source| RelayError::SendText {
                    message_id: trigger.id,
                    source,
                });
        }

        let photos = artifacts.len();
        let caption = (!caption.is_empty()).then_some(caption);
        info!(group_id = %album.group_id(), count = photos, "Sending album");

        match self
            .platform
            .send_files(self.target, artifacts.clone(), caption.clone())
            .await
        {
            Ok(()) => {
                info!(group_id = %album.group_id(), count = photos, "Album sent");
                discard_all(artifacts).await;
                Ok(ForwardOutcome::Album { photos })
            }
            Err(e) => {
                warn!(
                    group_id = %album.group_id(),
                    error = %e,
                    "Album send failed, sending photos individually"
                );
                let report = self.send_individually(artifacts, caption).await;
                if report.sent == 0 {
                    return Err(RelayError::AlbumUndelivered {
                        group_id: album.group_id().clone(),
                        photos: album.len(),
                    });
                }
                Ok(ForwardOutcome::AlbumIndividually {
                    sent: report.sent,
                    failed: report.failed,
                })
            }
        }
    }

    async fn download_members(&self, album: &Album) -> Vec<Artifact> {
        let total = album.len();
        let mut artifacts = Vec::with_capacity(total);

        for (index, member) in album.members().iter().enumerate() {
            let Some(media) = member.media.clone() else {
                continue;
            };
            match self.platform.download(media).await {
                Ok(artifact) => {
                    debug!(
                        message_id = %member.id,
                        item = index + 1,
                        total,
                        "Photo downloaded"
                    );
                    artifacts.push(artifact);
                }
                Err(e) => {
                    warn!(
                        message_id = %member.id,
                        item = index + 1,
                        total,
                        error = %e,
                        "Photo download failed"
                    );
                }
            }
        }

        artifacts
    }

    /// Sends each artifact on its own, caption on the first only, removing
    /// every artifact right after its attempt.
    async fn send_individually(
        &self,
        artifacts: Vec<Artifact>,
        caption: Option<String>,
    ) -> IndividualReport {
        let total = artifacts.len();
        let mut report = IndividualReport::default();
        let mut caption = caption;

        for (index, artifact) in artifacts.into_iter().enumerate() {
            let result = self
                .platform
                .send_files(self.target, vec![artifact.clone()], caption.take())
                .await;
            artifact.discard().await;

            match result {
                Ok(()) => {
                    report.sent += 1;
                    info!(item = index + 1, total, "Photo sent");
                }
                Err(e) => {
                    report.failed += 1;
                    warn!(item = index + 1, total, error = %e, "Individual photo send failed");
                }
            }

            if index + 1 < total && !self.send_delay.is_zero() {
                tokio::time::sleep(self.send_delay).await;
            }
        }

        report
    }

    async fn forward_single(&self, msg: &Message) -> Result<ForwardOutcome, RelayError> {
        let text = msg.text_or_empty();
        let rewritten = self.rewriter.rewrite(text).into_owned();

        let Some(media) = msg.media.clone() else {
            if text.is_empty() {
                info!(message_id = %msg.id, "Skipping empty message");
                return Ok(ForwardOutcome::Skipped(SkipReason::Empty));
            }
            info!(message_id = %msg.id, text = preview(text), "Text message");
            return self
                .platform
                .send_text(self.target, rewritten)
                .await
                .map(|()| ForwardOutcome::Text)
                .map_err(|source| RelayError::SendText {
                    message_id: msg.id,
                    source,
                });
        };

        info!(message_id = %msg.id, kind = ?media.kind, text = preview(text), "Media message");

        let caption = (!rewritten.is_empty()).then(|| rewritten.clone());
        let failure = match self.platform.download(media).await {
            Ok(artifact) => {
                let result = self
                    .platform
                    .send_files(self.target, vec![artifact.clone()], caption)
                    .await;
                artifact.discard().await;
                match result {
                    Ok(()) => {
                        info!(message_id = %msg.id, "Media sent");
                        return Ok(ForwardOutcome::Media);
                    }
                    Err(e) => e,
                }
            }
            Err(e) => e,
        };

        warn!(message_id = %msg.id, error = %failure, "Media forwarding failed");
        if rewritten.is_empty() {
            return Err(RelayError::SendMedia {
                message_id: msg.id,
                source: failure,
            });
        }

        self.platform
            .send_text(self.target, rewritten)
            .await
            .map(|()| {
                info!(message_id = %msg.id, "Text sent in place of media");
                ForwardOutcome::TextFallback
            })
            .map_err(|source| RelayError::SendText {
                message_id: msg.id,
                source,
            })
    }
}
