//! Telegram Bot API implementation of the chat platform.

use super::history::RecentHistory;
use album_relay_core::message::{ChatId, MediaKind, MediaRef, Message};
use album_relay_core::platform::{AccountInfo, Artifact, ChatPlatform, PlatformError};
use album_relay_core::utils::truncate_str;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{
    FileId, InputFile, InputMedia, InputMediaAudio, InputMediaDocument, InputMediaPhoto,
    InputMediaVideo,
};
use teloxide::{ApiError, DownloadError, RequestError};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

/// Maximum caption length accepted by Telegram.
pub const CAPTION_LIMIT: usize = 1024;
/// Maximum text message length accepted by Telegram.
pub const TEXT_LIMIT: usize = 4096;
/// Maximum number of items in one media group.
pub const MEDIA_GROUP_LIMIT: usize = 10;

/// Maps a Bot API request failure onto the platform error taxonomy.
#[must_use]
pub fn request_error(e: RequestError) -> PlatformError {
    match e {
        RequestError::Api(ApiError::InvalidToken) => {
            PlatformError::Unauthorized(ApiError::InvalidToken.to_string())
        }
        RequestError::Api(api) => PlatformError::Api(api.to_string()),
        RequestError::Network(net) => PlatformError::Network(net.to_string()),
        other => PlatformError::Api(other.to_string()),
    }
}

fn download_error(e: DownloadError) -> PlatformError {
    PlatformError::Network(e.to_string())
}

/// Chat platform backed by a Telegram bot.
pub struct TelegramPlatform {
    bot: Bot,
    source: ChatId,
    history: Arc<Mutex<RecentHistory>>,
    download_dir: PathBuf,
}

impl TelegramPlatform {
    /// Creates a platform reading `source` history from `history`.
    #[must_use]
    pub fn new(
        bot: Bot,
        source: ChatId,
        history: Arc<Mutex<RecentHistory>>,
        download_dir: PathBuf,
    ) -> Self {
        Self {
            bot,
            source,
            history,
            download_dir,
        }
    }

    async fn send_single(
        &self,
        chat: ChatId,
        artifact: &Artifact,
        caption: Option<String>,
    ) -> Result<(), RequestError> {
        let chat_id = teloxide::types::ChatId(chat);
        let file = InputFile::file(artifact.path().to_path_buf());
        let text = caption.unwrap_or_default();

        match artifact.kind() {
            MediaKind::Photo => self.bot.send_photo(chat_id, file).caption(text).await?,
            MediaKind::Video => self.bot.send_video(chat_id, file).caption(text).await?,
            MediaKind::Animation => self.bot.send_animation(chat_id, file).caption(text).await?,
            MediaKind::Audio => self.bot.send_audio(chat_id, file).caption(text).await?,
            MediaKind::Voice => self.bot.send_voice(chat_id, file).caption(text).await?,
            MediaKind::Document => self.bot.send_document(chat_id, file).caption(text).await?,
            // No caption on these kinds, the text follows as its own message
            MediaKind::Sticker => {
                self.bot.send_sticker(chat_id, file).await?;
                return self.send_trailing_text(chat_id, text).await;
            }
            MediaKind::VideoNote => {
                self.bot.send_video_note(chat_id, file).await?;
                return self.send_trailing_text(chat_id, text).await;
            }
        };
        Ok(())
    }

    async fn send_trailing_text(
        &self,
        chat_id: teloxide::types::ChatId,
        text: String,
    ) -> Result<(), RequestError> {
        if !text.is_empty() {
            self.bot.send_message(chat_id, text).await?;
        }
        Ok(())
    }

    async fn send_group(
        &self,
        chat: ChatId,
        files: &[Artifact],
        caption: Option<String>,
    ) -> Result<(), RequestError> {
        let mut caption = caption;

        for chunk in files.chunks(MEDIA_GROUP_LIMIT) {
            if let [single] = chunk {
                self.send_single(chat, single, caption.take()).await?;
                continue;
            }
            let media: Vec<InputMedia> = chunk
                .iter()
                .map(|artifact| input_media(artifact, caption.take()))
                .collect();
            self.bot
                .send_media_group(teloxide::types::ChatId(chat), media)
                .await?;
        }

        Ok(())
    }
}

/// Media group entry for `artifact`.
fn input_media(artifact: &Artifact, caption: Option<String>) -> InputMedia {
    let file = InputFile::file(artifact.path().to_path_buf());
    let caption = caption.unwrap_or_default();
    match artifact.kind() {
        MediaKind::Photo => InputMedia::Photo(InputMediaPhoto::new(file).caption(caption)),
        MediaKind::Video => InputMedia::Video(InputMediaVideo::new(file).caption(caption)),
        MediaKind::Audio => InputMedia::Audio(InputMediaAudio::new(file).caption(caption)),
        _ => InputMedia::Document(InputMediaDocument::new(file).caption(caption)),
    }
}

/// Local file name for a download of `media` served from `remote_path`.
fn artifact_name(media: &MediaRef, remote_path: &str) -> String {
    let extension = Path::new(remote_path)
        .extension()
        .and_then(|ext| ext.to_str())
        .or_else(|| {
            media
                .file_name
                .as_deref()
                .and_then(|name| Path::new(name).extension())
                .and_then(|ext| ext.to_str())
        })
        .unwrap_or_else(|| media.kind.default_extension());
    format!("{}.{extension}", Uuid::new_v4().as_simple())
}

#[async_trait]
impl ChatPlatform for TelegramPlatform {
    async fn connect(&self) -> Result<AccountInfo, PlatformError> {
        let me = self.bot.get_me().await.map_err(request_error)?;
        Ok(AccountInfo {
            id: me.id.0.cast_signed(),
            display_name: me.full_name(),
        })
    }

    async fn fetch_recent(
        &self,
        chat: ChatId,
        limit: usize,
    ) -> Result<Vec<Message>, PlatformError> {
        if chat != self.source {
            return Err(PlatformError::Unsupported(format!(
                "history is only kept for chat {}",
                self.source
            )));
        }
        Ok(self.history.lock().await.recent(limit))
    }

    async fn download(&self, media: MediaRef) -> Result<Artifact, PlatformError> {
        tokio::fs::create_dir_all(&self.download_dir).await?;

        let file = self
            .bot
            .get_file(FileId(media.file_id.clone()))
            .await
            .map_err(request_error)?;

        let path = self.download_dir.join(artifact_name(&media, &file.path));
        let mut dst = tokio::fs::File::create(&path).await?;
        let artifact = Artifact::new(path, media.kind);

        let downloaded = match self.bot.download_file(&file.path, &mut dst).await {
            Ok(()) => dst.flush().await.map_err(PlatformError::from),
            Err(e) => Err(download_error(e)),
        };
        drop(dst);
        if let Err(e) = downloaded {
            artifact.discard().await;
            return Err(e);
        }

        debug!(
            path = %artifact.path().display(),
            kind = ?media.kind,
            "Downloaded media from Telegram"
        );
        Ok(artifact)
    }

    async fn send_files(
        &self,
        chat: ChatId,
        files: Vec<Artifact>,
        caption: Option<String>,
    ) -> Result<(), PlatformError> {
        let caption = caption.map(|c| truncate_str(&c, CAPTION_LIMIT).to_string());

        let result = match files.as_slice() {
            [] => return Err(PlatformError::Unsupported("no files to send".to_string())),
            [single] => self.send_single(chat, single, caption).await,
            many => {
                info!(chat_id = chat, count = many.len(), "Sending media group");
                self.send_group(chat, many, caption).await
            }
        };
        result.map_err(request_error)
    }

    async fn send_text(&self, chat: ChatId, text: String) -> Result<(), PlatformError> {
        let text = truncate_str(&text, TEXT_LIMIT).to_string();
        self.bot
            .send_message(teloxide::types::ChatId(chat), text)
            .await
            .map(drop)
            .map_err(request_error)
    }
}
