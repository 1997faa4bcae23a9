//! Chat platform boundary.
//!
//! The relay only talks to the outside world through [`ChatPlatform`]. Every
//! call is fallible and the relay decides how to degrade.

use crate::message::{ChatId, MediaKind, MediaRef, Message};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors reported by a chat platform.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// The platform rejected the request
    #[error("API error: {0}")]
    Api(String),
    /// Transport-level failure
    #[error("Network error: {0}")]
    Network(String),
    /// Local file error while downloading or uploading
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Credentials were rejected
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    /// The platform cannot perform the request
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

/// Account the relay is connected as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    /// Platform user identifier
    pub id: i64,
    /// Display name
    pub display_name: String,
}

/// A media file materialised on local disk.
///
/// Owned by the relay for one forwarding operation and removed with
/// [`Artifact::discard`] once that operation is done with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    path: PathBuf,
    kind: MediaKind,
}

impl Artifact {
    /// Wraps a downloaded file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, kind: MediaKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// Local path of the file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Kind of media the file holds.
    #[must_use]
    pub const fn kind(&self) -> MediaKind {
        self.kind
    }

    /// Deletes the file. A file that is already gone is not an error.
    pub async fn discard(self) {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => debug!(path = %self.path.display(), "Artifact removed"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to remove artifact"),
        }
    }
}

/// Removes every artifact in `artifacts`.
pub async fn discard_all(artifacts: impl IntoIterator<Item = Artifact>) {
    for artifact in artifacts {
        artifact.discard().await;
    }
}

/// Capabilities the relay needs from a chat platform.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Connects and verifies the credentials.
    async fn connect(&self) -> Result<AccountInfo, PlatformError>;

    /// Up to `limit` most recent messages of `chat`, newest first.
    async fn fetch_recent(&self, chat: ChatId, limit: usize) -> Result<Vec<Message>, PlatformError>;

    /// Downloads `media` to a local artifact.
    async fn download(&self, media: MediaRef) -> Result<Artifact, PlatformError>;

    /// Sends `files` to `chat` as one grouped unit with an optional caption.
    async fn send_files(
        &self,
        chat: ChatId,
        files: Vec<Artifact>,
        caption: Option<String>,
    ) -> Result<(), PlatformError>;

    /// Sends a plain text message to `chat`.
    async fn send_text(&self, chat: ChatId, text: String) -> Result<(), PlatformError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_discard_removes_file() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("photo.jpg");
        tokio::fs::write(&path, b"jpeg").await?;

        Artifact::new(&path, MediaKind::Photo).discard().await;

        assert!(!path.exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_discard_missing_file_is_silent() {
        Artifact::new("/nonexistent/album-relay/photo.jpg", MediaKind::Photo)
            .discard()
            .await;
    }
}
