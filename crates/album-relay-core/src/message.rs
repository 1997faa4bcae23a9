//! Chat message model shared by the relay and its platform adapters.
//!
//! Platform adapters convert their native updates into [`Message`] values so
//! the relay never depends on a concrete chat client.

use std::fmt;

/// Identifier of a chat on the platform.
pub type ChatId = i64;

/// Per-chat message identifier.
///
/// Identifiers grow monotonically inside one chat, so ordering them gives
/// chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageId(pub i64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier shared by all messages of one album (media group).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupId(pub String);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of media attached to a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    /// Compressed photo
    Photo,
    /// Video clip
    Video,
    /// GIF or silent MP4 animation
    Animation,
    /// Music track
    Audio,
    /// Voice note
    Voice,
    /// Arbitrary file
    Document,
    /// Sticker
    Sticker,
    /// Round video message
    VideoNote,
}

impl MediaKind {
    /// Returns `true` for photos, the only kind an album is assembled from.
    #[must_use]
    pub const fn is_photo(self) -> bool {
        matches!(self, Self::Photo)
    }

    /// Default file extension used when the platform does not report one.
    #[must_use]
    pub const fn default_extension(self) -> &'static str {
        match self {
            Self::Photo => "jpg",
            Self::Video | Self::Animation | Self::VideoNote => "mp4",
            Self::Audio => "mp3",
            Self::Voice => "ogg",
            Self::Document => "bin",
            Self::Sticker => "webp",
        }
    }
}

/// Reference to media stored on the platform, resolvable by a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef {
    /// Media kind
    pub kind: MediaKind,
    /// Platform file handle
    pub file_id: String,
    /// Original file name, when the platform keeps one
    pub file_name: Option<String>,
}

impl MediaRef {
    /// Creates a reference without a file name.
    #[must_use]
    pub fn new(kind: MediaKind, file_id: impl Into<String>) -> Self {
        Self {
            kind,
            file_id: file_id.into(),
            file_name: None,
        }
    }
}

/// A message observed in a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Message identifier
    pub id: MessageId,
    /// Sent by the account the relay runs as
    pub outbound: bool,
    /// Album the message belongs to, if any
    pub group_id: Option<GroupId>,
    /// Text or media caption
    pub text: Option<String>,
    /// Attached media
    pub media: Option<MediaRef>,
}

impl Message {
    /// Text or caption, empty when the message has none.
    #[must_use]
    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    /// Returns `true` when the attached media is a photo.
    #[must_use]
    pub fn has_photo(&self) -> bool {
        self.media.as_ref().is_some_and(|m| m.kind.is_photo())
    }

    /// Returns `true` when the message belongs to `group`.
    #[must_use]
    pub fn in_group(&self, group: &GroupId) -> bool {
        self.group_id.as_ref() == Some(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_photo() {
        let mut msg = Message {
            id: MessageId(1),
            outbound: false,
            group_id: None,
            text: None,
            media: None,
        };
        assert!(!msg.has_photo());

        msg.media = Some(MediaRef::new(MediaKind::Document, "doc"));
        assert!(!msg.has_photo());

        msg.media = Some(MediaRef::new(MediaKind::Photo, "photo"));
        assert!(msg.has_photo());
    }

    #[test]
    fn test_message_ids_order_chronologically() {
        let mut ids = vec![MessageId(105), MessageId(103), MessageId(104)];
        ids.sort();
        assert_eq!(ids, vec![MessageId(103), MessageId(104), MessageId(105)]);
    }
}
