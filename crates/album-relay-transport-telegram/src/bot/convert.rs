//! Conversion of Telegram messages into relay messages.

use album_relay_core::message::{GroupId, MediaKind, MediaRef, Message, MessageId};
use teloxide::types::Message as TgMessage;

/// Converts a Telegram message. `own_id` is the relay bot's user id and
/// decides the outbound flag.
#[must_use]
pub fn to_relay_message(msg: &TgMessage, own_id: i64) -> Message {
    let outbound = msg
        .from
        .as_ref()
        .is_some_and(|u| u.id.0.cast_signed() == own_id);

    Message {
        id: MessageId(i64::from(msg.id.0)),
        outbound,
        group_id: msg.media_group_id().map(|g| GroupId(g.to_string())),
        text: msg.text().or_else(|| msg.caption()).map(ToString::to_string),
        media: media_of(msg),
    }
}

fn media_of(msg: &TgMessage) -> Option<MediaRef> {
    if let Some(photos) = msg.photo() {
        // Largest size comes last
        return photos
            .last()
            .map(|p| MediaRef::new(MediaKind::Photo, p.file.id.to_string()));
    }
    if let Some(video) = msg.video() {
        return Some(MediaRef {
            kind: MediaKind::Video,
            file_id: video.file.id.to_string(),
            file_name: video.file_name.clone(),
        });
    }
    if let Some(animation) = msg.animation() {
        return Some(MediaRef {
            kind: MediaKind::Animation,
            file_id: animation.file.id.to_string(),
            file_name: animation.file_name.clone(),
        });
    }
    if let Some(audio) = msg.audio() {
        return Some(MediaRef {
            kind: MediaKind::Audio,
            file_id: audio.file.id.to_string(),
            file_name: audio.file_name.clone(),
        });
    }
    if let Some(voice) = msg.voice() {
        return Some(MediaRef::new(MediaKind::Voice, voice.file.id.to_string()));
    }
    if let Some(doc) = msg.document() {
        return Some(MediaRef {
            kind: MediaKind::Document,
            file_id: doc.file.id.to_string(),
            file_name: doc.file_name.clone(),
        });
    }
    if let Some(sticker) = msg.sticker() {
        return Some(MediaRef::new(MediaKind::Sticker, sticker.file.id.to_string()));
    }
    msg.video_note()
        .map(|note| MediaRef::new(MediaKind::VideoNote, note.file.id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWN_ID: i64 = 999;

    fn parse(value: serde_json::Value) -> TgMessage {
        match serde_json::from_value(value) {
            Ok(msg) => msg,
            Err(e) => panic!("test message should parse: {e}"),
        }
    }

    fn chat() -> serde_json::Value {
        serde_json::json!({ "id": -1_002_380_114_448_i64, "type": "supergroup", "title": "source" })
    }

    #[test]
    fn test_album_photo() {
        let msg = parse(serde_json::json!({
            "message_id": 103,
            "date": 1_700_000_000,
            "chat": chat(),
            "from": { "id": 42, "is_bot": false, "first_name": "Alice" },
            "media_group_id": "13579",
            "caption": "buy @cashxcore now",
            "photo": [
                {
                    "file_id": "small", "file_unique_id": "s",
                    "width": 90, "height": 90, "file_size": 100
                },
                {
                    "file_id": "large", "file_unique_id": "l",
                    "width": 800, "height": 800, "file_size": 1000
                }
            ]
        }));

        let converted = to_relay_message(&msg, OWN_ID);

        assert_eq!(converted.id, MessageId(103));
        assert!(!converted.outbound);
        assert_eq!(converted.group_id, Some(GroupId("13579".to_string())));
        assert_eq!(converted.text.as_deref(), Some("buy @cashxcore now"));
        assert_eq!(
            converted.media,
            Some(MediaRef::new(MediaKind::Photo, "large"))
        );
    }

    #[test]
    fn test_own_text_message_is_outbound() {
        let msg = parse(serde_json::json!({
            "message_id": 7,
            "date": 1_700_000_000,
            "chat": chat(),
            "from": { "id": OWN_ID, "is_bot": true, "first_name": "Relay" },
            "text": "hello"
        }));

        let converted = to_relay_message(&msg, OWN_ID);

        assert!(converted.outbound);
        assert_eq!(converted.group_id, None);
        assert_eq!(converted.text.as_deref(), Some("hello"));
        assert_eq!(converted.media, None);
    }

    #[test]
    fn test_document_keeps_file_name() {
        let msg = parse(serde_json::json!({
            "message_id": 8,
            "date": 1_700_000_000,
            "chat": chat(),
            "from": { "id": 42, "is_bot": false, "first_name": "Alice" },
            "document": {
                "file_id": "doc-1",
                "file_unique_id": "d1",
                "file_name": "report.pdf",
                "mime_type": "application/pdf",
                "file_size": 2048
            }
        }));

        let converted = to_relay_message(&msg, OWN_ID);

        assert_eq!(converted.text, None);
        assert_eq!(
            converted.media,
            Some(MediaRef {
                kind: MediaKind::Document,
                file_id: "doc-1".to_string(),
                file_name: Some("report.pdf".to_string()),
            })
        );
    }
}
