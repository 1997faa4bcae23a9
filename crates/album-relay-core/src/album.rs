//! Album assembly from a bounded window of recent history.
//!
//! Membership is a best-effort heuristic: siblings that already scrolled out
//! of the scanned window are not found.

use crate::dedup::ProcessedIds;
use crate::message::{GroupId, Message, MessageId};

/// Photos of one media group, ordered by ascending message identifier.
#[derive(Debug, Clone)]
pub struct Album {
    group_id: GroupId,
    members: Vec<Message>,
}

impl Album {
    /// Collects the album of `trigger` from `scanned` history.
    ///
    /// The trigger is included when it carries a photo. A scanned message joins
    /// when it is a different message of the same group, carries a photo and
    /// has not been processed yet. Every included identifier is recorded in
    /// `processed` immediately.
    #[must_use]
    pub fn assemble(
        trigger: &Message,
        group_id: GroupId,
        scanned: impl IntoIterator<Item = Message>,
        processed: &mut ProcessedIds,
    ) -> Self {
        let mut members = Vec::new();

        if trigger.has_photo() {
            members.push(trigger.clone());
            processed.insert(trigger.id);
        }

        for msg in scanned {
            if msg.id != trigger.id
                && msg.in_group(&group_id)
                && msg.has_photo()
                && !processed.contains(msg.id)
            {
                processed.insert(msg.id);
                members.push(msg);
            }
        }

        members.sort_by_key(|m| m.id);
        members.dedup_by_key(|m| m.id);

        Self { group_id, members }
    }

    /// Media group identifier.
    #[must_use]
    pub const fn group_id(&self) -> &GroupId {
        &self.group_id
    }

    /// Members in chronological order.
    #[must_use]
    pub fn members(&self) -> &[Message] {
        &self.members
    }

    /// Member identifiers in chronological order.
    #[must_use]
    pub fn ids(&self) -> Vec<MessageId> {
        self.members.iter().map(|m| m.id).collect()
    }

    /// Number of photos in the album.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` when no photo was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Caption for the whole album: the first non-empty member text.
    #[must_use]
    pub fn caption(&self) -> &str {
        self.members
            .iter()
            .map(Message::text_or_empty)
            .find(|t| !t.is_empty())
            .unwrap_or("")
    }
}
