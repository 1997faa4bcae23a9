use album_relay_core::album::Album;
use album_relay_core::dedup::ProcessedIds;
use album_relay_core::message::{GroupId, MediaKind, MediaRef, Message, MessageId};
use album_relay_core::rewrite::HandleRewriter;
use proptest::prelude::*;

const HANDLE: &str = "cashxcore";
const REPLACEMENT: &str = "@InfoXCashReal";

fn rewriter() -> HandleRewriter {
    HandleRewriter::new(HANDLE, REPLACEMENT).unwrap_or_else(|e| panic!("{e}"))
}

/// Random letter casing of the `@cashxcore` token.
fn cased_token() -> impl Strategy<Value = String> {
    proptest::collection::vec(proptest::bool::ANY, HANDLE.len()).prop_map(|upper| {
        let handle: String = HANDLE
            .chars()
            .zip(upper)
            .map(|(c, up)| if up { c.to_ascii_uppercase() } else { c })
            .collect();
        format!("@{handle}")
    })
}

fn photo(id: i64, group: &str) -> Message {
    Message {
        id: MessageId(id),
        outbound: false,
        group_id: Some(GroupId(group.to_string())),
        text: None,
        media: Some(MediaRef::new(MediaKind::Photo, format!("f{id}"))),
    }
}

proptest! {
    /// Text without an `@` can never contain the token and passes through.
    #[test]
    fn absent_token_is_identity(s in "[^@]*") {
        let r = rewriter();
        prop_assert_eq!(r.rewrite(&s), s.as_str());
    }

    /// Every casing of the token is replaced and the surrounding text kept.
    #[test]
    fn replaces_every_occurrence(
        parts in proptest::collection::vec("[a-z ]{0,8}", 1..5),
        tokens in proptest::collection::vec(cased_token(), 4),
    ) {
        let mut input = String::new();
        let mut expected = String::new();
        for (i, part) in parts.iter().enumerate() {
            input.push_str(part);
            expected.push_str(part);
            if i + 1 < parts.len() {
                input.push(' ');
                input.push_str(&tokens[i % tokens.len()]);
                input.push(' ');
                expected.push(' ');
                expected.push_str(REPLACEMENT);
                expected.push(' ');
            }
        }

        prop_assert_eq!(rewriter().rewrite(&input), expected.as_str());
    }

    /// A replacement free of the token makes the rewrite idempotent.
    #[test]
    fn rewrite_is_idempotent(
        parts in proptest::collection::vec("\\PC{0,8}", 1..5),
        tokens in proptest::collection::vec(cased_token(), 4),
    ) {
        let mut input = String::new();
        for (i, part) in parts.iter().enumerate() {
            input.push_str(part);
            if i + 1 < parts.len() {
                input.push_str(&tokens[i % tokens.len()]);
            }
        }

        let r = rewriter();
        let once = r.rewrite(&input).into_owned();
        let twice = r.rewrite(&once).into_owned();
        if parts.len() > 1 {
            prop_assert_ne!(&once, &input);
        }
        prop_assert_eq!(once, twice);
    }

    /// The assembled album is strictly ascending whatever the scan order.
    #[test]
    fn album_is_strictly_ascending(
        ids in proptest::collection::vec(1i64..50, 0..12),
        trigger_id in 1i64..50,
    ) {
        let trigger = photo(trigger_id, "g");
        let mut scanned: Vec<Message> = ids.iter().map(|&id| photo(id, "g")).collect();
        scanned.extend(ids.iter().map(|&id| photo(id + 100, "other")));

        let album = Album::assemble(
            &trigger,
            GroupId("g".to_string()),
            scanned,
            &mut ProcessedIds::default(),
        );

        let got = album.ids();
        prop_assert!(got.windows(2).all(|w| w[0] < w[1]));
        prop_assert!(got.contains(&MessageId(trigger_id)));
        prop_assert!(got.iter().all(|id| id.0 < 100));
    }
}
