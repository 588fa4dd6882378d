//! Message tests

use crate::{Message, Part};

fn message_of(parts: &[&str]) -> Message {
    parts.iter().map(|p| Part::new(p.to_string())).collect()
}

#[test]
fn test_parts_keep_order() {
    let msg = message_of(&["first", "second", "third"]);

    let contents: Vec<&[u8]> = msg.iter().map(Part::as_slice).collect();
    assert_eq!(contents, vec![b"first" as &[u8], b"second", b"third"]);
}

#[test]
fn test_total_bytes() {
    let msg = message_of(&["ab", "cde"]);
    assert_eq!(msg.total_bytes(), 5);
    assert_eq!(msg.len(), 2);
}

#[test]
fn test_resolve_index_negative() {
    let msg = message_of(&["a", "b", "c"]);

    assert_eq!(msg.resolve_index(0), Some(0));
    assert_eq!(msg.resolve_index(2), Some(2));
    assert_eq!(msg.resolve_index(-1), Some(2));
    assert_eq!(msg.resolve_index(-3), Some(0));

    assert_eq!(msg.resolve_index(3), None);
    assert_eq!(msg.resolve_index(-4), None);
}

#[test]
fn test_deep_copy_isolates_each_part() {
    let mut msg = message_of(&["a", "b"]);
    msg.get_mut(0)
        .unwrap()
        .metadata_mut()
        .set("origin", "source");

    let mut copy = msg.deep_copy();
    copy.get_mut(0).unwrap().metadata_mut().set("origin", "copy");
    copy.get_mut(1).unwrap().metadata_mut().set("extra", "1");

    assert_eq!(msg.get(0).unwrap().metadata().get("origin"), Some("source"));
    assert!(msg.get(1).unwrap().metadata().is_empty());
}

#[test]
fn test_from_part() {
    let msg = Message::from(Part::new("solo"));
    assert_eq!(msg.len(), 1);
    assert_eq!(msg.get(0).unwrap().as_slice(), b"solo");
}
