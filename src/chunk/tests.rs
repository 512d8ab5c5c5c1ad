use super::*;

#[test]
fn append_tracks_newlines() {
    let mut c = Chunk::with_capacity(64);
    c.append("a\nb\nc");
    assert_eq!(c.len(), 5);
    assert_eq!(c.line_starts(), &[1, 3]);
}

#[test]
fn insert_shifts_existing_newlines() {
    let mut c = Chunk::with_capacity(64);
    c.append("ab\ncd");
    c.insert(1, "XY").unwrap();
    assert_eq!(c.sub(0, c.len()).unwrap(), "aXYb\ncd");
    assert_eq!(c.line_starts(), &[5]);
}

#[test]
fn insert_adds_newlines_within_inserted_text() {
    let mut c = Chunk::with_capacity(64);
    c.append("ac");
    c.insert(1, "\nb\n").unwrap();
    assert_eq!(c.sub(0, c.len()).unwrap(), "a\nb\nc");
    assert_eq!(c.line_starts(), &[1, 3]);
}

#[test]
fn insert_out_of_range_fails() {
    let mut c = Chunk::with_capacity(64);
    c.append("abc");
    let err = c.insert(10, "x").unwrap_err();
    assert_eq!(err.kind, crate::error::ErrorKind::OutOfRange);
}

#[test]
fn delete_drops_inner_newlines_and_shifts_the_rest() {
    let mut c = Chunk::with_capacity(64);
    c.append("a\nb\nc\nd");
    c.delete(1, 4).unwrap();
    assert_eq!(c.sub(0, c.len()).unwrap(), "ac\nd");
    assert_eq!(c.line_starts(), &[2]);
}

#[test]
fn delete_out_of_range_fails() {
    let mut c = Chunk::with_capacity(64);
    c.append("abc");
    assert!(c.delete(2, 5).is_err());
}

#[test]
fn sub_returns_requested_slice() {
    let mut c = Chunk::with_capacity(64);
    c.append("hello world");
    assert_eq!(c.sub(6, 11).unwrap(), "world");
}

#[test]
fn free_space_tracks_capacity() {
    let mut c = Chunk::with_capacity(10);
    assert_eq!(c.free_space(), 10);
    c.append("abcd");
    assert_eq!(c.free_space(), 6);
}

#[test]
fn empty_insert_is_a_no_op() {
    let mut c = Chunk::with_capacity(64);
    c.append("abc");
    c.insert(1, "").unwrap();
    assert_eq!(c.sub(0, c.len()).unwrap(), "abc");
}
