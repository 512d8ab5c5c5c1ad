use super::*;

fn p(start: usize, length: usize) -> Piece {
    Piece::new(0, start, length, 0)
}

#[test]
fn push_back_builds_in_order_sequence() {
    let mut idx = PieceIndex::new();
    idx.push_back(p(0, 3));
    idx.push_back(p(3, 3));
    idx.push_back(p(6, 3));
    idx.check_invariants();
    assert_eq!(idx.total_len(), 9);
    let ids = idx.ids_in_order();
    assert_eq!(ids.len(), 3);
    assert_eq!(idx.piece(ids[0]).start, 0);
    assert_eq!(idx.piece(ids[2]).start, 6);
}

#[test]
fn insert_first_prepends() {
    let mut idx = PieceIndex::new();
    idx.push_back(p(3, 3));
    idx.insert_first(p(0, 3));
    idx.check_invariants();
    let ids = idx.ids_in_order();
    assert_eq!(idx.piece(ids[0]).start, 0);
    assert_eq!(idx.piece(ids[1]).start, 3);
}

#[test]
fn insert_after_and_before_preserve_order() {
    let mut idx = PieceIndex::new();
    let a = idx.push_back(p(0, 1));
    let c = idx.push_back(p(2, 1));
    idx.insert_after(a, p(1, 1));
    idx.insert_before(c, p(3, 1));
    idx.check_invariants();
    let starts: Vec<usize> = idx.ids_in_order().iter().map(|&id| idx.piece(id).start).collect();
    assert_eq!(starts, vec![0, 1, 3, 2]);
}

#[test]
fn many_insertions_keep_rb_invariants() {
    let mut idx = PieceIndex::new();
    for i in 0..200usize {
        idx.push_back(p(i, 1));
    }
    idx.check_invariants();
    assert_eq!(idx.total_len(), 200);
}

#[test]
fn locate_finds_containing_piece_and_remainder() {
    let mut idx = PieceIndex::new();
    idx.push_back(p(0, 5)); // document [0,5)
    idx.push_back(p(5, 5)); // document [5,10)
    let (id, rem) = idx.locate(7).unwrap();
    assert_eq!(idx.piece(id).start, 5);
    assert_eq!(rem, 2);

    let (id0, rem0) = idx.locate(0).unwrap();
    assert_eq!(idx.piece(id0).start, 0);
    assert_eq!(rem0, 0);
}

#[test]
fn locate_at_total_length_returns_last_piece() {
    let mut idx = PieceIndex::new();
    idx.push_back(p(0, 5));
    let (id, rem) = idx.locate(5).unwrap();
    assert_eq!(idx.piece(id).start, 0);
    assert_eq!(rem, 5);
}

#[test]
fn locate_beyond_length_is_out_of_range() {
    let mut idx = PieceIndex::new();
    idx.push_back(p(0, 3));
    assert!(idx.locate(4).is_err());
}

#[test]
fn locate_on_empty_index_is_empty_document() {
    let idx = PieceIndex::new();
    let err = idx.locate(0).unwrap_err();
    assert_eq!(err.kind, crate::error::ErrorKind::EmptyDocument);
}

#[test]
fn position_of_matches_document_order() {
    let mut idx = PieceIndex::new();
    let mut ids = Vec::new();
    for i in 0..10usize {
        ids.push(idx.push_back(p(i * 4, 4)));
    }
    for (i, &id) in ids.iter().enumerate() {
        assert_eq!(idx.position_of(id), i * 4);
    }
}

#[test]
fn split_produces_two_adjacent_pieces_summing_to_the_original() {
    let mut idx = PieceIndex::new();
    let a = idx.push_back(Piece::new(0, 0, 10, 2));
    let right = idx.split(a, 4, 1).unwrap();
    idx.check_invariants();

    assert_eq!(idx.piece(a).length, 4);
    assert_eq!(idx.piece(a).newlines, 1);
    assert_eq!(idx.piece(right).start, 4);
    assert_eq!(idx.piece(right).length, 6);
    assert_eq!(idx.piece(right).newlines, 1);
    assert_eq!(idx.total_len(), 10);

    let ids = idx.ids_in_order();
    assert_eq!(ids, vec![a, right]);
}

#[test]
fn split_out_of_range_k_is_rejected() {
    let mut idx = PieceIndex::new();
    let a = idx.push_back(p(0, 5));
    assert!(idx.split(a, 0, 0).is_err());
    assert!(idx.split(a, 5, 0).is_err());
}

#[test]
fn delete_leaf_keeps_invariants() {
    let mut idx = PieceIndex::new();
    let a = idx.push_back(p(0, 1));
    let b = idx.push_back(p(1, 1));
    idx.push_back(p(2, 1));
    idx.delete(b);
    idx.check_invariants();
    assert_eq!(idx.total_len(), 2);
    let starts: Vec<usize> = idx.ids_in_order().iter().map(|&id| idx.piece(id).start).collect();
    assert_eq!(starts, vec![0, 2]);
    let _ = a;
}

#[test]
fn delete_every_node_in_forward_order() {
    let mut idx = PieceIndex::new();
    let mut ids = Vec::new();
    for i in 0..50usize {
        ids.push(idx.push_back(p(i, 1)));
    }
    for id in ids {
        idx.delete(id);
        idx.check_invariants();
    }
    assert!(idx.is_empty());
    assert_eq!(idx.total_len(), 0);
}

#[test]
fn delete_every_node_in_reverse_order() {
    let mut idx = PieceIndex::new();
    let mut ids = Vec::new();
    for i in 0..50usize {
        ids.push(idx.push_back(p(i, 1)));
    }
    for id in ids.into_iter().rev() {
        idx.delete(id);
        idx.check_invariants();
    }
    assert!(idx.is_empty());
}

#[test]
fn freed_slots_are_reused_by_later_inserts() {
    let mut idx = PieceIndex::new();
    let a = idx.push_back(p(0, 1));
    idx.delete(a);
    let b = idx.push_back(p(1, 1));
    // The arena slot should have been recycled rather than growing unbounded.
    assert_eq!(a, b);
}

#[test]
fn newline_aggregates_sum_across_subtree() {
    let mut idx = PieceIndex::new();
    idx.push_back(Piece::new(0, 0, 5, 1));
    idx.push_back(Piece::new(0, 5, 5, 2));
    idx.push_back(Piece::new(0, 10, 5, 0));
    idx.check_invariants();
    assert_eq!(idx.total_newlines(), 3);
}

#[test]
fn update_piece_repairs_ancestor_aggregates() {
    let mut idx = PieceIndex::new();
    idx.push_back(Piece::new(0, 0, 5, 1));
    let b = idx.push_back(Piece::new(0, 5, 5, 0));
    idx.push_back(Piece::new(0, 10, 5, 1));
    idx.update_piece(b, |p| {
        p.length += 3;
        p.newlines += 1;
    });
    idx.check_invariants();
    assert_eq!(idx.piece(b).length, 8);
    assert_eq!(idx.total_len(), 18);
    assert_eq!(idx.total_newlines(), 3);
}

#[test]
fn iter_yields_pieces_in_document_order() {
    let mut idx = PieceIndex::new();
    let pieces_text = ["abc", "def", "ghi"];
    idx.push_back(Piece::new(0, 0, 3, 0));
    idx.push_back(Piece::new(1, 0, 3, 0));
    idx.push_back(Piece::new(2, 0, 3, 0));
    let joined: String = idx
        .iter()
        .map(|piece| pieces_text[piece.buffer_id as usize])
        .collect();
    assert_eq!(joined, "abcdefghi");
}
