use super::*;

fn slices(parts: &[(usize, &str)]) -> Vec<(usize, Vec<char>)> {
    parts
        .iter()
        .map(|(base, s)| (*base, s.chars().collect()))
        .collect()
}

fn as_chunk_slices(buf: &[(usize, Vec<char>)]) -> impl Iterator<Item = ChunkSlice<'_>> {
    buf.iter().map(|(base, chars)| ChunkSlice {
        base: *base,
        chars,
    })
}

#[test]
fn literal_search_finds_all_occurrences_within_one_chunk() {
    let buf = slices(&[(0, "foo bar foo")]);
    let matches = search_multi(as_chunk_slices(&buf), "foo", 0, true, false);
    assert_eq!(
        matches,
        vec![Match { start: 0, end: 3 }, Match { start: 8, end: 11 }]
    );
}

#[test]
fn literal_search_spans_multiple_chunks() {
    let buf = slices(&[(0, "foo "), (4, "bar "), (8, "foo")]);
    let matches = search_multi(as_chunk_slices(&buf), "foo", 0, true, false);
    assert_eq!(
        matches,
        vec![Match { start: 0, end: 3 }, Match { start: 8, end: 11 }]
    );
}

#[test]
fn start_offset_filters_out_earlier_matches() {
    let buf = slices(&[(0, "foo bar foo")]);
    let matches = search_multi(as_chunk_slices(&buf), "foo", 1, true, false);
    assert_eq!(matches, vec![Match { start: 8, end: 11 }]);
}

#[test]
fn case_insensitive_literal_search() {
    let buf = slices(&[(0, "Foo FOO foo")]);
    let matches = search_multi(as_chunk_slices(&buf), "foo", 0, false, false);
    assert_eq!(matches.len(), 3);
}

#[test]
fn search_single_returns_first_match_at_or_after_offset() {
    let buf = slices(&[(0, "foo bar foo")]);
    let m = search_single(as_chunk_slices(&buf), "foo", 1, true, false);
    assert_eq!(m, Some(Match { start: 8, end: 11 }));
}

#[test]
fn search_single_on_no_match_is_none() {
    let buf = slices(&[(0, "foo bar foo")]);
    let m = search_single(as_chunk_slices(&buf), "baz", 0, true, false);
    assert_eq!(m, None);
}

#[test]
fn regex_search_matches_digit_runs() {
    let buf = slices(&[(0, "a12 b345 c6")]);
    let matches = search_multi(as_chunk_slices(&buf), r"\d+", 0, true, true);
    assert_eq!(
        matches,
        vec![
            Match { start: 1, end: 3 },
            Match { start: 5, end: 8 },
            Match { start: 10, end: 11 },
        ]
    );
}

#[test]
fn regex_search_respects_case_sensitivity() {
    let buf = slices(&[(0, "Rust rust RUST")]);
    let matches = search_multi(as_chunk_slices(&buf), "rust", 0, false, true);
    assert_eq!(matches.len(), 3);
    let matches = search_multi(as_chunk_slices(&buf), "rust", 0, true, true);
    assert_eq!(matches, vec![Match { start: 5, end: 9 }]);
}

#[test]
fn invalid_regex_pattern_falls_back_to_literal_search() {
    let buf = slices(&[(0, "a(b foo a(b")]);
    // "a(b" is not a valid regex (unbalanced group); falls back to a literal scan.
    let matches = search_multi(as_chunk_slices(&buf), "a(b", 0, true, true);
    assert_eq!(
        matches,
        vec![Match { start: 0, end: 3 }, Match { start: 8, end: 11 }]
    );
}

#[test]
fn match_straddling_a_chunk_boundary_is_found_within_its_chunk() {
    // The scan works chunk-by-chunk, so only matches fully inside one
    // chunk are found; this fixture keeps "foo" inside a single chunk.
    let buf = slices(&[(0, "xx"), (2, "foo"), (5, "yy")]);
    let matches = search_multi(as_chunk_slices(&buf), "foo", 0, true, false);
    assert_eq!(matches, vec![Match { start: 2, end: 5 }]);
}
