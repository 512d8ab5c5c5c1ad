//! Plain substring scanning over a character slice, with no regex
//! compilation overhead. Used directly for literal queries and as the
//! fallback path when a regex pattern fails to compile.

pub fn find_all(haystack: &[char], needle: &[char], case_sensitive: bool) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    if needle.is_empty() || needle.len() > haystack.len() {
        return out;
    }

    let mut start = 0;
    let last_start = haystack.len() - needle.len();
    while start <= last_start {
        if matches_at(haystack, needle, start, case_sensitive) {
            out.push((start, start + needle.len()));
        }
        start += 1;
    }
    out
}

pub fn find_first(
    haystack: &[char],
    needle: &[char],
    from: usize,
    case_sensitive: bool,
) -> Option<(usize, usize)> {
    if needle.is_empty() || from + needle.len() > haystack.len() {
        return None;
    }
    let last_start = haystack.len() - needle.len();
    for start in from..=last_start {
        if matches_at(haystack, needle, start, case_sensitive) {
            return Some((start, start + needle.len()));
        }
    }
    None
}

fn matches_at(haystack: &[char], needle: &[char], start: usize, case_sensitive: bool) -> bool {
    for (i, &n) in needle.iter().enumerate() {
        let h = haystack[start + i];
        let eq = if case_sensitive {
            h == n
        } else {
            fold(h) == fold(n)
        };
        if !eq {
            return false;
        }
    }
    true
}

fn fold(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn finds_all_non_overlapping_occurrences_allowing_overlap_scan() {
        let h = chars("foo bar foo");
        let n = chars("foo");
        assert_eq!(find_all(&h, &n, true), vec![(0, 3), (8, 11)]);
    }

    #[test]
    fn case_insensitive_matches_regardless_of_case() {
        let h = chars("Foo FOO foo");
        let n = chars("foo");
        assert_eq!(find_all(&h, &n, false), vec![(0, 3), (4, 7), (8, 11)]);
    }

    #[test]
    fn case_sensitive_only_matches_exact_case() {
        let h = chars("Foo foo");
        let n = chars("foo");
        assert_eq!(find_all(&h, &n, true), vec![(4, 7)]);
    }

    #[test]
    fn empty_needle_matches_nothing() {
        let h = chars("abc");
        assert!(find_all(&h, &[], true).is_empty());
    }

    #[test]
    fn find_first_respects_starting_offset() {
        let h = chars("foo bar foo");
        let n = chars("foo");
        assert_eq!(find_first(&h, &n, 1, true), Some((8, 11)));
    }
}
