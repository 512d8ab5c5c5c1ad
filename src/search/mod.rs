//! Substring and regular-expression search over the document, scanning one
//! chunk at a time so a match never requires materializing the whole
//! document.

mod literal_search;

use crate::error::Result;
use regex::{Regex, RegexBuilder};

/// A match expressed in absolute document character offsets, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub start: usize,
    pub end: usize,
}

/// One chunk's character content plus the document offset of its first
/// character, the unit the search scan walks over.
pub struct ChunkSlice<'a> {
    pub base: usize,
    pub chars: &'a [char],
}

fn compile(pattern: &str, case_sensitive: bool) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(!case_sensitive)
        .build()
        .map_err(|e| crate::error::EngineError::invalid_pattern(e.to_string()))
}

fn regex_matches_in_chunk(re: &Regex, chunk: &ChunkSlice<'_>) -> Vec<Match> {
    let text: String = chunk.chars.iter().collect();
    re.find_iter(&text)
        .map(|m| {
            let char_start = text[..m.start()].chars().count();
            let char_end = char_start + text[m.start()..m.end()].chars().count();
            Match {
                start: chunk.base + char_start,
                end: chunk.base + char_end,
            }
        })
        .collect()
}

fn scan(
    chunks: impl Iterator<Item = ChunkSlice<'_>>,
    pattern: &str,
    start_offset: usize,
    case_sensitive: bool,
    is_regex: bool,
    stop_at_first: bool,
) -> Vec<Match> {
    let compiled = if is_regex {
        match compile(pattern, case_sensitive) {
            Ok(re) => Some(re),
            Err(e) => {
                e.log();
                None
            }
        }
    } else {
        None
    };

    let needle: Vec<char> = pattern.chars().collect();
    let mut out = Vec::new();

    for chunk in chunks {
        let chunk_end = chunk.base + chunk.chars.len();
        if chunk_end <= start_offset {
            continue;
        }

        let matches = match &compiled {
            Some(re) => regex_matches_in_chunk(re, &chunk),
            None if stop_at_first => {
                let local_from = start_offset.saturating_sub(chunk.base);
                literal_search::find_first(chunk.chars, &needle, local_from, case_sensitive)
                    .into_iter()
                    .map(|(s, e)| Match {
                        start: chunk.base + s,
                        end: chunk.base + e,
                    })
                    .collect()
            }
            None => literal_search::find_all(chunk.chars, &needle, case_sensitive)
                .into_iter()
                .map(|(s, e)| Match {
                    start: chunk.base + s,
                    end: chunk.base + e,
                })
                .collect(),
        };

        for m in matches {
            if m.start < start_offset {
                continue;
            }
            out.push(m);
            if stop_at_first {
                return out;
            }
        }
    }

    out
}

/// Find every match across the chunk sequence, starting the scan at
/// `start_offset` (chunks entirely before it are skipped; the chunk that
/// contains it is scanned in full, since a match may straddle the offset).
/// An invalid regex pattern is demoted to a literal search, per the error
/// handling design.
pub fn search_multi<'a>(
    chunks: impl Iterator<Item = ChunkSlice<'a>>,
    pattern: &str,
    start_offset: usize,
    case_sensitive: bool,
    is_regex: bool,
) -> Vec<Match> {
    scan(chunks, pattern, start_offset, case_sensitive, is_regex, false)
}

/// Find the first match at or after `start_offset`.
pub fn search_single<'a>(
    chunks: impl Iterator<Item = ChunkSlice<'a>>,
    pattern: &str,
    start_offset: usize,
    case_sensitive: bool,
    is_regex: bool,
) -> Option<Match> {
    scan(chunks, pattern, start_offset, case_sensitive, is_regex, true)
        .into_iter()
        .next()
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
