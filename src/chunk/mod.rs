//! Chunk buffer: a fixed-capacity, insert/delete-capable character sequence.
//!
//! Each chunk owns its characters and maintains a sorted list of the offsets
//! at which a newline (`0x0A`) occurs, so line queries never have to rescan
//! the character sequence.

use crate::error::{EngineError, Result};

pub const NEWLINE: char = '\n';

/// A mutable, fixed-capacity run of characters plus its own newline table.
#[derive(Clone, Debug)]
pub struct Chunk {
    chars: Vec<char>,
    capacity: usize,
    newlines: Vec<usize>,
}

impl Chunk {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            chars: Vec::with_capacity(capacity.min(4096)),
            capacity,
            newlines: Vec::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn free_space(&self) -> usize {
        self.capacity.saturating_sub(self.chars.len())
    }

    /// Sorted offsets of every newline currently in this chunk.
    pub fn line_starts(&self) -> &[usize] {
        &self.newlines
    }

    pub fn newline_count(&self) -> usize {
        self.newlines.len()
    }

    /// Append `s` to the end of the chunk, beyond `capacity` if necessary.
    /// Chunk-splitting on capacity is the pool's responsibility, not the chunk's.
    pub fn append(&mut self, s: &str) {
        let base = self.chars.len();
        for (i, c) in s.chars().enumerate() {
            if c == NEWLINE {
                self.newlines.push(base + i);
            }
            self.chars.push(c);
        }
    }

    pub fn insert(&mut self, pos: usize, s: &str) -> Result<()> {
        if pos > self.chars.len() {
            return Err(EngineError::out_of_range(format!(
                "insert position {} exceeds chunk length {}",
                pos,
                self.chars.len()
            )));
        }
        if s.is_empty() {
            return Ok(());
        }
        let inserted: Vec<char> = s.chars().collect();
        let shift = inserted.len();

        // Existing newline offsets at or past `pos` shift right by `shift`.
        for off in self.newlines.iter_mut() {
            if *off >= pos {
                *off += shift;
            }
        }
        let new_newlines: Vec<usize> = inserted
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == NEWLINE)
            .map(|(i, _)| pos + i)
            .collect();

        self.chars.splice(pos..pos, inserted);

        if !new_newlines.is_empty() {
            self.newlines.extend(new_newlines);
            self.newlines.sort_unstable();
        }
        Ok(())
    }

    pub fn delete(&mut self, pos: usize, n: usize) -> Result<()> {
        if n == 0 {
            return Ok(());
        }
        let end = pos
            .checked_add(n)
            .ok_or_else(|| EngineError::out_of_range("delete range overflow"))?;
        if end > self.chars.len() {
            return Err(EngineError::out_of_range(format!(
                "delete range [{}, {}) exceeds chunk length {}",
                pos,
                end,
                self.chars.len()
            )));
        }
        self.chars.drain(pos..end);
        self.newlines.retain(|&off| off < pos || off >= end);
        for off in self.newlines.iter_mut() {
            if *off >= end {
                *off -= n;
            }
        }
        Ok(())
    }

    pub fn sub(&self, start: usize, end: usize) -> Result<String> {
        if start > end || end > self.chars.len() {
            return Err(EngineError::out_of_range(format!(
                "range [{}, {}) out of bounds for chunk of length {}",
                start,
                end,
                self.chars.len()
            )));
        }
        Ok(self.chars[start..end].iter().collect())
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
