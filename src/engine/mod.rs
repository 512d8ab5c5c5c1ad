//! The edit engine: the top-level API that orchestrates the buffer pool and
//! the piece index, captures undo/redo history, and notifies listeners.
//!
//! Every public operation runs inside a single guarded boundary (see
//! `with_inner`): calls never interleave (a single-threaded embedding is
//! assumed, per the concurrency model), and a listener callback that tries
//! to call back into the engine is rejected rather than allowed to corrupt
//! state or deadlock.

use crate::chunk::{Chunk, NEWLINE};
use crate::error::{EngineError, Result};
use crate::history::{ActionKind, Journal, Plan, Step};
use crate::listener::{ContentListener, JournalListener};
use crate::index::{NodeId, PieceIndex};
use crate::piece::Piece;
use crate::pool::{BufferPool, ChunkId, DEFAULT_CHUNK_CAPACITY};
use crate::search::{self, Match};
use std::cell::RefCell;
use std::time::{SystemTime, UNIX_EPOCH};

fn now_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

fn newlines_in_range(chunk: &Chunk, start: usize, end: usize) -> usize {
    chunk
        .line_starts()
        .iter()
        .filter(|&&off| off >= start && off < end)
        .count()
}

/// Construction parameters for an `EditEngine`.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub initial_content: String,
    pub chunk_capacity: usize,
    pub single_buffer: bool,
    pub throw_on_error: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_content: String::new(),
            chunk_capacity: DEFAULT_CHUNK_CAPACITY,
            single_buffer: false,
            throw_on_error: false,
        }
    }
}

struct EngineInner {
    pool: BufferPool,
    index: PieceIndex,
    journal: Journal,
    content_listener: Option<Box<dyn ContentListener>>,
    journal_listener: Option<Box<dyn JournalListener>>,
}

impl EngineInner {
    fn clear(&mut self) {
        self.pool.clear();
        self.index = PieceIndex::new();
        self.journal.clear();
    }

    /// Append `text` to the tail of the document, spilling into freshly
    /// allocated chunks once the current tail chunk is full.
    fn append_raw(&mut self, text: &str) {
        let chars: Vec<char> = text.chars().collect();
        let mut idx = 0;
        while idx < chars.len() {
            let chunk_id = self.pool.tail_id();
            let free = self.pool.get(chunk_id).expect("tail chunk exists").free_space();
            if free == 0 {
                self.pool.allocate();
                continue;
            }
            let take = free.min(chars.len() - idx);
            let slice: String = chars[idx..idx + take].iter().collect();
            let start_in_chunk = self.pool.get(chunk_id).expect("tail chunk exists").len();
            let newlines = slice.chars().filter(|&c| c == NEWLINE).count();
            self.pool
                .get_mut(chunk_id)
                .expect("tail chunk exists")
                .append(&slice);
            self.index
                .push_back(Piece::new(chunk_id, start_in_chunk, take, newlines));
            idx += take;
        }
    }

    /// Append `text` as new chunk(s), each linked in as a fresh piece right
    /// after `after_id`.
    fn insert_overflow_after(&mut self, mut after_id: NodeId, text: &str) -> Result<()> {
        let chars: Vec<char> = text.chars().collect();
        let mut idx = 0;
        while idx < chars.len() {
            let chunk_id = self.pool.allocate();
            let capacity = self.pool.get(chunk_id)?.capacity();
            let take = capacity.min(chars.len() - idx);
            let slice: String = chars[idx..idx + take].iter().collect();
            let newlines = slice.chars().filter(|&c| c == NEWLINE).count();
            self.pool.get_mut(chunk_id)?.append(&slice);
            after_id = self
                .index
                .insert_after(after_id, Piece::new(chunk_id, 0, take, newlines));
            idx += take;
        }
        Ok(())
    }

    /// After a chunk-local insert/delete shifts every character at or past
    /// `threshold`, every *other* piece referencing the same chunk at or
    /// past that point needs its `start` adjusted by `delta` to keep
    /// pointing at the same logical characters.
    fn shift_siblings(&mut self, chunk_id: ChunkId, threshold: usize, delta: isize, exclude: NodeId) {
        if delta == 0 {
            return;
        }
        for id in self.index.ids_in_order() {
            if id == exclude {
                continue;
            }
            let (buffer_id, start) = {
                let p = self.index.piece(id);
                (p.buffer_id, p.start)
            };
            if buffer_id == chunk_id && start >= threshold {
                self.index.piece_mut(id).start = (start as isize + delta) as usize;
            }
        }
    }

    fn insert_raw(&mut self, offset: usize, text: &str) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        let total = self.index.total_len();
        if offset > total {
            return Err(EngineError::out_of_range(format!(
                "insert offset {} exceeds document length {}",
                offset, total
            )));
        }
        if offset == total {
            self.append_raw(text);
            return Ok(());
        }

        let (piece_id, r) = self.index.locate(offset)?;
        let original = *self.index.piece(piece_id);
        if r > 0 && r < original.length {
            let left_newlines = {
                let chunk = self.pool.get(original.buffer_id)?;
                newlines_in_range(chunk, original.start, original.start + r)
            };
            self.index.split(piece_id, r, left_newlines)?;
        }

        let chunk_id = original.buffer_id;
        let insert_pos = original.start + r;
        let free = self.pool.get(chunk_id)?.free_space();
        let chars: Vec<char> = text.chars().collect();
        let take = free.min(chars.len());

        if take > 0 {
            let slice: String = chars[..take].iter().collect();
            self.pool.get_mut(chunk_id)?.insert(insert_pos, &slice)?;
            self.shift_siblings(chunk_id, insert_pos, take as isize, piece_id);
            let added_newlines = slice.chars().filter(|&c| c == NEWLINE).count();
            self.index.update_piece(piece_id, |p| {
                p.length += take;
                p.newlines += added_newlines;
            });
        }

        if take < chars.len() {
            let rest: String = chars[take..].iter().collect();
            self.insert_overflow_after(piece_id, &rest)?;
        }
        Ok(())
    }

    fn delete_raw(&mut self, start: usize, end: usize) -> Result<String> {
        if start > end {
            return Err(EngineError::out_of_range(format!(
                "delete range starts ({}) after it ends ({})",
                start, end
            )));
        }
        if start == end {
            return Ok(String::new());
        }
        if self.index.is_empty() {
            return Err(EngineError::empty_document(
                "cannot delete from an empty document",
            ));
        }
        let total = self.index.total_len();
        if end > total {
            return Err(EngineError::out_of_range(format!(
                "delete range end {} exceeds document length {}",
                end, total
            )));
        }

        let mut captured = String::new();
        let mut to_remove = end - start;
        while to_remove > 0 {
            let (piece_id, local_off) = self.index.locate(start)?;
            let piece = *self.index.piece(piece_id);
            let overlap = (piece.length - local_off).min(to_remove);
            let chunk_id = piece.buffer_id;
            let del_pos = piece.start + local_off;

            let fragment = {
                let chunk = self.pool.get(chunk_id)?;
                chunk.sub(del_pos, del_pos + overlap)?
            };
            let removed_newlines = fragment.chars().filter(|&c| c == NEWLINE).count();

            self.pool.get_mut(chunk_id)?.delete(del_pos, overlap)?;
            self.shift_siblings(chunk_id, del_pos + overlap, -(overlap as isize), piece_id);

            if overlap == piece.length {
                self.index.delete(piece_id);
            } else {
                self.index.update_piece(piece_id, |p| {
                    p.length -= overlap;
                    p.newlines -= removed_newlines;
                });
            }
            self.pool.release_if_empty(chunk_id)?;

            captured.push_str(&fragment);
            to_remove -= overlap;
        }
        Ok(captured)
    }

    fn text(&self) -> String {
        let mut out = String::new();
        for id in self.index.ids_in_order() {
            let piece = self.index.piece(id);
            if let Ok(chunk) = self.pool.get(piece.buffer_id) {
                if let Ok(sub) = chunk.sub(piece.start, piece.end()) {
                    out.push_str(&sub);
                }
            }
        }
        out
    }

    fn text_range(&self, start: usize, end: usize) -> Result<String> {
        let total = self.index.total_len();
        if start > end || end > total {
            return Err(EngineError::out_of_range(format!(
                "range [{}, {}) out of bounds for document length {}",
                start, end, total
            )));
        }
        let mut out = String::new();
        let mut offset = 0;
        for id in self.index.ids_in_order() {
            let piece = *self.index.piece(id);
            let piece_end = offset + piece.length;
            if piece_end > start && offset < end {
                let clip_start = start.max(offset) - offset;
                let clip_end = end.min(piece_end) - offset;
                let chunk = self.pool.get(piece.buffer_id)?;
                out.push_str(&chunk.sub(piece.start + clip_start, piece.start + clip_end)?);
            }
            offset = piece_end;
            if offset >= end {
                break;
            }
        }
        Ok(out)
    }

    /// Document offsets of every newline, in document order.
    fn newline_positions(&self) -> Result<Vec<usize>> {
        let mut out = Vec::new();
        let mut offset = 0;
        for id in self.index.ids_in_order() {
            let piece = *self.index.piece(id);
            let chunk = self.pool.get(piece.buffer_id)?;
            for &nl in chunk.line_starts() {
                if nl >= piece.start && nl < piece.end() {
                    out.push(offset + (nl - piece.start));
                }
            }
            offset += piece.length;
        }
        Ok(out)
    }

    fn line_of_offset(&self, offset: usize) -> Result<usize> {
        let total = self.index.total_len();
        if offset > total {
            return Err(EngineError::out_of_range(format!(
                "offset {} exceeds document length {}",
                offset, total
            )));
        }
        let newlines = self.newline_positions()?;
        Ok(newlines.iter().filter(|&&pos| pos < offset).count())
    }

    fn line_range(&self, i: usize) -> Result<(usize, usize)> {
        let newlines = self.newline_positions()?;
        if i > newlines.len() {
            return Err(EngineError::out_of_range(format!(
                "line index {} out of range ({} lines)",
                i,
                newlines.len() + 1
            )));
        }
        let start = if i == 0 { 0 } else { newlines[i - 1] + 1 };
        let end = if i < newlines.len() {
            newlines[i]
        } else {
            self.index.total_len()
        };
        Ok((start, end))
    }

    fn line_length(&self, i: usize) -> Result<usize> {
        let (start, end) = self.line_range(i)?;
        Ok(end - start)
    }

    fn line_content(&self, i: usize) -> Result<String> {
        let (start, end) = self.line_range(i)?;
        self.text_range(start, end)
    }

    /// Slices for `search` to scan, one per contiguous run of document-order
    /// pieces that reference the same chunk back-to-back. A split with no
    /// intervening chunk (an ordinary in-place edit) leaves two adjacent
    /// pieces pointing at the same buffer; merging their runs here keeps a
    /// match that straddles the old piece boundary, but lies entirely
    /// inside one physical chunk, from being missed.
    fn chunk_slices(&self) -> Result<Vec<(usize, Vec<char>)>> {
        let mut out = Vec::new();
        // (chunk id, document offset of the run's start, buffer-local [start, end))
        let mut run: Option<(ChunkId, usize, usize, usize)> = None;
        let mut offset = 0;

        for id in self.index.ids_in_order() {
            let piece = *self.index.piece(id);
            match &mut run {
                Some((buffer_id, _, _, buf_end)) if *buffer_id == piece.buffer_id && *buf_end == piece.start => {
                    *buf_end = piece.end();
                }
                _ => {
                    if let Some((buffer_id, doc_base, buf_start, buf_end)) = run.take() {
                        let chunk = self.pool.get(buffer_id)?;
                        out.push((doc_base, chunk.chars()[buf_start..buf_end].to_vec()));
                    }
                    run = Some((piece.buffer_id, offset, piece.start, piece.end()));
                }
            }
            offset += piece.length;
        }
        if let Some((buffer_id, doc_base, buf_start, buf_end)) = run {
            let chunk = self.pool.get(buffer_id)?;
            out.push((doc_base, chunk.chars()[buf_start..buf_end].to_vec()));
        }
        Ok(out)
    }

    fn apply_plan(&mut self, plan: &Plan) -> Result<()> {
        for step in &plan.steps {
            match step {
                Step::Insert { start, text } => {
                    self.insert_raw(*start, text)?;
                    self.notify_inserted(*start, text);
                }
                Step::Delete { start, end } => {
                    self.delete_raw(*start, *end)?;
                    self.notify_deleted(*start, *end);
                }
            }
        }
        Ok(())
    }

    fn notify_loaded(&mut self) {
        if let Some(l) = self.content_listener.as_mut() {
            l.on_content_loaded();
        }
    }

    fn notify_inserted(&mut self, start: usize, text: &str) {
        if let Some(l) = self.content_listener.as_mut() {
            l.on_text_inserted(start, text);
        }
    }

    fn notify_deleted(&mut self, start: usize, end: usize) {
        if let Some(l) = self.content_listener.as_mut() {
            l.on_text_deleted(start, end);
        }
    }

    fn notify_change(&mut self, start: usize, end: usize, timestamp: u64) {
        if let Some(l) = self.journal_listener.as_mut() {
            l.on_change(start, end, timestamp);
        }
    }

    fn notify_stack_change(&mut self) {
        let n = self.journal.group_count();
        if let Some(l) = self.journal_listener.as_mut() {
            l.on_stack_change(n);
        }
    }

    fn notify_undo(&mut self) {
        if let Some(l) = self.journal_listener.as_mut() {
            l.on_undo();
        }
    }

    fn notify_redo(&mut self) {
        if let Some(l) = self.journal_listener.as_mut() {
            l.on_redo();
        }
    }
}

fn degrade<T: Default>(throw_on_error: bool, result: Result<T>) -> Result<T> {
    match result {
        Ok(v) => Ok(v),
        Err(e) if throw_on_error => Err(e),
        Err(e) => {
            e.log();
            Ok(T::default())
        }
    }
}

/// Top-level engine: a buffer pool, a piece index, and an undo journal
/// behind one guarded boundary. Single-threaded embedding (see the
/// concurrency model) — the guard is a `RefCell`, whose runtime borrow
/// check doubles as the recursion guard against a listener calling back
/// into the engine from its own callback.
pub struct EditEngine {
    inner: RefCell<EngineInner>,
    throw_on_error: bool,
}

impl EditEngine {
    pub fn new(config: EngineConfig) -> Self {
        let pool = BufferPool::new(config.chunk_capacity, config.single_buffer);
        let mut inner = EngineInner {
            pool,
            index: PieceIndex::new(),
            journal: Journal::new(),
            content_listener: None,
            journal_listener: None,
        };
        if !config.initial_content.is_empty() {
            inner.append_raw(&config.initial_content);
        }
        Self {
            inner: RefCell::new(inner),
            throw_on_error: config.throw_on_error,
        }
    }

    /// Lift unlimited undo history after construction.
    pub fn with_unlimited_history(self) -> Self {
        self.inner.borrow_mut().journal.set_unlimited(true);
        self
    }

    pub fn set_content_listener(&self, listener: Box<dyn ContentListener>) {
        self.inner.borrow_mut().content_listener = Some(listener);
    }

    pub fn set_journal_listener(&self, listener: Box<dyn JournalListener>) {
        self.inner.borrow_mut().journal_listener = Some(listener);
    }

    pub fn can_undo(&self) -> bool {
        self.inner.borrow().journal.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.inner.borrow().journal.can_redo()
    }

    pub fn group_count(&self) -> usize {
        self.inner.borrow().journal.group_count()
    }

    fn with_inner<T, F>(&self, f: F) -> Result<T>
    where
        T: Default,
        F: FnOnce(&mut EngineInner) -> Result<T>,
    {
        let result = match self.inner.try_borrow_mut() {
            Ok(mut guard) => f(&mut guard),
            Err(_) => Err(EngineError::internal(
                "re-entrant call into the engine from a listener callback",
            )),
        };
        degrade(self.throw_on_error, result)
    }

    pub fn load(&self, text: &str) -> Result<()> {
        self.with_inner(|inner| {
            inner.clear();
            inner.append_raw(text);
            inner.notify_loaded();
            Ok(())
        })
    }

    pub fn append(&self, text: &str, capture: bool) -> Result<()> {
        self.with_inner(|inner| {
            let start = inner.index.total_len();
            inner.append_raw(text);
            if !text.is_empty() {
                if capture {
                    let now = now_ns();
                    let end = start + text.chars().count();
                    inner
                        .journal
                        .capture(ActionKind::Insert, start, end, text.to_string(), now);
                    inner.notify_change(start, end, now);
                    inner.notify_stack_change();
                }
                inner.notify_inserted(start, text);
            }
            Ok(())
        })
    }

    pub fn insert(&self, offset: usize, text: &str, capture: bool) -> Result<()> {
        self.with_inner(|inner| {
            inner.insert_raw(offset, text)?;
            if !text.is_empty() {
                if capture {
                    let now = now_ns();
                    let end = offset + text.chars().count();
                    inner
                        .journal
                        .capture(ActionKind::Insert, offset, end, text.to_string(), now);
                    inner.notify_change(offset, end, now);
                    inner.notify_stack_change();
                }
                inner.notify_inserted(offset, text);
            }
            Ok(())
        })
    }

    pub fn delete(&self, start: usize, end: usize, capture: bool) -> Result<()> {
        self.with_inner(|inner| {
            let removed = inner.delete_raw(start, end)?;
            if !removed.is_empty() {
                if capture {
                    let now = now_ns();
                    inner
                        .journal
                        .capture(ActionKind::Delete, start, end, removed, now);
                    inner.notify_change(start, end, now);
                    inner.notify_stack_change();
                }
                inner.notify_deleted(start, end);
            }
            Ok(())
        })
    }

    /// Delete `[start, end)` then insert `text` at `start`, as one atomic
    /// undo/redo group when `capture` is set.
    pub fn replace(&self, start: usize, end: usize, text: &str, capture: bool) -> Result<()> {
        self.with_inner(|inner| {
            if capture {
                inner.journal.begin_batch();
            }
            let outcome = (|| -> Result<()> {
                let removed = inner.delete_raw(start, end)?;
                if !removed.is_empty() {
                    if capture {
                        let now = now_ns();
                        inner
                            .journal
                            .capture(ActionKind::Delete, start, end, removed, now);
                        inner.notify_change(start, end, now);
                    }
                    inner.notify_deleted(start, end);
                }
                inner.insert_raw(start, text)?;
                if !text.is_empty() {
                    if capture {
                        let now = now_ns();
                        let insert_end = start + text.chars().count();
                        inner.journal.capture(
                            ActionKind::Insert,
                            start,
                            insert_end,
                            text.to_string(),
                            now,
                        );
                        inner.notify_change(start, insert_end, now);
                    }
                    inner.notify_inserted(start, text);
                }
                Ok(())
            })();
            if capture {
                inner.journal.end_batch();
                inner.notify_stack_change();
            }
            outcome
        })
    }

    pub fn text(&self) -> Result<String> {
        self.with_inner(|inner| Ok(inner.text()))
    }

    pub fn text_range(&self, start: usize, end: usize) -> Result<String> {
        self.with_inner(|inner| inner.text_range(start, end))
    }

    pub fn length(&self) -> Result<usize> {
        self.with_inner(|inner| Ok(inner.index.total_len()))
    }

    pub fn line_count(&self) -> Result<usize> {
        self.with_inner(|inner| Ok(inner.index.total_newlines()))
    }

    pub fn line_of_offset(&self, offset: usize) -> Result<usize> {
        self.with_inner(|inner| inner.line_of_offset(offset))
    }

    pub fn line_content(&self, i: usize) -> Result<String> {
        self.with_inner(|inner| inner.line_content(i))
    }

    pub fn line_range(&self, i: usize) -> Result<(usize, usize)> {
        self.with_inner(|inner| inner.line_range(i))
    }

    pub fn line_length(&self, i: usize) -> Result<usize> {
        self.with_inner(|inner| inner.line_length(i))
    }

    pub fn search_multi(
        &self,
        pattern: &str,
        start_offset: usize,
        case_sensitive: bool,
        is_regex: bool,
    ) -> Result<Vec<Match>> {
        self.with_inner(|inner| {
            let slices = inner.chunk_slices()?;
            let iter = slices
                .iter()
                .map(|(base, chars)| search::ChunkSlice { base: *base, chars });
            Ok(search::search_multi(iter, pattern, start_offset, case_sensitive, is_regex))
        })
    }

    pub fn search_single(
        &self,
        pattern: &str,
        start_offset: usize,
        case_sensitive: bool,
        is_regex: bool,
    ) -> Result<Option<Match>> {
        self.with_inner(|inner| {
            let slices = inner.chunk_slices()?;
            let iter = slices
                .iter()
                .map(|(base, chars)| search::ChunkSlice { base: *base, chars });
            Ok(search::search_single(iter, pattern, start_offset, case_sensitive, is_regex))
        })
    }

    pub fn undo(&self) -> Result<bool> {
        self.with_inner(|inner| match inner.journal.undo() {
            None => Ok(false),
            Some(plan) => {
                inner.apply_plan(&plan)?;
                inner.notify_undo();
                inner.notify_stack_change();
                Ok(true)
            }
        })
    }

    pub fn redo(&self) -> Result<bool> {
        self.with_inner(|inner| match inner.journal.redo() {
            None => Ok(false),
            Some(plan) => {
                inner.apply_plan(&plan)?;
                inner.notify_redo();
                inner.notify_stack_change();
                Ok(true)
            }
        })
    }
}

impl Default for EditEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
