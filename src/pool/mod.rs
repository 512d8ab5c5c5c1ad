//! Buffer pool: an ordered, index-addressable collection of chunk buffers.
//!
//! Chunk ids are handed out monotonically and never reused for the
//! lifetime of the pool, so a retained id always refers to the chunk it
//! was issued for (or to nothing, once released).

use crate::chunk::Chunk;
use crate::error::{EngineError, Result};
use std::collections::HashMap;

pub const MIN_CHUNK_CAPACITY: usize = 32 * 1024;
pub const MAX_CHUNK_CAPACITY: usize = 32 * 1024 * 1024;
pub const DEFAULT_CHUNK_CAPACITY: usize = 64 * 1024;
pub const SINGLE_BUFFER_CAPACITY: usize = MAX_CHUNK_CAPACITY;

pub type ChunkId = u64;

/// Clamp a requested chunk capacity into `[32 KiB, 32 MiB]`, logging when
/// the caller's request was out of range.
pub fn clamp_capacity(requested: usize) -> usize {
    let clamped = requested.clamp(MIN_CHUNK_CAPACITY, MAX_CHUNK_CAPACITY);
    if clamped != requested {
        log::warn!(
            "chunk_capacity {} clamped to {} (valid range [{}, {}])",
            requested,
            clamped,
            MIN_CHUNK_CAPACITY,
            MAX_CHUNK_CAPACITY
        );
    }
    clamped
}

/// Ordered collection of chunk buffers, addressed by a monotonically
/// increasing id.
pub struct BufferPool {
    chunks: HashMap<ChunkId, Chunk>,
    order: Vec<ChunkId>,
    next_id: ChunkId,
    capacity: usize,
    single_buffer: bool,
}

impl BufferPool {
    pub fn new(capacity: usize, single_buffer: bool) -> Self {
        let capacity = if single_buffer {
            SINGLE_BUFFER_CAPACITY
        } else {
            clamp_capacity(capacity)
        };
        Self {
            chunks: HashMap::new(),
            order: Vec::new(),
            next_id: 0,
            capacity,
            single_buffer,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn single_buffer(&self) -> bool {
        self.single_buffer
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Allocate a fresh chunk and return its id. The chunk is appended at
    /// the end of pool order.
    pub fn allocate(&mut self) -> ChunkId {
        let id = self.next_id;
        self.next_id += 1;
        self.chunks.insert(id, Chunk::with_capacity(self.capacity));
        self.order.push(id);
        id
    }

    pub fn get(&self, id: ChunkId) -> Result<&Chunk> {
        self.chunks
            .get(&id)
            .ok_or_else(|| EngineError::internal(format!("no chunk with id {}", id)))
    }

    pub fn get_mut(&mut self, id: ChunkId) -> Result<&mut Chunk> {
        self.chunks
            .get_mut(&id)
            .ok_or_else(|| EngineError::internal(format!("no chunk with id {}", id)))
    }

    /// The id of the tail chunk, allocating one if the pool is empty.
    pub fn tail_id(&mut self) -> ChunkId {
        if let Some(&id) = self.order.last() {
            id
        } else {
            self.allocate()
        }
    }

    /// Remove a chunk if it has become empty. No-op otherwise.
    pub fn release_if_empty(&mut self, id: ChunkId) -> Result<()> {
        let empty = self.get(id)?.is_empty();
        if empty {
            self.chunks.remove(&id);
            self.order.retain(|&cid| cid != id);
        }
        Ok(())
    }

    /// Chunk ids in pool order (document order).
    pub fn order(&self) -> &[ChunkId] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = (ChunkId, &Chunk)> {
        self.order.iter().map(move |id| (*id, &self.chunks[id]))
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
        self.order.clear();
        self.next_id = 0;
    }
}
