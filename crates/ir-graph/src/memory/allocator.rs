use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{GraphError, Result};
use crate::memory::blob::Blob;

/// Two-phase offset planner.
///
/// During planning `alloc`/`free` hand out byte offsets into a buffer that
/// does not exist yet. `finalize` then performs the one real allocation,
/// sized to the arena top, and freezes the planner.
///
/// `used` counts live bytes while `end` marks the arena top; a request that
/// fits no free block is placed at `end`, so live ranges never overlap.
#[derive(Debug)]
pub struct Allocator {
    /// Bytes currently handed out.
    used: usize,
    /// Highest value `used` has reached.
    peak: usize,
    /// One past the highest offset ever handed out.
    end: usize,
    alignment: usize,
    /// Free block start offset -> block size.
    free_blocks: BTreeMap<usize, usize>,
    blob: Option<Arc<Blob>>,
}

impl Allocator {
    /// Create a planner whose blocks are rounded up to `alignment` bytes.
    pub fn new(alignment: usize) -> Result<Self> {
        if !alignment.is_power_of_two() {
            return Err(GraphError::Other(format!(
                "allocator alignment {} is not a power of two",
                alignment
            )));
        }
        Ok(Allocator {
            used: 0,
            peak: 0,
            end: 0,
            alignment,
            free_blocks: BTreeMap::new(),
            blob: None,
        })
    }

    pub fn aligned_size(&self, size: usize) -> usize {
        size.div_ceil(self.alignment) * self.alignment
    }

    /// Reserve `size` bytes and return their offset.
    ///
    /// First fit over the free list in offset order; the unused suffix of a
    /// larger block stays free. Otherwise the request goes to the arena top,
    /// absorbing a free block that already ends there.
    pub fn alloc(&mut self, size: usize) -> Result<usize> {
        self.ensure_planning()?;
        let size = self.aligned_size(size);
        if size == 0 {
            return Ok(self.end);
        }

        let fit = self
            .free_blocks
            .iter()
            .find(|&(_, &block)| block >= size)
            .map(|(&offset, &block)| (offset, block));

        let offset = match fit {
            Some((offset, block)) => {
                self.free_blocks.remove(&offset);
                if block > size {
                    self.free_blocks.insert(offset + size, block - size);
                }
                offset
            }
            None => match self.free_blocks.last_key_value() {
                Some((&offset, &block)) if offset + block == self.end => {
                    self.free_blocks.remove(&offset);
                    self.end = offset + size;
                    offset
                }
                _ => {
                    let offset = self.end;
                    self.end += size;
                    offset
                }
            },
        };

        self.used += size;
        self.peak = self.peak.max(self.used);
        log::trace!("alloc {} bytes at offset {}", size, offset);
        Ok(offset)
    }

    /// Return `size` bytes at `offset` to the free list, merging with the
    /// free neighbours on either side.
    ///
    /// The range must lie below the arena top and must not intersect a
    /// block that is already free.
    pub fn free(&mut self, offset: usize, size: usize) -> Result<()> {
        self.ensure_planning()?;
        let size = self.aligned_size(size);
        if size == 0 {
            return Ok(());
        }
        let invalid = GraphError::InvalidFree {
            offset,
            size,
            used: self.used,
        };
        let Some(limit) = offset.checked_add(size).filter(|&limit| limit <= self.end) else {
            return Err(invalid);
        };
        // Only the last block starting below `limit` can reach into the range.
        if let Some((&start, &len)) = self.free_blocks.range(..limit).next_back() {
            if start + len > offset {
                return Err(invalid);
            }
        }
        self.used = self.used.checked_sub(size).ok_or(invalid)?;

        let mut start = offset;
        let mut len = size;

        if let Some(next) = self.free_blocks.remove(&(offset + size)) {
            len += next;
        }
        if let Some((&prev, &prev_len)) = self.free_blocks.range(..offset).next_back() {
            if prev + prev_len == offset {
                start = prev;
                len += prev_len;
            }
        }
        self.free_blocks.insert(start, len);
        log::trace!("free {} bytes at offset {}", size, offset);
        Ok(())
    }

    /// Perform the real allocation on first call and return the backing
    /// buffer. Later calls return the same buffer.
    pub fn finalize(&mut self) -> Arc<Blob> {
        if let Some(blob) = &self.blob {
            return Arc::clone(blob);
        }
        let blob = Arc::new(Blob::new(self.end));
        log::info!(
            "allocator really alloc: {:#x} {} bytes",
            blob.base_addr(),
            self.end
        );
        self.blob = Some(Arc::clone(&blob));
        blob
    }

    pub fn is_finalized(&self) -> bool {
        self.blob.is_some()
    }

    pub fn used(&self) -> usize {
        self.used
    }

    pub fn peak(&self) -> usize {
        self.peak
    }

    /// Size of the buffer `finalize` allocates.
    pub fn arena_size(&self) -> usize {
        self.end
    }

    pub fn alignment(&self) -> usize {
        self.alignment
    }

    /// Free blocks as `(offset, size)` in offset order.
    pub fn free_blocks(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.free_blocks.iter().map(|(&o, &s)| (o, s))
    }

    pub fn info(&self) {
        log::info!(
            "used memory: {}, peak memory: {}, arena: {}",
            self.used,
            self.peak,
            self.end
        );
    }

    fn ensure_planning(&self) -> Result<()> {
        if self.blob.is_some() {
            return Err(GraphError::AllocatorFinalized);
        }
        Ok(())
    }
}

impl Default for Allocator {
    fn default() -> Self {
        Allocator {
            used: 0,
            peak: 0,
            end: 0,
            alignment: std::mem::size_of::<u64>(),
            free_blocks: BTreeMap::new(),
            blob: None,
        }
    }
}
